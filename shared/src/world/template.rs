use thiserror::Error;

use crate::{
    component::{registry::ComponentRegistry, replicate::Replicate},
    types::Tick,
};

/// Errors that can occur while instantiating an entity template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("no template named '{0}'")]
    UnknownTemplate(String),

    #[error("template '{template}' failed to build: {reason}")]
    InvalidTemplate { template: String, reason: String },
}

/// Source of entity blueprints, provided by the application's asset layer.
/// The sync layer never parses asset data itself; it asks this trait for a
/// ready-made component set.
pub trait TemplateSource {
    fn instantiate(
        &self,
        template: &str,
        registry: &ComponentRegistry,
    ) -> Result<Vec<Box<dyn Replicate>>, TemplateError>;
}

/// A `TemplateSource` with no templates, for hosts that never instantiate
/// from assets.
pub struct NoTemplates;

impl TemplateSource for NoTemplates {
    fn instantiate(
        &self,
        template: &str,
        _registry: &ComponentRegistry,
    ) -> Result<Vec<Box<dyn Replicate>>, TemplateError> {
        Err(TemplateError::UnknownTemplate(template.to_string()))
    }
}

/// Everything simulation code may consult during one call, passed explicitly
/// down the stack instead of living in globals.
pub struct SimContext<'c> {
    /// Current simulation tick on the server; the client passes the newest
    /// server tick it has seen.
    pub tick: Tick,
    pub templates: &'c dyn TemplateSource,
}
