use std::collections::HashMap;

use thiserror::Error;

use crate::component::{
    kinds::{ComponentKind, ComponentTypeId},
    policy::ReplicationPolicy,
    replicate::Replicate,
};

/// Errors that can occur during component registration or lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same component type was registered twice
    #[error("component type {name} is already registered")]
    DuplicateComponent { name: &'static str },

    /// A wire tag arrived that no registered component matches
    #[error("unknown component type id {0}")]
    UnknownTypeId(u16),

    /// A component instance was used with a registry it was never added to
    #[error("component type {name} has not been registered")]
    UnregisteredKind { name: &'static str },
}

type ComponentFactory = Box<dyn Fn() -> Box<dyn Replicate> + Send + Sync>;

struct ComponentRecord {
    name: &'static str,
    policy: ReplicationPolicy,
    factory: ComponentFactory,
}

/// Maps component types to wire tags, replication policies, and factories.
/// Built once at startup by explicit `register` calls, in the same order on
/// server and client, and never mutated afterwards.
pub struct ComponentRegistry {
    records: Vec<ComponentRecord>,
    kind_to_type_id: HashMap<ComponentKind, ComponentTypeId>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            kind_to_type_id: HashMap::new(),
        }
    }

    /// Registers a component type with its replication policy, assigning the
    /// next wire tag.
    pub fn register<C: Replicate + Default>(
        &mut self,
        policy: ReplicationPolicy,
    ) -> Result<ComponentTypeId, RegistryError> {
        let probe = C::default();
        let kind = ComponentKind::of::<C>();
        if self.kind_to_type_id.contains_key(&kind) {
            return Err(RegistryError::DuplicateComponent { name: probe.name() });
        }

        let type_id = ComponentTypeId::new(self.records.len() as u16);
        self.records.push(ComponentRecord {
            name: probe.name(),
            policy,
            factory: Box::new(|| Box::new(C::default())),
        });
        self.kind_to_type_id.insert(kind, type_id);
        Ok(type_id)
    }

    pub fn type_id_of(&self, kind: &ComponentKind) -> Option<ComponentTypeId> {
        self.kind_to_type_id.get(kind).copied()
    }

    pub fn policy(&self, type_id: ComponentTypeId) -> Result<&ReplicationPolicy, RegistryError> {
        Ok(&self.record(type_id)?.policy)
    }

    pub fn name_of(&self, type_id: ComponentTypeId) -> Result<&'static str, RegistryError> {
        Ok(self.record(type_id)?.name)
    }

    /// Builds a default-valued instance for an incoming wire tag
    pub fn create(&self, type_id: ComponentTypeId) -> Result<Box<dyn Replicate>, RegistryError> {
        Ok((self.record(type_id)?.factory)())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&self, type_id: ComponentTypeId) -> Result<&ComponentRecord, RegistryError> {
        self.records
            .get(type_id.to_u16() as usize)
            .ok_or(RegistryError::UnknownTypeId(type_id.to_u16()))
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
