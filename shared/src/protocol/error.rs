use thiserror::Error;

use crate::component::registry::RegistryError;

/// Errors from assembling a [`Protocol`](super::Protocol) through the
/// non-panicking builder methods.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The protocol was already locked and can no longer change
    #[error("protocol is locked")]
    AlreadyLocked,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
