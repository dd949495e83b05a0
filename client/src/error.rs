use thiserror::Error;

use statecast_shared::{EntityMapError, SendError, StoreError};

/// Errors surfaced by fallible client calls. Per-item failures while
/// draining snapshots (bad component bytes, unknown ids) are logged and
/// skipped instead of surfacing here.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Map(#[from] EntityMapError),

    #[error(transparent)]
    Send(#[from] SendError),
}
