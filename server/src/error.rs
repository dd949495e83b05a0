use thiserror::Error;

use statecast_shared::{SendError, StoreError};

use crate::user::UserKey;

/// Errors surfaced by fallible server calls. Per-item failures inside a tick
/// (bad packet bytes, a command for a missing entity) are logged and skipped
/// instead of surfacing here.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no connected user {0:?}")]
    UnknownUser(UserKey),

    #[error("user {0:?} has no controlled entity")]
    NoControlledEntity(UserKey),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Send(#[from] SendError),
}
