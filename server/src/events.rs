use statecast_shared::EntityId;

use crate::user::UserKey;

/// Things that happened inside the server since the application last drained
/// them. Pushed during `tick()` and connection calls, taken with
/// [`Server::take_events`](crate::Server::take_events).
#[derive(Debug, PartialEq, Eq)]
pub enum ServerEvent {
    /// A transport connection was registered with the server
    ConnectedUser(UserKey),
    /// A connection was removed; its per-connection state is gone
    DisconnectedUser(UserKey),
    /// The client confirmed a predicted-spawn binding, so the server dropped
    /// its outstanding acknowledgement entry
    SpawnConfirmed { user: UserKey, entity: EntityId },
}
