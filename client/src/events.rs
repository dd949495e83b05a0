use statecast_shared::EntityId;

/// Things that happened inside the client since the application last drained
/// them, taken with [`Client::take_events`](crate::Client::take_events).
#[derive(Debug, PartialEq, Eq)]
pub enum ClientEvent {
    /// A replicated entity appeared in this client's interest set; a local
    /// mirror was created for it
    SpawnedEntity { server: EntityId, local: EntityId },
    /// A replicated entity left the interest set and its mirror was removed
    DespawnedEntity { server: EntityId, local: EntityId },
    /// The server matched a predicted spawn by content hash; the local
    /// entity is now bound to its authoritative id
    SpawnAcknowledged { server: EntityId, local: EntityId },
    /// A predicted spawn went unacknowledged past the configured timeout and
    /// was rolled back
    SpawnExpired { local: EntityId },
    /// The transport reported the connection gone
    Disconnected,
}
