use crate::types::HostType;

/// Which host is allowed to send state for a component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplicationDirection {
    ServerToClient,
    ClientToServer,
    Bidirectional,
}

impl ReplicationDirection {
    pub fn sendable_by(&self, host: HostType) -> bool {
        match self {
            ReplicationDirection::ServerToClient => host == HostType::Server,
            ReplicationDirection::ClientToServer => host == HostType::Client,
            ReplicationDirection::Bidirectional => true,
        }
    }
}

/// Per-component-type replication behavior. Plain data, fixed at registration
/// time, consulted at every serialization decision point.
#[derive(Clone, Copy, Debug)]
pub struct ReplicationPolicy {
    /// Include this component in the full set sent when an entity becomes
    /// visible to a connection.
    pub send_on_create: bool,
    /// Send this component when it is marked dirty. Components with this off
    /// never appear in delta updates, no matter how often they change.
    pub send_on_update: bool,
    pub direction: ReplicationDirection,
    /// Updates per second cap, per component instance. 0 disables throttling.
    pub max_updates_per_second: u32,
    /// Carry updates of this component on the reliable channel
    pub reliable: bool,
}

impl Default for ReplicationPolicy {
    fn default() -> Self {
        Self {
            send_on_create: true,
            send_on_update: true,
            direction: ReplicationDirection::ServerToClient,
            max_updates_per_second: 0,
            reliable: false,
        }
    }
}
