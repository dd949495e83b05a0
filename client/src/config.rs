use std::default::Default;
use std::time::Duration;

/// Contains Config properties which will be used by the Client
#[derive(Clone)]
pub struct ClientConfig {
    /// How long a remote entity takes to glide from one authoritative sample
    /// to the next. `None` derives `2 × tick_interval` from the protocol,
    /// which rides out one dropped snapshot without a visible hitch.
    pub interpolation_window: Option<Duration>,
    /// How long a predicted spawn may wait for the server's acknowledgement
    /// before the local entity is rolled back.
    pub predicted_spawn_timeout: Duration,
    /// Most unacknowledged commands kept for replay. When the server falls
    /// further behind than this, the oldest commands are dropped.
    pub command_history_limit: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            interpolation_window: None,
            predicted_spawn_timeout: Duration::from_secs(3),
            command_history_limit: 128,
        }
    }
}
