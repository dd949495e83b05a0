use std::default::Default;

/// Contains Config properties which will be used by the Server
#[derive(Clone)]
pub struct ServerConfig {
    /// Most commands accepted from one connection in a single tick. Anything
    /// past the cap is dropped, so a flooding client cannot buy itself extra
    /// simulation time. 0 disables the cap.
    pub command_rate_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command_rate_limit: 16,
        }
    }
}
