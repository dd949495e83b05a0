use std::time::Duration;

use log::warn;

use crate::component::policy::ReplicationPolicy;
use crate::component::registry::ComponentRegistry;
use crate::component::replicate::Replicate;

pub mod error;
pub use error::ProtocolError;

/// Smallest usable update packet budget. Anything lower cannot fit the
/// packet header plus a single small component.
pub const MIN_PACKET_BYTES: usize = 64;

/// Everything both hosts must agree on before exchanging packets:
/// the component registry (whose registration order defines wire tags),
/// the tick cadence, and the per-packet byte budget.
///
/// Server and client must build identical protocols; the usual pattern is
/// a shared function that both call.
pub struct Protocol {
    pub components: ComponentRegistry,
    /// The duration between each tick
    pub tick_interval: Duration,
    /// Upper bound on the encoded size of one update packet
    pub max_packet_bytes: usize,
    locked: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            components: ComponentRegistry::default(),
            tick_interval: Duration::from_millis(50),
            max_packet_bytes: 1200,
            locked: false,
        }
    }
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn tick_interval(&mut self, duration: Duration) -> &mut Self {
        self.check_lock();
        self.tick_interval = duration;
        self
    }

    pub fn max_packet_bytes(&mut self, bytes: usize) -> &mut Self {
        self.check_lock();
        self.max_packet_bytes = bytes;
        self
    }

    pub fn add_component<C: Replicate + Default>(&mut self, policy: ReplicationPolicy) -> &mut Self {
        self.check_lock();
        if let Err(error) = self.components.register::<C>(policy) {
            panic!("Protocol component registration failed: {error}");
        }
        self
    }

    // Non-panicking builder methods

    pub fn try_tick_interval(&mut self, duration: Duration) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.tick_interval = duration;
        Ok(self)
    }

    pub fn try_max_packet_bytes(&mut self, bytes: usize) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.max_packet_bytes = bytes;
        Ok(self)
    }

    pub fn try_add_component<C: Replicate + Default>(
        &mut self,
        policy: ReplicationPolicy,
    ) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.components.register::<C>(policy)?;
        Ok(self)
    }

    pub fn try_lock(&mut self) -> Result<(), ProtocolError> {
        self.try_check_lock()?;
        self.finalize();
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.finalize();
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Checks if protocol is locked without panicking
    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), ProtocolError> {
        if self.locked {
            Err(ProtocolError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Checks if protocol is locked, panics if it is
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Protocol already locked!");
        }
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }

    fn finalize(&mut self) {
        if self.max_packet_bytes < MIN_PACKET_BYTES {
            warn!(
                "max_packet_bytes {} is below the {} byte floor, clamping",
                self.max_packet_bytes, MIN_PACKET_BYTES
            );
            self.max_packet_bytes = MIN_PACKET_BYTES;
        }
        self.locked = true;
    }
}
