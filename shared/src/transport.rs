use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::warn;
use thiserror::Error;

/// Returned when the transport refused or lost an outgoing packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("transport rejected outgoing packet")]
pub struct SendError;

/// Outbound half of a transport, one per remote peer.
///
/// The sync layer decides per packet whether delivery must be reliable;
/// the transport maps that onto whatever it has (streams vs datagrams,
/// resend logic, or nothing at all for loopback tests).
pub trait PacketSender: Send + Sync {
    fn send_reliable(&self, payload: &[u8]) -> Result<(), SendError>;

    fn send_unreliable(&self, payload: &[u8]) -> Result<(), SendError>;

    /// Smoothed round trip estimate, if the transport measures one.
    fn rtt(&self) -> Option<Duration> {
        None
    }
}

/// Inbound half of a transport: the wire side pushes decoded payloads in,
/// the simulation drains them once per tick.
///
/// Clones share the same queue, so one handle can live on a receive thread
/// while another is held by the server or client.
pub struct PacketQueue<T> {
    queue: Arc<Mutex<VecDeque<T>>>,
}

impl<T> PacketQueue<T> {
    pub fn new() -> Self {
        PacketQueue {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push(&self, item: T) {
        let Ok(mut queue) = self.queue.lock() else {
            warn!("packet queue lock is poisoned, dropping payload");
            return;
        };
        queue.push_back(item);
    }

    /// Removes and returns every queued item, oldest first.
    pub fn drain(&self) -> Vec<T> {
        let Ok(mut queue) = self.queue.lock() else {
            warn!("packet queue lock is poisoned, nothing to drain");
            return Vec::new();
        };
        queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        match self.queue.lock() {
            Ok(queue) => queue.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A derived Clone would demand T: Clone; handles only share the Arc.
impl<T> Clone for PacketQueue<T> {
    fn clone(&self) -> Self {
        PacketQueue {
            queue: self.queue.clone(),
        }
    }
}

impl<T> Default for PacketQueue<T> {
    fn default() -> Self {
        PacketQueue::new()
    }
}
