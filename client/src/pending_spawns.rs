use std::collections::HashMap;
use std::time::{Duration, Instant};

use statecast_shared::{ContentHash, EntityId};

/// Client-predicted entities waiting for the server's authoritative
/// acknowledgement, keyed by the content hash both sides compute over the
/// entity's serialized components.
pub struct PendingSpawns {
    entries: HashMap<ContentHash, PendingSpawn>,
}

struct PendingSpawn {
    local: EntityId,
    predicted_at: Instant,
}

impl PendingSpawns {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, hash: ContentHash, local: EntityId, predicted_at: Instant) {
        self.entries.insert(
            hash,
            PendingSpawn {
                local,
                predicted_at,
            },
        );
    }

    /// Resolves an acknowledged hash, removing and returning its local
    /// entity. `None` for a hash this client never predicted.
    pub fn take(&mut self, hash: &ContentHash) -> Option<EntityId> {
        self.entries.remove(hash).map(|entry| entry.local)
    }

    /// Removes every entry older than `timeout`, returning the local
    /// entities to roll back. The server is never going to confirm them,
    /// usually because it rejected the placement.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> Vec<EntityId> {
        let mut expired = Vec::new();
        self.entries.retain(|_, entry| {
            if now.duration_since(entry.predicted_at) >= timeout {
                expired.push(entry.local);
                false
            } else {
                true
            }
        });
        expired.sort_unstable();
        expired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PendingSpawns {
    fn default() -> Self {
        Self::new()
    }
}
