use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use log::warn;

use crate::{component::kinds::ComponentTypeId, world::entity::EntityId};

/// One changed (entity, component type) pair.
pub type DirtyPair = (EntityId, ComponentTypeId);

/// Insertion-ordered, de-duplicated record of every component changed since
/// it was last sent. One log exists per entity store; setters append to it
/// through their `DirtyHandle`.
pub struct DirtyLog {
    ordered: Vec<DirtyPair>,
    members: HashSet<DirtyPair>,
}

impl DirtyLog {
    pub fn new() -> Self {
        Self {
            ordered: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// Appends a pair, preserving the position of an already-recorded pair.
    pub fn push(&mut self, pair: DirtyPair) {
        if self.members.insert(pair) {
            self.ordered.push(pair);
        }
    }

    pub fn remove(&mut self, pair: &DirtyPair) {
        if self.members.remove(pair) {
            self.ordered.retain(|entry| entry != pair);
        }
    }

    /// Drops every pair belonging to the given entity
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.ordered.retain(|(id, _)| *id != entity);
        self.members.retain(|(id, _)| *id != entity);
    }

    /// Pairs in the order they were first marked
    pub fn snapshot(&self) -> Vec<DirtyPair> {
        self.ordered.clone()
    }

    pub fn clear(&mut self) {
        self.ordered.clear();
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl Default for DirtyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// The log is shared between the store and every component's dirty handle.
/// Writers hold the lock only long enough to append or drain.
pub type SharedDirtyLog = Arc<Mutex<DirtyLog>>;

pub fn new_shared_dirty_log() -> SharedDirtyLog {
    Arc::new(Mutex::new(DirtyLog::new()))
}

/// Installed into a component when it joins a store. `mark` records the
/// change in the store's shared log.
#[derive(Clone)]
pub struct DirtyHandle {
    entity: EntityId,
    type_id: ComponentTypeId,
    log: SharedDirtyLog,
}

impl DirtyHandle {
    pub fn new(entity: EntityId, type_id: ComponentTypeId, log: SharedDirtyLog) -> Self {
        Self {
            entity,
            type_id,
            log,
        }
    }

    pub fn mark(&self) {
        let Ok(mut log) = self.log.lock() else {
            warn!("dirty log lock is poisoned, dropping change record");
            return;
        };
        log.push((self.entity, self.type_id));
    }
}

/// Per-component change state: a local flag plus an optional handle into the
/// owning store's log. Setters call `mark` after a compare-and-set detects an
/// actual change.
#[derive(Default)]
pub struct DirtyFlag {
    dirty: bool,
    handle: Option<DirtyHandle>,
}

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self) {
        self.dirty = true;
        if let Some(handle) = &self.handle {
            handle.mark();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear(&mut self) {
        self.dirty = false;
    }

    pub fn bind(&mut self, handle: DirtyHandle) {
        self.handle = Some(handle);
    }

    pub fn unbind(&mut self) {
        self.handle = None;
    }
}

// Clones start clean and unbound. Interpolation snapshots and mirrored values
// must never write back into a store's log.
impl Clone for DirtyFlag {
    fn clone(&self) -> Self {
        Self {
            dirty: false,
            handle: None,
        }
    }
}
