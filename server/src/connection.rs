use std::collections::{HashMap, HashSet};

use statecast_shared::{ContentHash, DirtyPair, EntityId, PacketSender};
use statecast_shared::types::{CommandSeq, Tick};

/// Everything the server remembers about one connected client. Lives exactly
/// as long as the transport connection; `disconnect_user` drops the whole
/// struct, which is what makes cleanup atomic.
pub struct Connection {
    sender: Box<dyn PacketSender>,
    controlled_entity: Option<EntityId>,
    last_processed_command: CommandSeq,
    /// Entities whose create set this client has been sent and not yet told
    /// to delete: the acked interest set from prior ticks.
    acked_entities: HashSet<EntityId>,
    /// Delete ids waiting for packet space, exactly one entry per departure
    pending_deletes: Vec<EntityId>,
    /// Tick each throttled pair was last sent on
    last_sent_tick: HashMap<DirtyPair, Tick>,
    /// Predicted-spawn acks sent and not yet confirmed by the client
    outstanding_spawn_acks: HashMap<EntityId, ContentHash>,
    /// World chunks streamed to this client, opaque to the sync core
    loaded_chunks: HashSet<(i32, i32)>,
    /// Container entities whose contents this client is viewing
    viewed_containers: HashSet<EntityId>,
}

impl Connection {
    pub(crate) fn new(sender: Box<dyn PacketSender>) -> Self {
        Self {
            sender,
            controlled_entity: None,
            last_processed_command: 0,
            acked_entities: HashSet::new(),
            pending_deletes: Vec::new(),
            last_sent_tick: HashMap::new(),
            outstanding_spawn_acks: HashMap::new(),
            loaded_chunks: HashSet::new(),
            viewed_containers: HashSet::new(),
        }
    }

    pub fn sender(&self) -> &dyn PacketSender {
        self.sender.as_ref()
    }

    pub fn controlled_entity(&self) -> Option<EntityId> {
        self.controlled_entity
    }

    pub(crate) fn set_controlled_entity(&mut self, entity: Option<EntityId>) {
        self.controlled_entity = entity;
    }

    pub fn last_processed_command(&self) -> CommandSeq {
        self.last_processed_command
    }

    pub(crate) fn advance_processed_command(&mut self, sequence: CommandSeq) {
        self.last_processed_command = self.last_processed_command.max(sequence);
    }

    // Interest bookkeeping

    pub fn knows_entity(&self, entity: EntityId) -> bool {
        self.acked_entities.contains(&entity)
    }

    pub(crate) fn acked_entities(&self) -> &HashSet<EntityId> {
        &self.acked_entities
    }

    pub(crate) fn ack_entity(&mut self, entity: EntityId) {
        self.acked_entities.insert(entity);
    }

    /// Moves an entity from the acked set onto the delete queue. The removal
    /// happens here, so a departure can only ever queue one delete.
    pub(crate) fn queue_delete(&mut self, entity: EntityId) {
        if self.acked_entities.remove(&entity) {
            self.pending_deletes.push(entity);
            self.last_sent_tick.retain(|(id, _), _| *id != entity);
        }
    }

    pub(crate) fn take_pending_deletes(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.pending_deletes)
    }

    pub(crate) fn restore_pending_deletes(&mut self, deferred: Vec<EntityId>) {
        self.pending_deletes = deferred;
    }

    // Per-instance rate throttling

    /// True when a pair throttled to `max_updates_per_second` may send again
    /// on `tick`, given the tick spacing that rate works out to.
    pub(crate) fn throttle_allows(
        &self,
        pair: DirtyPair,
        tick: Tick,
        min_interval_ticks: Tick,
    ) -> bool {
        match self.last_sent_tick.get(&pair) {
            None => true,
            Some(last) => tick.wrapping_sub(*last) >= min_interval_ticks,
        }
    }

    pub(crate) fn record_sent_pair(&mut self, pair: DirtyPair, tick: Tick) {
        self.last_sent_tick.insert(pair, tick);
    }

    // Spawn acknowledgements

    pub(crate) fn track_spawn_ack(&mut self, entity: EntityId, hash: ContentHash) {
        self.outstanding_spawn_acks.insert(entity, hash);
    }

    pub(crate) fn confirm_spawn_ack(&mut self, entity: EntityId) -> bool {
        self.outstanding_spawn_acks.remove(&entity).is_some()
    }

    pub fn has_outstanding_spawn_ack(&self, entity: EntityId) -> bool {
        self.outstanding_spawn_acks.contains_key(&entity)
    }

    // Game bookkeeping, carried per connection and cleared with it

    pub fn mark_chunk_loaded(&mut self, chunk: (i32, i32)) {
        self.loaded_chunks.insert(chunk);
    }

    pub fn unmark_chunk_loaded(&mut self, chunk: (i32, i32)) {
        self.loaded_chunks.remove(&chunk);
    }

    pub fn chunk_is_loaded(&self, chunk: (i32, i32)) -> bool {
        self.loaded_chunks.contains(&chunk)
    }

    pub fn view_container(&mut self, container: EntityId) {
        self.viewed_containers.insert(container);
    }

    pub fn close_container(&mut self, container: EntityId) {
        self.viewed_containers.remove(&container);
    }

    pub fn is_viewing_container(&self, container: EntityId) -> bool {
        self.viewed_containers.contains(&container)
    }

    /// Forget throttle entries old enough that they could not suppress a
    /// send anymore, so the map does not grow with every component that was
    /// ever dirty.
    pub(crate) fn prune_throttle_history(&mut self, tick: Tick, horizon_ticks: Tick) {
        self.last_sent_tick
            .retain(|_, last| tick.wrapping_sub(*last) <= horizon_ticks);
    }
}
