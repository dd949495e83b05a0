use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use log::{debug, warn};

use statecast_shared::{
    encode_packet, AcknowledgeClientSideEntity, AcknowledgeServerSideEntity, ByteReader,
    DirtyPair, EntityId, EntityStore, HostType, PacketQueue, PacketSender, PacketType, Protocol,
    Serde, SimContext, TemplateSource, UserCommand,
};
use statecast_shared::component::kinds::ComponentTypeId;
use statecast_shared::types::Tick;
use statecast_shared::world::template::NoTemplates;

use crate::{
    config::ServerConfig,
    connection::Connection,
    error::ServerError,
    events::ServerEvent,
    interest::{interest_diff, InterestPolicy, RadiusInterest},
    update_packer::{pack, Candidate},
    user::UserKey,
};

/// Default visibility radius, in world units, when no interest policy is
/// installed.
pub const DEFAULT_INTEREST_RADIUS: f32 = 512.0;

/// Application code run once per tick, between input application and
/// broadcast. Movement, collision, harvesting and friends live behind this
/// seam; anything they change through component setters lands in the dirty
/// log like every other change.
pub trait SimulationHook {
    fn advance(&mut self, world: &mut EntityStore, context: &SimContext);
}

/// A hook that does nothing, for servers that only relay input
pub struct NoSimulation;

impl SimulationHook for NoSimulation {
    fn advance(&mut self, _world: &mut EntityStore, _context: &SimContext) {}
}

/// Work queued during a tick and run after broadcast, so side effects never
/// interleave with the tick's own entity iteration.
pub enum DeferredAction {
    DestroyEntity(EntityId),
    Run(Box<dyn FnOnce(&mut EntityStore) + Send>),
}

/// The authoritative host. Owns the world, one [`Connection`] per client,
/// and the fixed-rate tick that applies inbound commands and broadcasts
/// capped delta packets.
///
/// All simulation mutation happens on whichever thread calls [`tick`] /
/// [`run_tick_loop`]; transport threads only push into the inbound queue.
///
/// [`tick`]: Server::tick
/// [`run_tick_loop`]: Server::run_tick_loop
pub struct Server {
    config: ServerConfig,
    protocol: Protocol,
    world: EntityStore,
    templates: Box<dyn TemplateSource + Send>,
    interest: Box<dyn InterestPolicy>,
    connections: HashMap<UserKey, Connection>,
    next_user_key: u64,
    inbound: PacketQueue<(UserKey, Vec<u8>)>,
    deferred: Vec<DeferredAction>,
    events: Vec<ServerEvent>,
    tick: Tick,
}

impl Server {
    /// Create a new Server
    pub fn new(config: ServerConfig, mut protocol: Protocol) -> Self {
        if !protocol.is_locked() {
            protocol.lock();
        }
        Self {
            config,
            protocol,
            world: EntityStore::new(),
            templates: Box::new(NoTemplates),
            interest: Box::new(RadiusInterest::new(DEFAULT_INTEREST_RADIUS)),
            connections: HashMap::new(),
            next_user_key: 1,
            inbound: PacketQueue::new(),
            deferred: Vec::new(),
            events: Vec::new(),
            tick: 0,
        }
    }

    pub fn set_templates(&mut self, templates: Box<dyn TemplateSource + Send>) {
        self.templates = templates;
    }

    pub fn set_interest_policy(&mut self, policy: Box<dyn InterestPolicy>) {
        self.interest = policy;
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn world(&self) -> &EntityStore {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut EntityStore {
        &mut self.world
    }

    /// The tick currently being, or last, simulated
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Handle for transport receive threads to push `(user, payload)` pairs
    /// into; the tick loop drains it at the start of every tick.
    pub fn inbound_queue(&self) -> PacketQueue<(UserKey, Vec<u8>)> {
        self.inbound.clone()
    }

    /// Events accumulated since the last call
    pub fn take_events(&mut self) -> Vec<ServerEvent> {
        std::mem::take(&mut self.events)
    }

    // Connections

    /// Registers an accepted transport connection and returns its key. The
    /// handshake itself (auth, accept/reject with a reason string) belongs
    /// to the transport layer.
    pub fn connect_user(&mut self, sender: Box<dyn PacketSender>) -> UserKey {
        let user = UserKey::from_u64(self.next_user_key);
        self.next_user_key += 1;
        self.connections.insert(user, Connection::new(sender));
        self.events.push(ServerEvent::ConnectedUser(user));
        user
    }

    /// Removes a connection and every piece of per-connection state in one
    /// pass. The controlled entity's destruction is deferred to the end of
    /// the current tick rather than mutating the store inline.
    pub fn disconnect_user(&mut self, user: UserKey) -> Result<(), ServerError> {
        let connection = self
            .connections
            .remove(&user)
            .ok_or(ServerError::UnknownUser(user))?;
        if let Some(entity) = connection.controlled_entity() {
            self.deferred.push(DeferredAction::DestroyEntity(entity));
        }
        self.events.push(ServerEvent::DisconnectedUser(user));
        Ok(())
    }

    pub fn user(&self, user: UserKey) -> Result<&Connection, ServerError> {
        self.connections
            .get(&user)
            .ok_or(ServerError::UnknownUser(user))
    }

    pub fn user_mut(&mut self, user: UserKey) -> Result<&mut Connection, ServerError> {
        self.connections
            .get_mut(&user)
            .ok_or(ServerError::UnknownUser(user))
    }

    pub fn user_keys(&self) -> Vec<UserKey> {
        self.connections.keys().copied().collect()
    }

    /// Attaches a component to a world entity using the protocol's registry
    pub fn add_component(
        &mut self,
        entity: EntityId,
        component: Box<dyn statecast_shared::Replicate>,
    ) -> Result<(), ServerError> {
        self.world
            .add_component(entity, &self.protocol.components, component)?;
        Ok(())
    }

    /// Creates an entity from a named template through the installed
    /// template source
    pub fn create_entity_from_template(&mut self, template: &str) -> Result<EntityId, ServerError> {
        let entity = self.world.create_from_template(
            template,
            &self.protocol.components,
            self.templates.as_ref(),
        )?;
        Ok(entity)
    }

    /// Binds the entity this connection's commands steer
    pub fn assign_controlled_entity(
        &mut self,
        user: UserKey,
        entity: EntityId,
    ) -> Result<(), ServerError> {
        if !self.world.contains(entity) {
            return Err(ServerError::Store(
                statecast_shared::StoreError::NoSuchEntity(entity),
            ));
        }
        self.user_mut(user)?.set_controlled_entity(Some(entity));
        Ok(())
    }

    // Deferred actions

    pub fn defer(&mut self, action: DeferredAction) {
        self.deferred.push(action);
    }

    pub fn defer_destroy_entity(&mut self, entity: EntityId) {
        self.deferred.push(DeferredAction::DestroyEntity(entity));
    }

    // Predicted-spawn correlation

    /// Tells a client that the entity it predicted was created
    /// authoritatively: sends the entity's content hash and assigned id on
    /// the reliable channel, and tracks the entry until the client confirms.
    pub fn send_spawn_ack(&mut self, user: UserKey, entity: EntityId) -> Result<(), ServerError> {
        let content_hash = self.world.entity_content_hash(entity)?;
        let connection = self.user_mut(user)?;
        connection.track_spawn_ack(entity, content_hash);
        let payload = encode_packet(
            PacketType::AcknowledgeClientSideEntity,
            &AcknowledgeClientSideEntity {
                server_entity: entity,
                content_hash,
            },
        );
        connection.sender().send_reliable(&payload)?;
        Ok(())
    }

    // The tick

    /// Runs one complete tick: drain and apply inbound commands, advance the
    /// app simulation, scope/diff/pack/send per connection, run deferred
    /// actions, then clear exactly the dirty pairs every interested
    /// connection received.
    pub fn tick(&mut self, hook: &mut dyn SimulationHook) {
        self.tick = self.tick.wrapping_add(1);

        let batches = self.collect_inbound();
        self.apply_commands(batches);

        let context = SimContext {
            tick: self.tick,
            templates: self.templates.as_ref(),
        };
        hook.advance(&mut self.world, &context);

        let to_clear = self.broadcast();

        for action in std::mem::take(&mut self.deferred) {
            match action {
                DeferredAction::DestroyEntity(entity) => {
                    if let Err(err) = self.world.destroy_entity(entity) {
                        debug!("deferred destroy skipped: {err}");
                    }
                }
                DeferredAction::Run(work) => work(&mut self.world),
            }
        }

        // Anything deferred by a byte cap or a throttle window stays dirty
        // and goes out on a later tick; that is the backpressure mechanism.
        self.world.clear_dirty_pairs(&to_clear);
    }

    /// Calls [`tick`](Server::tick) at the protocol's fixed rate until
    /// `running` goes false. Sleeps off whatever the tick did not use; an
    /// overrun logs a warning and proceeds immediately, trading latency for
    /// never skipping a tick.
    pub fn run_tick_loop(&mut self, hook: &mut dyn SimulationHook, running: &AtomicBool) {
        while running.load(Ordering::Relaxed) {
            let started = Instant::now();
            self.tick(hook);
            let elapsed = started.elapsed();
            match self.protocol.tick_interval.checked_sub(elapsed) {
                Some(remaining) => thread::sleep(remaining),
                None => warn!(
                    "tick {} overran its {:?} budget, took {:?}",
                    self.tick, self.protocol.tick_interval, elapsed
                ),
            }
        }
    }

    /// Step 1: split the inbound FIFO into per-user command batches,
    /// resolving spawn-ack confirmations on the way. Packets from unknown
    /// users and undecodable packets are dropped without touching the rest.
    fn collect_inbound(&mut self) -> HashMap<UserKey, Vec<UserCommand>> {
        let mut batches: HashMap<UserKey, Vec<UserCommand>> = HashMap::new();
        for (user, payload) in self.inbound.drain() {
            let Some(connection) = self.connections.get_mut(&user) else {
                debug!("dropping packet from unknown user {user:?}");
                continue;
            };
            let mut reader = ByteReader::new(&payload);
            let packet_type = match PacketType::de(&mut reader) {
                Ok(packet_type) => packet_type,
                Err(err) => {
                    warn!("undecodable packet from {user:?}: {err}");
                    continue;
                }
            };
            match packet_type {
                PacketType::UserCommand => match UserCommand::de(&mut reader) {
                    Ok(command) => batches.entry(user).or_default().push(command),
                    Err(err) => warn!("bad command from {user:?}: {err}"),
                },
                PacketType::AcknowledgeServerSideEntity => {
                    match AcknowledgeServerSideEntity::de(&mut reader) {
                        Ok(ack) => {
                            if connection.confirm_spawn_ack(ack.server_entity) {
                                self.events.push(ServerEvent::SpawnConfirmed {
                                    user,
                                    entity: ack.server_entity,
                                });
                            } else {
                                debug!(
                                    "{user:?} confirmed spawn {:?} with no outstanding ack",
                                    ack.server_entity
                                );
                            }
                        }
                        Err(err) => warn!("bad spawn confirmation from {user:?}: {err}"),
                    }
                }
                other => debug!("unexpected {other:?} packet from {user:?}"),
            }
        }
        batches
    }

    /// Step 1, continued: apply each user's commands to their controlled
    /// entity in sequence order. Stale and over-limit commands are dropped;
    /// a missing entity drops the command but still counts it processed, so
    /// the client stops replaying it.
    fn apply_commands(&mut self, batches: HashMap<UserKey, Vec<UserCommand>>) {
        let context = SimContext {
            tick: self.tick,
            templates: self.templates.as_ref(),
        };
        let limit = self.config.command_rate_limit;
        for (user, mut commands) in batches {
            let Some(connection) = self.connections.get_mut(&user) else {
                continue;
            };
            commands.sort_unstable_by_key(|command| command.sequence);
            let mut accepted: u32 = 0;
            for command in commands {
                if command.sequence <= connection.last_processed_command() {
                    continue;
                }
                if limit > 0 && accepted >= limit {
                    debug!("{user:?} exceeded {limit} commands this tick, dropping the rest");
                    break;
                }
                accepted += 1;
                match connection.controlled_entity() {
                    Some(entity) => {
                        if let Err(err) = self.world.apply_command(entity, &command, &context) {
                            debug!("command {} from {user:?} dropped: {err}", command.sequence);
                        }
                    }
                    None => {
                        debug!("command from {user:?} with no controlled entity");
                    }
                }
                connection.advance_processed_command(command.sequence);
            }
        }
    }

    /// Steps 3 through 5: per connection, compute and diff the interest set,
    /// assemble create/update candidates, pack to the byte cap, and send.
    /// Returns the dirty pairs safe to clear in step 7.
    fn broadcast(&mut self) -> Vec<DirtyPair> {
        let tick = self.tick;
        let registry = &self.protocol.components;
        let tick_seconds = self.protocol.tick_interval.as_secs_f64();
        let snapshot = self.world.dirty_snapshot();

        // Pairs any connection could be sent, still in dirty order. Pairs
        // whose policy excludes them from updates drop out here and get
        // cleared in step 7 without ever hitting the wire.
        let mut eligible = Vec::new();
        for pair in &snapshot {
            match registry.policy(pair.1) {
                Ok(policy) => {
                    if policy.send_on_update && policy.direction.sendable_by(HostType::Server) {
                        eligible.push((*pair, *policy));
                    }
                }
                Err(err) => warn!("dirty pair with unknown component type: {err}"),
            }
        }

        let throttle_horizon = max_throttle_interval(registry, tick_seconds);

        // Shuffled send order, so no connection is structurally first under
        // bandwidth pressure.
        let mut users: Vec<UserKey> = self.connections.keys().copied().collect();
        users.sort_unstable_by_key(UserKey::to_u64);
        for index in (1..users.len()).rev() {
            users.swap(index, fastrand::usize(..=index));
        }

        let mut deferred_any: HashSet<DirtyPair> = HashSet::new();
        for user in users {
            let Some(connection) = self.connections.get_mut(&user) else {
                continue;
            };

            let current = self
                .interest
                .interest_set(&self.world, connection.controlled_entity());
            let (newly_visible, no_longer_visible) =
                interest_diff(connection.acked_entities(), &current);
            for entity in no_longer_visible {
                connection.queue_delete(entity);
            }
            let deletes = connection.take_pending_deletes();

            let mut candidates = Vec::new();
            for entity in newly_visible {
                let Ok(entity_ref) = self.world.entity(entity) else {
                    continue;
                };
                let mut components = Vec::new();
                for type_id in entity_ref.component_types() {
                    let Ok(policy) = registry.policy(type_id) else {
                        continue;
                    };
                    if !policy.send_on_create || !policy.direction.sendable_by(HostType::Server) {
                        continue;
                    }
                    match self.world.serialize_component(entity, type_id) {
                        Ok(bytes) => components.push((type_id, bytes)),
                        Err(err) => warn!("skipping component in create set: {err}"),
                    }
                }
                candidates.push(Candidate::Create { entity, components });
            }

            for (pair, policy) in &eligible {
                let (entity, type_id) = *pair;
                if !connection.knows_entity(entity) {
                    continue;
                }
                if policy.max_updates_per_second > 0 {
                    let interval =
                        interval_ticks(policy.max_updates_per_second, tick_seconds);
                    if !connection.throttle_allows(*pair, tick, interval) {
                        deferred_any.insert(*pair);
                        continue;
                    }
                }
                match self.world.serialize_component(entity, type_id) {
                    Ok(bytes) => candidates.push(Candidate::Update {
                        entity,
                        type_id,
                        bytes,
                        reliable: policy.reliable,
                    }),
                    Err(err) => warn!("skipping dirty pair: {err}"),
                }
            }

            let packed = pack(
                connection.last_processed_command(),
                tick,
                deletes,
                candidates,
                self.protocol.max_packet_bytes,
            );

            let sent = if packed.reliable {
                connection.sender().send_reliable(&packed.payload)
            } else {
                connection.sender().send_unreliable(&packed.payload)
            };
            if let Err(err) = sent {
                warn!("send to {user:?} failed: {err}");
            }

            for entity in packed.packed_creates {
                connection.ack_entity(entity);
            }
            for pair in &packed.packed_pairs {
                connection.record_sent_pair(*pair, tick);
            }
            deferred_any.extend(packed.deferred_pairs);
            connection.restore_pending_deletes(packed.deferred_deletes);
            if throttle_horizon > 0 {
                connection.prune_throttle_history(tick, throttle_horizon.saturating_mul(2));
            }
        }

        snapshot
            .into_iter()
            .filter(|pair| !deferred_any.contains(pair))
            .collect()
    }
}

/// Ticks a throttled pair must wait between sends to stay within its
/// updates-per-second budget.
fn interval_ticks(max_updates_per_second: u32, tick_seconds: f64) -> Tick {
    let seconds_between = 1.0 / f64::from(max_updates_per_second);
    ((seconds_between / tick_seconds).ceil() as Tick).max(1)
}

/// Longest throttle interval any registered component type asks for
fn max_throttle_interval(
    registry: &statecast_shared::ComponentRegistry,
    tick_seconds: f64,
) -> Tick {
    let mut horizon = 0;
    for index in 0..registry.len() {
        if let Ok(policy) = registry.policy(ComponentTypeId::new(index as u16)) {
            if policy.max_updates_per_second > 0 {
                horizon = horizon.max(interval_ticks(policy.max_updates_per_second, tick_seconds));
            }
        }
    }
    horizon
}
