use std::collections::HashMap;
use std::time::Instant;

use log::{debug, trace, warn};

use statecast_shared::{
    encode_packet, AcknowledgeClientSideEntity, AcknowledgeServerSideEntity, ButtonSet,
    ByteReader, EntityId, EntityStore, LocalEntityMap, PacketQueue, PacketSender, PacketType,
    Protocol, Replicate, Serde, SimContext, TemplateSource, UpdateEntitiesPacket, UserCommand,
};
use statecast_shared::types::{CommandSeq, Tick};
use statecast_shared::world::template::NoTemplates;

use crate::{
    command_history::CommandHistory,
    config::ClientConfig,
    error::ClientError,
    events::ClientEvent,
    interpolation::EntityInterpolation,
    pending_spawns::PendingSpawns,
};

/// One frame of sampled input, handed to [`Client::update`] by the
/// application's input layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub buttons: ButtonSet,
    pub pointed_tile_x: i32,
    pub pointed_tile_y: i32,
    /// Seconds since the previous frame
    pub delta_time: f32,
}

/// The predicting host. Owns a mirror world, sends one command per frame,
/// applies it locally without waiting, and folds authoritative snapshots
/// back in: the controlled entity snaps and replays unacknowledged input,
/// everything else glides through interpolation buffers.
///
/// All mutation happens on whichever thread calls [`update`](Client::update);
/// transport threads only push into the inbound queue.
pub struct Client {
    config: ClientConfig,
    protocol: Protocol,
    world: EntityStore,
    entity_map: LocalEntityMap,
    sender: Box<dyn PacketSender>,
    inbound: PacketQueue<Vec<u8>>,
    history: CommandHistory,
    next_sequence: CommandSeq,
    last_sent_buttons: ButtonSet,
    controlled_server: Option<EntityId>,
    interpolation: HashMap<EntityId, EntityInterpolation>,
    pending_spawns: PendingSpawns,
    /// Server ids deleted within the last interpolation window, with the
    /// newest tick known when the delete applied. A reordered update from
    /// before the delete must not re-create the mirror.
    recently_deleted: HashMap<EntityId, Tick>,
    newest_server_tick: Tick,
    templates: Box<dyn TemplateSource + Send>,
    events: Vec<ClientEvent>,
}

impl Client {
    /// Create a new Client
    pub fn new(config: ClientConfig, mut protocol: Protocol, sender: Box<dyn PacketSender>) -> Self {
        if !protocol.is_locked() {
            protocol.lock();
        }
        let history = CommandHistory::new(config.command_history_limit);
        Self {
            config,
            protocol,
            world: EntityStore::new(),
            entity_map: LocalEntityMap::new(),
            sender,
            inbound: PacketQueue::new(),
            history,
            next_sequence: 1,
            last_sent_buttons: ButtonSet::EMPTY,
            controlled_server: None,
            interpolation: HashMap::new(),
            pending_spawns: PendingSpawns::new(),
            recently_deleted: HashMap::new(),
            newest_server_tick: 0,
            templates: Box::new(NoTemplates),
            events: Vec::new(),
        }
    }

    pub fn set_templates(&mut self, templates: Box<dyn TemplateSource + Send>) {
        self.templates = templates;
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

    pub fn entity_map(&self) -> &LocalEntityMap {
        &self.entity_map
    }

    /// Newest server tick folded into the local mirror
    pub fn newest_server_tick(&self) -> Tick {
        self.newest_server_tick
    }

    /// Commands sent but not yet acknowledged by the server
    pub fn pending_command_count(&self) -> usize {
        self.history.len()
    }

    pub fn pending_spawn_count(&self) -> usize {
        self.pending_spawns.len()
    }

    /// Handle for the transport receive thread to push payloads into; the
    /// frame loop drains it during every [`update`](Client::update).
    pub fn inbound_queue(&self) -> PacketQueue<Vec<u8>> {
        self.inbound.clone()
    }

    /// Events accumulated since the last call
    pub fn take_events(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.events)
    }

    /// Binds which replicated entity this client steers. The id arrives
    /// through the application's handshake, outside this layer.
    pub fn set_controlled_entity(&mut self, server: EntityId) {
        self.controlled_server = Some(server);
        // Own state is predicted, never interpolated
        if let Some(local) = self.entity_map.local(server) {
            self.interpolation.remove(&local);
        }
    }

    /// Local id of the controlled entity, once its mirror exists
    pub fn controlled_entity(&self) -> Option<EntityId> {
        self.controlled_server
            .and_then(|server| self.entity_map.local(server))
    }

    /// The transport calls this when the connection is gone
    pub fn notify_disconnected(&mut self) {
        self.events.push(ClientEvent::Disconnected);
    }

    /// Runs one frame: send and locally apply this frame's input, fold in
    /// received snapshots (snap + replay for the controlled entity,
    /// retarget for the rest), process deletes, advance interpolation, and
    /// sweep predicted-spawn acknowledgements and timeouts.
    pub fn update(&mut self, input: FrameInput, now: Instant) {
        self.send_and_predict(input);

        for payload in self.inbound.drain() {
            let mut reader = ByteReader::new(&payload);
            let packet_type = match PacketType::de(&mut reader) {
                Ok(packet_type) => packet_type,
                Err(err) => {
                    warn!("undecodable packet from server: {err}");
                    continue;
                }
            };
            match packet_type {
                PacketType::UpdateEntities => match UpdateEntitiesPacket::de(&mut reader) {
                    Ok(packet) => self.apply_update_packet(packet),
                    Err(err) => warn!("bad update packet: {err}"),
                },
                PacketType::AcknowledgeClientSideEntity => {
                    match AcknowledgeClientSideEntity::de(&mut reader) {
                        Ok(ack) => self.resolve_spawn_ack(ack),
                        Err(err) => warn!("bad spawn acknowledgement: {err}"),
                    }
                }
                other => debug!("unexpected {other:?} packet from server"),
            }
        }

        self.advance_interpolation(input.delta_time);
        self.expire_predicted_spawns(now);

        // Client-side setters feed the same dirty machinery, but nothing
        // upstream consumes it here; state flows to the server as commands.
        self.world.discard_dirty();
    }

    /// Step 1: stamp, send, remember, and locally apply this frame's command
    fn send_and_predict(&mut self, input: FrameInput) {
        let command = UserCommand {
            sequence: self.next_sequence,
            delta_time: input.delta_time,
            previous_buttons: self.last_sent_buttons,
            buttons: input.buttons,
            pointed_tile_x: input.pointed_tile_x,
            pointed_tile_y: input.pointed_tile_y,
            last_received_server_tick: self.newest_server_tick,
        };
        self.next_sequence += 1;
        self.last_sent_buttons = input.buttons;

        let payload = encode_packet(PacketType::UserCommand, &command);
        if let Err(err) = self.sender.send_unreliable(&payload) {
            warn!("command {} not sent: {err}", command.sequence);
        }

        if let Some(local) = self.controlled_entity() {
            let context = SimContext {
                tick: self.newest_server_tick,
                templates: self.templates.as_ref(),
            };
            if let Err(err) = self.world.apply_command(local, &command, &context) {
                debug!("prediction skipped: {err}");
            }
        }
        self.history.push(command);
    }

    fn apply_update_packet(&mut self, packet: UpdateEntitiesPacket) {
        // Latest state wins: a reordered pure-update packet has nothing the
        // newest one did not already say. Structural packets (deletes or
        // first sight of an entity) apply regardless of age.
        let stale = packet.server_tick < self.newest_server_tick;
        if stale
            && packet.deleted_entities.is_empty()
            && packet
                .updates
                .iter()
                .all(|update| self.entity_map.contains_server(update.entity))
        {
            trace!("dropping stale update packet for tick {}", packet.server_tick);
            return;
        }
        self.newest_server_tick = self.newest_server_tick.max(packet.server_tick);

        let mut snapped_own = false;
        for update in &packet.updates {
            let server = update.entity;
            let own = self.controlled_server == Some(server);
            let local = match self.entity_map.local(server) {
                Some(local) => local,
                None => {
                    // An unknown id could also be one this client just
                    // deleted; an update from at or before that delete is
                    // the entity's past, not a new appearance.
                    if let Some(deleted_at) = self.recently_deleted.get(&server) {
                        if packet.server_tick <= *deleted_at {
                            trace!("dropping update for deleted entity {server:?}");
                            continue;
                        }
                    }
                    self.recently_deleted.remove(&server);
                    match self.create_mirror(server) {
                        Some(local) => local,
                        None => continue,
                    }
                }
            };

            if own {
                snapped_own = true;
                self.snap_components(local, update);
            } else {
                // A fresh mirror has no components yet, so this snaps its
                // first full set in and only glides from then on.
                self.retarget_components(local, update);
            }
        }

        // Everything the server has processed is baked into its snapshot
        self.history.discard_through(packet.last_processed_command);
        if snapped_own {
            self.replay_pending();
        }

        for server in &packet.deleted_entities {
            self.destroy_mirror(*server);
        }

        let horizon = self.deletion_memory_ticks();
        let newest = self.newest_server_tick;
        self.recently_deleted
            .retain(|_, deleted_at| newest.wrapping_sub(*deleted_at) <= horizon);
    }

    /// How many ticks a deleted server id stays remembered: one
    /// interpolation window's worth, the span a reordered update can still
    /// plausibly arrive within.
    fn deletion_memory_ticks(&self) -> Tick {
        let window = self
            .config
            .interpolation_window
            .unwrap_or(2 * self.protocol.tick_interval)
            .as_secs_f32();
        let ticks = (window / self.protocol.tick_interval.as_secs_f32()).ceil();
        (ticks as Tick).max(1)
    }

    fn create_mirror(&mut self, server: EntityId) -> Option<EntityId> {
        let local = self.world.create_entity();
        if let Err(err) = self.entity_map.insert(server, local) {
            warn!("mirror for {server:?} not registered: {err}");
            let _ = self.world.destroy_entity(local);
            return None;
        }
        self.events.push(ClientEvent::SpawnedEntity { server, local });
        Some(local)
    }

    /// Overwrites components with authoritative bytes, creating missing ones
    fn snap_components(
        &mut self,
        local: EntityId,
        update: &statecast_shared::EntityUpdate,
    ) {
        for component in &update.components {
            if let Err(err) = self.world.apply_component_update(
                local,
                component.type_id,
                &self.protocol.components,
                &component.bytes,
            ) {
                warn!("component update dropped: {err}");
            }
        }
    }

    /// Pushes authoritative bytes as interpolation targets. Components the
    /// mirror does not have yet are snapped in, there is nothing to glide
    /// from.
    fn retarget_components(
        &mut self,
        local: EntityId,
        update: &statecast_shared::EntityUpdate,
    ) {
        for component in &update.components {
            let type_id = component.type_id;
            let has_component = self
                .world
                .entity(local)
                .map(|entity| entity.has(type_id))
                .unwrap_or(false);
            if !has_component {
                if let Err(err) = self.world.apply_component_update(
                    local,
                    type_id,
                    &self.protocol.components,
                    &component.bytes,
                ) {
                    warn!("component update dropped: {err}");
                }
                continue;
            }

            let mut target = match self.protocol.components.create(type_id) {
                Ok(target) => target,
                Err(err) => {
                    warn!("component update dropped: {err}");
                    continue;
                }
            };
            let mut reader = ByteReader::new(&component.bytes);
            if let Err(err) = target.read(&mut reader) {
                warn!("component update dropped: {err}");
                continue;
            }

            let Ok(live) = self.world.component_dyn(local, type_id) else {
                continue;
            };
            self.interpolation
                .entry(local)
                .or_default()
                .retarget(type_id, live, target);
        }
    }

    /// Replays every unacknowledged command, oldest first, on top of the
    /// just-applied authoritative state. Order matters: input application
    /// integrates, it does not commute.
    fn replay_pending(&mut self) {
        let Some(local) = self.controlled_entity() else {
            return;
        };
        let context = SimContext {
            tick: self.newest_server_tick,
            templates: self.templates.as_ref(),
        };
        for command in self.history.iter() {
            if let Err(err) = self.world.apply_command(local, command, &context) {
                debug!("replay of command {} skipped: {err}", command.sequence);
            }
        }
    }

    fn destroy_mirror(&mut self, server: EntityId) {
        let Some(local) = self.entity_map.remove_by_server(server) else {
            debug!("delete for unknown entity {server:?}");
            return;
        };
        self.interpolation.remove(&local);
        if let Err(err) = self.world.destroy_entity(local) {
            warn!("mirror for {server:?} already gone: {err}");
        }
        self.recently_deleted.insert(server, self.newest_server_tick);
        if self.controlled_server == Some(server) {
            self.controlled_server = None;
        }
        self.events
            .push(ClientEvent::DespawnedEntity { server, local });
    }

    /// Step 4: glide every non-owned mirror toward its newest sample
    fn advance_interpolation(&mut self, delta_time: f32) {
        let window = self
            .config
            .interpolation_window
            .unwrap_or(2 * self.protocol.tick_interval)
            .as_secs_f32();
        if window <= 0.0 {
            return;
        }
        let fraction = delta_time / window;
        let own = self.controlled_entity();

        for (local, interpolation) in self.interpolation.iter_mut() {
            if Some(*local) == own {
                continue;
            }
            for (type_id, buffer) in interpolation.buffers_mut() {
                match self.world.component_dyn_mut(*local, type_id) {
                    Ok(live) => buffer.advance(live, fraction),
                    Err(err) => trace!("interpolation target missing: {err}"),
                }
            }
        }
    }

    // Predicted spawns

    /// Creates and registers an entity the server has not confirmed yet. It
    /// exists (and renders) immediately; the content hash correlates it with
    /// the authoritative entity once the acknowledgement arrives.
    pub fn predict_spawn(
        &mut self,
        components: Vec<Box<dyn Replicate>>,
        now: Instant,
    ) -> Result<EntityId, ClientError> {
        let local = self.world.create_entity();
        for component in components {
            if let Err(err) = self
                .world
                .add_component(local, &self.protocol.components, component)
            {
                let _ = self.world.destroy_entity(local);
                return Err(err.into());
            }
        }
        let hash = self.world.entity_content_hash(local)?;
        self.pending_spawns.insert(hash, local, now);
        Ok(local)
    }

    fn resolve_spawn_ack(&mut self, ack: AcknowledgeClientSideEntity) {
        let Some(local) = self.pending_spawns.take(&ack.content_hash) else {
            debug!("spawn acknowledgement with unmatched hash, ignoring");
            return;
        };
        if let Err(err) = self.entity_map.insert(ack.server_entity, local) {
            warn!("predicted spawn binding failed: {err}");
            return;
        }
        let reply = encode_packet(
            PacketType::AcknowledgeServerSideEntity,
            &AcknowledgeServerSideEntity {
                server_entity: ack.server_entity,
            },
        );
        if let Err(err) = self.sender.send_reliable(&reply) {
            warn!("spawn confirmation not sent: {err}");
        }
        self.events.push(ClientEvent::SpawnAcknowledged {
            server: ack.server_entity,
            local,
        });
    }

    /// Step 5: roll back predicted spawns the server never confirmed
    fn expire_predicted_spawns(&mut self, now: Instant) {
        for local in self
            .pending_spawns
            .expire(now, self.config.predicted_spawn_timeout)
        {
            self.interpolation.remove(&local);
            if let Err(err) = self.world.destroy_entity(local) {
                debug!("expired spawn already gone: {err}");
            }
            self.events.push(ClientEvent::SpawnExpired { local });
        }
    }
}
