//! A connected server/client pair over the loopback transport, plus the
//! stepping helpers most scenarios share.

use std::time::Instant;

use statecast_client::{Client, ClientConfig, FrameInput};
use statecast_server::{NoSimulation, Server, ServerConfig, UserKey};
use statecast_shared::{math::Vec2, EntityId, Transform};

use crate::{
    loopback::{ClientBoundSender, ServerBoundSender},
    test_protocol::test_protocol,
};

pub struct TestPair {
    pub server: Server,
    pub client: Client,
    pub user: UserKey,
}

impl TestPair {
    pub fn connect() -> Self {
        Self::connect_with(ServerConfig::default(), ClientConfig::default())
    }

    pub fn connect_with(server_config: ServerConfig, client_config: ClientConfig) -> Self {
        Self::connect_custom(server_config, client_config, test_protocol)
    }

    /// Connects a pair speaking a non-default protocol. `protocol` is called
    /// once per side; both calls must build identically.
    pub fn connect_custom(
        server_config: ServerConfig,
        client_config: ClientConfig,
        protocol: impl Fn() -> statecast_shared::Protocol,
    ) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let server = Server::new(server_config, protocol());

        let to_server = ServerBoundSender::new(server.inbound_queue());
        let binding = to_server.binding();
        let client = Client::new(client_config, protocol(), Box::new(to_server));

        let mut server = server;
        let user = server.connect_user(Box::new(ClientBoundSender::new(client.inbound_queue())));
        binding.bind(user);

        TestPair {
            server,
            client,
            user,
        }
    }

    /// Creates the player entity, wires it as controlled on both sides, and
    /// returns its server id. The id handoff stands in for the out-of-scope
    /// connect handshake.
    pub fn spawn_player(&mut self, position: Vec2) -> EntityId {
        let entity = self.server.world_mut().create_entity();
        self.server
            .add_component(entity, Box::new(Transform::new(position, Vec2::ZERO)))
            .unwrap();
        self.server
            .assign_controlled_entity(self.user, entity)
            .unwrap();
        self.client.set_controlled_entity(entity);
        entity
    }

    /// One lockstep exchange: the client frames (sending its command and
    /// draining the previous tick's snapshot), then the server ticks.
    pub fn step(&mut self, input: FrameInput) {
        self.client.update(input, Instant::now());
        self.server.tick(&mut NoSimulation);
    }

    pub fn step_n(&mut self, input: FrameInput, frames: usize) {
        for _ in 0..frames {
            self.step(input);
        }
    }

    /// The client's local mirror of a server entity
    pub fn local_of(&self, server_entity: EntityId) -> Option<EntityId> {
        self.client.entity_map().local(server_entity)
    }
}
