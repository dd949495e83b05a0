//! Prediction and reconciliation of the controlled entity: snap to the
//! authoritative snapshot, discard acknowledged commands, replay the rest
//! in order.

use std::time::Instant;

use statecast_client::{Client, ClientConfig, FrameInput};
use statecast_shared::{
    encode_packet, math::Vec2, Button, ButtonSet, ComponentTypeId, ComponentUpdate, EntityId,
    EntityUpdate, PacketQueue, PacketType, Replicate, Transform, UpdateEntitiesPacket,
    MOVE_SPEED,
};
use statecast_test::{harness::TestPair, loopback::ClientBoundSender, test_protocol::test_protocol};

const DT: f32 = 0.05;

fn right() -> FrameInput {
    FrameInput {
        buttons: ButtonSet::EMPTY.with(Button::Right),
        delta_time: DT,
        ..FrameInput::default()
    }
}

fn idle() -> FrameInput {
    FrameInput {
        delta_time: DT,
        ..FrameInput::default()
    }
}

/// A client whose outbound commands go nowhere, for crafting inbound
/// packets by hand
fn offline_client() -> Client {
    let sink = PacketQueue::new();
    Client::new(
        ClientConfig::default(),
        test_protocol(),
        Box::new(ClientBoundSender::new(sink)),
    )
}

fn transform_update(entity: EntityId, x: f32, vx: f32) -> EntityUpdate {
    let transform = Transform::new(Vec2::new(x, 0.0), Vec2::new(vx, 0.0));
    let mut writer = statecast_shared::ByteWriter::new();
    transform.write(&mut writer);
    EntityUpdate {
        entity,
        components: vec![ComponentUpdate {
            type_id: ComponentTypeId::new(0),
            bytes: writer.to_bytes(),
        }],
    }
}

#[test]
fn replaying_the_same_commands_is_deterministic() {
    let protocol = test_protocol();
    let commands: Vec<FrameInput> = vec![right(), right(), idle(), right()];

    let run = || {
        let mut world = statecast_shared::EntityStore::new();
        let entity = world.create_entity();
        world
            .add_component(entity, &protocol.components, Box::new(Transform::default()))
            .unwrap();
        let templates = statecast_shared::NoTemplates;
        let context = statecast_shared::SimContext {
            tick: 1,
            templates: &templates,
        };
        for (index, input) in commands.iter().enumerate() {
            let command = statecast_shared::UserCommand {
                sequence: index as u32 + 1,
                delta_time: input.delta_time,
                previous_buttons: ButtonSet::EMPTY,
                buttons: input.buttons,
                pointed_tile_x: 0,
                pointed_tile_y: 0,
                last_received_server_tick: 0,
            };
            world.apply_command(entity, &command, &context).unwrap();
        }
        let transform: &Transform = world.component(entity).unwrap();
        (transform.position(), transform.velocity())
    };

    assert_eq!(run(), run(), "bit-for-bit identical end states");
}

/// Scenario A, with a server correction so the replay is observable: the
/// client sent commands 1..=5, the snapshot acknowledges 3 and moves the
/// player somewhere prediction did not. The client must discard 1..=3 and
/// rebuild its state as snapshot + 4 + 5 (+ the frame's own command 6).
#[test]
fn snapshot_discards_acknowledged_commands_and_replays_the_rest() {
    let mut client = offline_client();
    let own = EntityId::new(10);
    client.set_controlled_entity(own);

    // First sight of the own entity, at the origin
    let mut create = UpdateEntitiesPacket::new(0, 1);
    create.updates.push(transform_update(own, 0.0, 0.0));
    client
        .inbound_queue()
        .push(encode_packet(PacketType::UpdateEntities, &create));

    let now = Instant::now();
    for _ in 0..5 {
        client.update(right(), now);
    }
    assert_eq!(client.pending_command_count(), 5);

    // Authoritative correction: commands 1..=3 processed, but the server
    // says the player is at x = 20, not where prediction put it.
    let mut snapshot = UpdateEntitiesPacket::new(3, 2);
    snapshot.updates.push(transform_update(own, 20.0, MOVE_SPEED));
    client
        .inbound_queue()
        .push(encode_packet(PacketType::UpdateEntities, &snapshot));

    client.update(idle(), now);

    assert_eq!(
        client.pending_command_count(),
        3,
        "commands 4, 5 and this frame's 6 remain"
    );
    let local = client.entity_map().local(own).unwrap();
    let transform: &Transform = client.world().component(local).unwrap();
    let step = MOVE_SPEED * DT;
    let expected = 20.0 + step + step; // replayed 4 and 5; 6 was idle
    assert!(
        (transform.position().x - expected).abs() < 1e-3,
        "got {}, expected {expected}",
        transform.position().x
    );
}

/// With a zero-latency loopback and one command per tick, the predicted
/// state must agree with the authoritative state after every exchange;
/// anything else means replay diverged from the server's application order.
#[test]
fn prediction_matches_the_server_under_lockstep() {
    let mut pair = TestPair::connect();
    let player = pair.spawn_player(Vec2::ZERO);

    pair.step(right());
    for _ in 0..8 {
        pair.step(right());

        let server_transform: &Transform = pair.server.world().component(player).unwrap();
        let local = pair.local_of(player).unwrap();
        let client_transform: &Transform = pair.client.world().component(local).unwrap();

        assert!(
            (server_transform.position().x - client_transform.position().x).abs() < 1e-4,
            "server at {}, client predicted {}",
            server_transform.position().x,
            client_transform.position().x
        );
    }
}

/// The controlled entity must never interpolate; the snapshot applies
/// immediately even mid-frame.
#[test]
fn own_entity_snaps_instead_of_interpolating() {
    let mut client = offline_client();
    let own = EntityId::new(4);
    client.set_controlled_entity(own);

    let mut create = UpdateEntitiesPacket::new(0, 1);
    create.updates.push(transform_update(own, 0.0, 0.0));
    client
        .inbound_queue()
        .push(encode_packet(PacketType::UpdateEntities, &create));
    client.update(idle(), Instant::now());

    let mut snapshot = UpdateEntitiesPacket::new(1, 2);
    snapshot.updates.push(transform_update(own, 40.0, 0.0));
    client
        .inbound_queue()
        .push(encode_packet(PacketType::UpdateEntities, &snapshot));
    client.update(idle(), Instant::now());

    let local = client.entity_map().local(own).unwrap();
    let transform: &Transform = client.world().component(local).unwrap();
    assert_eq!(transform.position().x, 40.0, "no easing on the own entity");
}
