//! The server's two defenses against a noisy peer: the per-tick command cap
//! and the per-instance update throttle.

use std::time::Duration;

use statecast_client::{ClientConfig, FrameInput};
use statecast_server::{FullInterest, NoSimulation, ServerConfig};
use statecast_shared::{
    encode_packet, math::Vec2, Button, ButtonSet, PacketType, ReplicationPolicy, Transform,
    UserCommand, MOVE_SPEED,
};
use statecast_test::harness::TestPair;

const DT: f32 = 0.05;

fn idle() -> FrameInput {
    FrameInput {
        delta_time: DT,
        ..FrameInput::default()
    }
}

fn right_command(sequence: u32) -> Vec<u8> {
    let command = UserCommand {
        sequence,
        delta_time: DT,
        previous_buttons: ButtonSet::EMPTY,
        buttons: ButtonSet::EMPTY.with(Button::Right),
        pointed_tile_x: 0,
        pointed_tile_y: 0,
        last_received_server_tick: 0,
    };
    encode_packet(PacketType::UserCommand, &command)
}

/// A connection that queues more commands than the per-tick cap only gets
/// the cap's worth of simulation; the excess is dropped, not banked.
#[test]
fn command_flood_is_capped_per_tick() {
    let mut pair = TestPair::connect_with(
        ServerConfig {
            command_rate_limit: 4,
        },
        ClientConfig::default(),
    );
    let player = pair.spawn_player(Vec2::ZERO);

    let queue = pair.server.inbound_queue();
    for sequence in 1..=10 {
        queue.push((pair.user, right_command(sequence)));
    }
    pair.server.tick(&mut NoSimulation);

    let transform: &Transform = pair.server.world().component(player).unwrap();
    let expected = 4.0 * MOVE_SPEED * DT;
    assert!(
        (transform.position().x - expected).abs() < 1e-3,
        "got {}, expected exactly the capped {expected}",
        transform.position().x
    );
    assert_eq!(
        pair.server.user(pair.user).unwrap().last_processed_command(),
        4,
        "dropped commands stay unacknowledged so the client resends them"
    );
}

/// A component throttled to 2 updates per second at 20 Hz may only send
/// every 10 ticks; changes in between stay dirty and go out when the window
/// reopens, carrying the latest value.
#[test]
fn throttled_component_skips_ticks_between_sends() {
    let mut pair = TestPair::connect_custom(
        ServerConfig::default(),
        ClientConfig::default(),
        || {
            let mut protocol = statecast_shared::Protocol::builder();
            protocol
                .tick_interval(Duration::from_millis(50))
                .add_component::<Transform>(ReplicationPolicy {
                    max_updates_per_second: 2,
                    ..ReplicationPolicy::default()
                });
            protocol.build()
        },
    );
    pair.server.set_interest_policy(Box::new(FullInterest));

    let remote = pair.server.world_mut().create_entity();
    pair.server
        .add_component(remote, Box::new(Transform::default()))
        .unwrap();
    // tick 1 sends the create; tick 2 is quiet
    pair.step_n(idle(), 2);
    let local = pair.local_of(remote).expect("create replicated");

    // First change goes out immediately (tick 3) and starts the clock
    pair.server
        .world_mut()
        .component_mut::<Transform>(remote)
        .unwrap()
        .set_position(Vec2::new(10.0, 0.0));
    pair.step(idle());

    // A change right behind it must wait out the 10 tick interval
    pair.server
        .world_mut()
        .component_mut::<Transform>(remote)
        .unwrap()
        .set_position(Vec2::new(20.0, 0.0));
    pair.step_n(idle(), 9);

    let transform: &Transform = pair.client.world().component(local).unwrap();
    assert_eq!(
        transform.position().x,
        10.0,
        "the second change is still held back"
    );

    // Tick 13 reopens the window; the held pair sends its current value
    pair.step_n(idle(), 6);
    let transform: &Transform = pair.client.world().component(local).unwrap();
    assert_eq!(transform.position().x, 20.0);
}
