//! Predicted spawns: the client creates the entity immediately, the server
//! acknowledges by content hash, and the two ids end up bound without ever
//! duplicating the entity on the client.

use std::time::Instant;

use statecast_client::{ClientEvent, FrameInput};
use statecast_server::ServerEvent;
use statecast_shared::{math::Vec2, Transform};
use statecast_test::harness::TestPair;

const DT: f32 = 0.05;

fn idle() -> FrameInput {
    FrameInput {
        delta_time: DT,
        ..FrameInput::default()
    }
}

#[test]
fn predicted_spawn_binds_by_content_hash_without_duplicating() {
    let mut pair = TestPair::connect();
    pair.spawn_player(Vec2::ZERO);
    pair.step_n(idle(), 2);
    pair.client.take_events();
    pair.server.take_events();

    // The client fires: it sees its projectile this frame
    let projectile_state = Transform::new(Vec2::new(5.0, 5.0), Vec2::ZERO);
    let predicted = pair
        .client
        .predict_spawn(vec![Box::new(projectile_state)], Instant::now())
        .unwrap();
    assert_eq!(pair.client.pending_spawn_count(), 1);

    // The server creates the authoritative twin and acknowledges. Both sides
    // serialize Transform(5, 5) identically, so the hashes match.
    let authoritative = pair.server.world_mut().create_entity();
    pair.server
        .add_component(
            authoritative,
            Box::new(Transform::new(Vec2::new(5.0, 5.0), Vec2::ZERO)),
        )
        .unwrap();
    pair.server.send_spawn_ack(pair.user, authoritative).unwrap();

    // Client frame drains the acknowledgement; the server tick then drains
    // the client's confirmation.
    pair.step(idle());

    assert_eq!(pair.client.pending_spawn_count(), 0);
    assert_eq!(pair.local_of(authoritative), Some(predicted), "ids bound");
    let client_events = pair.client.take_events();
    assert!(client_events
        .iter()
        .any(|event| matches!(
            event,
            ClientEvent::SpawnAcknowledged { server, local }
                if *server == authoritative && *local == predicted
        )));
    let server_events = pair.server.take_events();
    assert!(server_events
        .iter()
        .any(|event| matches!(
            event,
            ServerEvent::SpawnConfirmed { user, entity }
                if *user == pair.user && *entity == authoritative
        )));

    // The authoritative create that replicates next lands on the bound
    // mirror instead of spawning a second projectile.
    pair.step_n(idle(), 2);
    let client_events = pair.client.take_events();
    assert!(
        !client_events
            .iter()
            .any(|event| matches!(
                event,
                ClientEvent::SpawnedEntity { server, .. } if *server == authoritative
            )),
        "no duplicate mirror for the acknowledged entity"
    );
    assert_eq!(
        pair.client.world().len(),
        2,
        "player mirror and projectile only"
    );
}

#[test]
fn unmatched_acknowledgement_hash_is_ignored() {
    let mut pair = TestPair::connect();
    pair.spawn_player(Vec2::ZERO);
    pair.step_n(idle(), 2);

    let predicted = pair
        .client
        .predict_spawn(
            vec![Box::new(Transform::new(Vec2::new(5.0, 5.0), Vec2::ZERO))],
            Instant::now(),
        )
        .unwrap();

    // Server acknowledges an entity with different content
    let other = pair.server.world_mut().create_entity();
    pair.server
        .add_component(
            other,
            Box::new(Transform::new(Vec2::new(-40.0, 3.0), Vec2::ZERO)),
        )
        .unwrap();
    pair.server.send_spawn_ack(pair.user, other).unwrap();

    pair.step(idle());

    assert_eq!(
        pair.client.pending_spawn_count(),
        1,
        "prediction still waiting for a matching acknowledgement"
    );
    assert_ne!(pair.local_of(other), Some(predicted));
}
