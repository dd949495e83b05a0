//! Interest management end to end: entities leaving a client's radius are
//! deleted exactly once, stay silent while out of scope, and come back as a
//! full create at their current state.

use statecast_client::{ClientEvent, FrameInput};
use statecast_server::RadiusInterest;
use statecast_shared::{math::Vec2, Transform};
use statecast_test::harness::TestPair;

const DT: f32 = 0.05;

fn idle() -> FrameInput {
    FrameInput {
        delta_time: DT,
        ..FrameInput::default()
    }
}

fn despawn_count(events: &[ClientEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, ClientEvent::DespawnedEntity { .. }))
        .count()
}

#[test]
fn leaving_the_radius_deletes_once_then_goes_silent() {
    let mut pair = TestPair::connect();
    pair.server
        .set_interest_policy(Box::new(RadiusInterest::new(100.0)));
    pair.spawn_player(Vec2::ZERO);

    let wanderer = pair.server.world_mut().create_entity();
    pair.server
        .add_component(
            wanderer,
            Box::new(Transform::new(Vec2::new(50.0, 0.0), Vec2::ZERO)),
        )
        .unwrap();

    pair.step_n(idle(), 2);
    assert!(pair.local_of(wanderer).is_some(), "in radius, replicated");
    pair.client.take_events();

    // Step out of range
    pair.server
        .world_mut()
        .component_mut::<Transform>(wanderer)
        .unwrap()
        .set_position(Vec2::new(500.0, 0.0));
    pair.step_n(idle(), 2);

    let events = pair.client.take_events();
    assert_eq!(despawn_count(&events), 1, "exactly one delete");
    assert!(pair.local_of(wanderer).is_none(), "mirror removed");

    // While out of scope, movement must produce no traffic about it
    for x in [510.0, 520.0, 530.0] {
        pair.server
            .world_mut()
            .component_mut::<Transform>(wanderer)
            .unwrap()
            .set_position(Vec2::new(x, 0.0));
        pair.step(idle());
    }
    let events = pair.client.take_events();
    assert_eq!(despawn_count(&events), 0, "no repeat deletes");
    assert!(pair.local_of(wanderer).is_none());
}

#[test]
fn reentering_the_radius_resends_the_full_entity() {
    let mut pair = TestPair::connect();
    pair.server
        .set_interest_policy(Box::new(RadiusInterest::new(100.0)));
    pair.spawn_player(Vec2::ZERO);

    let wanderer = pair.server.world_mut().create_entity();
    pair.server
        .add_component(
            wanderer,
            Box::new(Transform::new(Vec2::new(50.0, 0.0), Vec2::ZERO)),
        )
        .unwrap();
    pair.step_n(idle(), 2);

    // Out, then mutate while invisible, then back in
    pair.server
        .world_mut()
        .component_mut::<Transform>(wanderer)
        .unwrap()
        .set_position(Vec2::new(500.0, 0.0));
    pair.step_n(idle(), 2);
    assert!(pair.local_of(wanderer).is_none());
    pair.client.take_events();

    pair.server
        .world_mut()
        .component_mut::<Transform>(wanderer)
        .unwrap()
        .set_position(Vec2::new(75.0, 25.0));
    pair.step_n(idle(), 2);

    let local = pair.local_of(wanderer).expect("re-entry recreates the mirror");
    let events = pair.client.take_events();
    assert!(
        events
            .iter()
            .any(|event| matches!(event, ClientEvent::SpawnedEntity { server, .. } if *server == wanderer)),
        "re-entry arrives as a create"
    );
    let transform: &Transform = pair.client.world().component(local).unwrap();
    assert_eq!(
        transform.position(),
        Vec2::new(75.0, 25.0),
        "the create carries current state, not the state at departure"
    );
}
