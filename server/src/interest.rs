use std::collections::HashSet;

use statecast_shared::{
    math::distance_squared, EntityId, EntityStore, Transform,
};

/// Decides which entities a connection is currently told about. Evaluated
/// once per connection per tick against the live store; implementations only
/// read.
pub trait InterestPolicy: Send {
    fn interest_set(&self, world: &EntityStore, controlled: Option<EntityId>) -> HashSet<EntityId>;
}

/// Everything is interesting. Suits small worlds and tests.
pub struct FullInterest;

impl InterestPolicy for FullInterest {
    fn interest_set(
        &self,
        world: &EntityStore,
        _controlled: Option<EntityId>,
    ) -> HashSet<EntityId> {
        world.entity_ids().collect()
    }
}

/// Entities within `radius` world units of the connection's controlled
/// entity, plus every entity that has no position at all (global state like
/// scoreboards). A connection with no controlled entity, or one whose
/// controlled entity has no `Transform`, sees only position-less entities.
pub struct RadiusInterest {
    pub radius: f32,
}

impl RadiusInterest {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl InterestPolicy for RadiusInterest {
    fn interest_set(&self, world: &EntityStore, controlled: Option<EntityId>) -> HashSet<EntityId> {
        let center = controlled
            .and_then(|id| world.entity(id).ok())
            .and_then(|entity| entity.component_of::<Transform>())
            .map(|transform| transform.position());

        let radius_squared = self.radius * self.radius;
        world
            .entities_matching(move |entity| match entity.component_of::<Transform>() {
                None => true,
                Some(transform) => match center {
                    None => false,
                    Some(center) => {
                        distance_squared(center, transform.position()) <= radius_squared
                    }
                },
            })
            .map(|(id, _)| id)
            .collect()
    }
}

/// Splits two consecutive interest sets into the entities that entered and
/// the entities that left, each sorted by id so downstream packing order is
/// deterministic.
pub fn interest_diff(
    previous: &HashSet<EntityId>,
    current: &HashSet<EntityId>,
) -> (Vec<EntityId>, Vec<EntityId>) {
    let mut newly_visible: Vec<EntityId> = current.difference(previous).copied().collect();
    let mut no_longer_visible: Vec<EntityId> = previous.difference(current).copied().collect();
    newly_visible.sort_unstable();
    no_longer_visible.sort_unstable();
    (newly_visible, no_longer_visible)
}
