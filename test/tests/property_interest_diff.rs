//! Algebra of the interest diff: it partitions the change between two
//! interest sets with nothing invented and nothing lost.

use std::collections::HashSet;

use proptest::prelude::*;

use statecast_server::interest_diff;
use statecast_shared::EntityId;

fn entity_set() -> impl Strategy<Value = HashSet<EntityId>> {
    proptest::collection::hash_set(0u32..64, 0..32)
        .prop_map(|raw| raw.into_iter().map(EntityId::new).collect())
}

proptest! {
    #[test]
    fn diff_is_exactly_the_set_difference(
        prev in entity_set(),
        now in entity_set(),
    ) {
        let (newly_visible, no_longer_visible) = interest_diff(&prev, &now);

        let newly: HashSet<EntityId> = newly_visible.iter().copied().collect();
        let gone: HashSet<EntityId> = no_longer_visible.iter().copied().collect();

        prop_assert_eq!(&newly, &now.difference(&prev).copied().collect::<HashSet<_>>());
        prop_assert_eq!(&gone, &prev.difference(&now).copied().collect::<HashSet<_>>());
        prop_assert!(newly.is_disjoint(&gone));

        // No duplicates inside either half
        prop_assert_eq!(newly.len(), newly_visible.len());
        prop_assert_eq!(gone.len(), no_longer_visible.len());
    }

    #[test]
    fn diff_of_identical_sets_is_empty(set in entity_set()) {
        let (newly_visible, no_longer_visible) = interest_diff(&set, &set);
        prop_assert!(newly_visible.is_empty());
        prop_assert!(no_longer_visible.is_empty());
    }
}
