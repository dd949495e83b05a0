//! Packer properties: the payload never exceeds the cap, what is packed is
//! a prefix of what was offered, and every offered item ends up either
//! packed or deferred.

use proptest::prelude::*;

use statecast_server::{pack, Candidate};
use statecast_shared::{ComponentTypeId, EntityId};

#[derive(Clone, Debug)]
enum CandidateShape {
    Create { component_lengths: Vec<usize> },
    Update { length: usize, reliable: bool },
}

fn any_candidate() -> impl Strategy<Value = CandidateShape> {
    prop_oneof![
        proptest::collection::vec(0usize..200, 1..4)
            .prop_map(|component_lengths| CandidateShape::Create { component_lengths }),
        (0usize..200, any::<bool>())
            .prop_map(|(length, reliable)| CandidateShape::Update { length, reliable }),
    ]
}

fn build(shapes: &[CandidateShape]) -> Vec<Candidate> {
    shapes
        .iter()
        .enumerate()
        .map(|(index, shape)| {
            let entity = EntityId::new(index as u32);
            match shape {
                CandidateShape::Create { component_lengths } => Candidate::Create {
                    entity,
                    components: component_lengths
                        .iter()
                        .enumerate()
                        .map(|(tag, length)| (ComponentTypeId::new(tag as u16), vec![0u8; *length]))
                        .collect(),
                },
                CandidateShape::Update { length, reliable } => Candidate::Update {
                    entity,
                    type_id: ComponentTypeId::new(0),
                    bytes: vec![0u8; *length],
                    reliable: *reliable,
                },
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn payload_never_exceeds_the_cap(
        cap in 64usize..=1500,
        shapes in proptest::collection::vec(any_candidate(), 0..20),
        delete_count in 0usize..10,
    ) {
        let deletes = (0..delete_count)
            .map(|index| EntityId::new(1000 + index as u32))
            .collect();
        let packed = pack(0, 1, deletes, build(&shapes), cap);
        prop_assert!(
            packed.payload.len() <= cap,
            "payload {} over cap {cap}",
            packed.payload.len()
        );
    }

    #[test]
    fn packing_stops_at_the_first_overflow(
        cap in 64usize..=1500,
        shapes in proptest::collection::vec(any_candidate(), 0..20),
    ) {
        let packed = pack(0, 1, Vec::new(), build(&shapes), cap);

        // Whatever made it in is exactly the leading run of the candidate
        // list; ids were assigned in offer order, so packed ids must be
        // 0..packed_count.
        let packed_count = packed.packed_creates.len() + packed.packed_pairs.len();
        let mut packed_ids: Vec<u32> = packed
            .packed_creates
            .iter()
            .map(|entity| entity.to_u32())
            .chain(packed.packed_pairs.iter().map(|(entity, _)| entity.to_u32()))
            .collect();
        packed_ids.sort_unstable();
        let expected: Vec<u32> = (0..packed_count as u32).collect();
        prop_assert_eq!(packed_ids, expected);
    }

    #[test]
    fn every_candidate_is_packed_or_deferred(
        cap in 64usize..=1500,
        shapes in proptest::collection::vec(any_candidate(), 0..20),
        delete_count in 0usize..10,
    ) {
        let deletes: Vec<EntityId> = (0..delete_count)
            .map(|index| EntityId::new(1000 + index as u32))
            .collect();
        let packed = pack(0, 1, deletes.clone(), build(&shapes), cap);

        let creates = shapes
            .iter()
            .filter(|shape| matches!(shape, CandidateShape::Create { .. }))
            .count();
        let updates = shapes.len() - creates;
        prop_assert_eq!(
            packed.packed_creates.len() + packed.deferred_creates.len(),
            creates
        );
        prop_assert_eq!(
            packed.packed_pairs.len() + packed.deferred_pairs.len(),
            updates
        );
        prop_assert_eq!(
            packed.payload.is_empty(),
            false,
            "even an all-deferred tick still carries the header"
        );
        prop_assert!(packed.deferred_deletes.len() <= deletes.len());
    }
}
