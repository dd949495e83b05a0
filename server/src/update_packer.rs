use log::warn;

use statecast_shared::{
    encode_packet, ComponentTypeId, ComponentUpdate, DirtyPair, EntityId, EntityUpdate,
    PacketType, UpdateEntitiesPacket, DELETE_ENTRY_BYTES, UPDATE_PACKET_BASE_BYTES,
};
use statecast_shared::types::{CommandSeq, Tick};

/// Wire overhead of one `EntityUpdate` before its component payloads:
/// entity id plus component count.
const ENTITY_UPDATE_BASE_BYTES: usize = 4 + 4;

/// Wire overhead of one component payload: type id plus byte-length prefix.
const COMPONENT_UPDATE_BASE_BYTES: usize = 2 + 4;

/// One candidate item for the outgoing packet, already serialized. Creates
/// carry an entity's full create-eligible component set and pack atomically;
/// updates carry a single dirty component.
pub enum Candidate {
    Create {
        entity: EntityId,
        components: Vec<(ComponentTypeId, Vec<u8>)>,
    },
    Update {
        entity: EntityId,
        type_id: ComponentTypeId,
        bytes: Vec<u8>,
        reliable: bool,
    },
}

impl Candidate {
    fn wire_cost(&self) -> usize {
        match self {
            Candidate::Create { components, .. } => {
                ENTITY_UPDATE_BASE_BYTES
                    + components
                        .iter()
                        .map(|(_, bytes)| COMPONENT_UPDATE_BASE_BYTES + bytes.len())
                        .sum::<usize>()
            }
            Candidate::Update { bytes, .. } => {
                ENTITY_UPDATE_BASE_BYTES + COMPONENT_UPDATE_BASE_BYTES + bytes.len()
            }
        }
    }
}

/// What one call to [`pack`] produced: the finished payload, what made it
/// in, and what has to wait for the next tick.
pub struct PackedTick {
    pub payload: Vec<u8>,
    /// Entities whose full create set was included; the connection's acked
    /// interest may advance past these.
    pub packed_creates: Vec<EntityId>,
    /// Dirty pairs included as single-component updates
    pub packed_pairs: Vec<DirtyPair>,
    pub deferred_creates: Vec<EntityId>,
    pub deferred_pairs: Vec<DirtyPair>,
    /// Delete ids that did not fit; they go back on the connection's queue
    pub deferred_deletes: Vec<EntityId>,
    /// True when the packet carries structural content (deletes, creates, or
    /// a reliable-policy component) and must travel on the reliable channel
    pub reliable: bool,
}

/// Greedily fills one `UpdateEntitiesPacket` up to `max_packet_bytes`:
/// deletes first, then candidates in the order given. Filling stops at the
/// first item that does not fit, so earlier-marked state is never starved by
/// later state; everything after that point is deferred to the next tick.
/// The returned payload never exceeds the cap.
pub fn pack(
    last_processed_command: CommandSeq,
    server_tick: Tick,
    deletes: Vec<EntityId>,
    candidates: Vec<Candidate>,
    max_packet_bytes: usize,
) -> PackedTick {
    let mut packet = UpdateEntitiesPacket::new(last_processed_command, server_tick);
    let mut used = UPDATE_PACKET_BASE_BYTES;
    let mut reliable = false;

    let mut packed_creates = Vec::new();
    let mut packed_pairs = Vec::new();
    let mut deferred_creates = Vec::new();
    let mut deferred_pairs = Vec::new();
    let mut deferred_deletes = Vec::new();

    let mut deletes = deletes.into_iter();
    for entity in deletes.by_ref() {
        if used + DELETE_ENTRY_BYTES > max_packet_bytes {
            deferred_deletes.push(entity);
            break;
        }
        used += DELETE_ENTRY_BYTES;
        packet.deleted_entities.push(entity);
    }
    deferred_deletes.extend(deletes);

    let mut candidates = candidates.into_iter();
    let mut open = deferred_deletes.is_empty();
    for candidate in candidates.by_ref() {
        let cost = candidate.wire_cost();
        if !open || used + cost > max_packet_bytes {
            if cost + UPDATE_PACKET_BASE_BYTES > max_packet_bytes {
                // This item can never fit on its own; without the warning it
                // would silently defer forever.
                warn!(
                    "update of {cost} bytes exceeds the {max_packet_bytes} byte packet budget \
                     and will never be sent"
                );
            }
            defer(candidate, &mut deferred_creates, &mut deferred_pairs);
            open = false;
            continue;
        }
        used += cost;
        match candidate {
            Candidate::Create { entity, components } => {
                packed_creates.push(entity);
                reliable = true;
                packet.updates.push(EntityUpdate {
                    entity,
                    components: components
                        .into_iter()
                        .map(|(type_id, bytes)| ComponentUpdate { type_id, bytes })
                        .collect(),
                });
            }
            Candidate::Update {
                entity,
                type_id,
                bytes,
                reliable: pair_reliable,
            } => {
                packed_pairs.push((entity, type_id));
                reliable |= pair_reliable;
                packet.updates.push(EntityUpdate {
                    entity,
                    components: vec![ComponentUpdate { type_id, bytes }],
                });
            }
        }
    }
    for candidate in candidates {
        defer(candidate, &mut deferred_creates, &mut deferred_pairs);
    }

    reliable |= !packet.deleted_entities.is_empty();

    PackedTick {
        payload: encode_packet(PacketType::UpdateEntities, &packet),
        packed_creates,
        packed_pairs,
        deferred_creates,
        deferred_pairs,
        deferred_deletes,
        reliable,
    }
}

fn defer(
    candidate: Candidate,
    deferred_creates: &mut Vec<EntityId>,
    deferred_pairs: &mut Vec<DirtyPair>,
) {
    match candidate {
        Candidate::Create { entity, .. } => deferred_creates.push(entity),
        Candidate::Update {
            entity, type_id, ..
        } => deferred_pairs.push((entity, type_id)),
    }
}
