use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::types::{CommandSeq, Tick};
use crate::world::entity::EntityId;

use super::entity_update::EntityUpdate;

/// Fixed cost of an [`UpdateEntitiesPacket`] before any deletes or updates:
/// packet type byte, last processed command, server tick, and both counts.
pub const UPDATE_PACKET_BASE_BYTES: usize = 1 + 4 + 4 + 4 + 4;

/// Wire cost of one entity id in the delete list.
pub const DELETE_ENTRY_BYTES: usize = 4;

/// The server-to-client payload for one tick: which entities vanished from
/// the client's interest set, and fresh component state for the rest.
///
/// Sent every tick even when both lists are empty, so the client always
/// learns the newest `last_processed_command`.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateEntitiesPacket {
    /// Highest command sequence the server has applied for this client.
    pub last_processed_command: CommandSeq,
    /// The tick this packet describes.
    pub server_tick: Tick,
    pub deleted_entities: Vec<EntityId>,
    pub updates: Vec<EntityUpdate>,
}

impl UpdateEntitiesPacket {
    pub fn new(last_processed_command: CommandSeq, server_tick: Tick) -> Self {
        UpdateEntitiesPacket {
            last_processed_command,
            server_tick,
            deleted_entities: Vec::new(),
            updates: Vec::new(),
        }
    }

    pub fn is_heartbeat(&self) -> bool {
        self.deleted_entities.is_empty() && self.updates.is_empty()
    }
}

impl Serde for UpdateEntitiesPacket {
    fn ser(&self, writer: &mut ByteWriter) {
        self.last_processed_command.ser(writer);
        self.server_tick.ser(writer);
        let delete_count = self.deleted_entities.len() as u32;
        delete_count.ser(writer);
        for entity in &self.deleted_entities {
            entity.ser(writer);
        }
        let update_count = self.updates.len() as u32;
        update_count.ser(writer);
        for update in &self.updates {
            update.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let last_processed_command = CommandSeq::de(reader)?;
        let server_tick = Tick::de(reader)?;
        let delete_count = u32::de(reader)?;
        let mut deleted_entities = Vec::with_capacity(delete_count.min(1024) as usize);
        for _ in 0..delete_count {
            deleted_entities.push(EntityId::de(reader)?);
        }
        let update_count = u32::de(reader)?;
        let mut updates = Vec::with_capacity(update_count.min(1024) as usize);
        for _ in 0..update_count {
            updates.push(EntityUpdate::de(reader)?);
        }
        Ok(UpdateEntitiesPacket {
            last_processed_command,
            server_tick,
            deleted_entities,
            updates,
        })
    }
}
