use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::hash::ContentHash;
use crate::world::entity::EntityId;

/// Server to client: the authoritative spawn whose content hash matched a
/// client-predicted entity, so the client can bind its local id to the
/// server's id instead of spawning a duplicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcknowledgeClientSideEntity {
    pub server_entity: EntityId,
    pub content_hash: ContentHash,
}

impl Serde for AcknowledgeClientSideEntity {
    fn ser(&self, writer: &mut ByteWriter) {
        self.server_entity.ser(writer);
        self.content_hash.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(AcknowledgeClientSideEntity {
            server_entity: EntityId::de(reader)?,
            content_hash: ContentHash::de(reader)?,
        })
    }
}

/// Client to server: confirms the binding above arrived, letting the server
/// drop its retry state for the hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcknowledgeServerSideEntity {
    pub server_entity: EntityId,
}

impl Serde for AcknowledgeServerSideEntity {
    fn ser(&self, writer: &mut ByteWriter) {
        self.server_entity.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(AcknowledgeServerSideEntity {
            server_entity: EntityId::de(reader)?,
        })
    }
}
