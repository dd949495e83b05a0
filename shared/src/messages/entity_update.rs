use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::component::kinds::ComponentTypeId;
use crate::world::entity::EntityId;

/// The serialized state of one component, tagged with its registration id.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentUpdate {
    pub type_id: ComponentTypeId,
    pub bytes: Vec<u8>,
}

impl Serde for ComponentUpdate {
    fn ser(&self, writer: &mut ByteWriter) {
        self.type_id.ser(writer);
        self.bytes.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(ComponentUpdate {
            type_id: ComponentTypeId::de(reader)?,
            bytes: Vec::<u8>::de(reader)?,
        })
    }
}

/// One or more component payloads addressed to a single entity.
///
/// A creation carries every create-eligible component of the entity in one
/// update; a change carries exactly one component. A packet may therefore
/// hold several updates for the same entity id.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityUpdate {
    pub entity: EntityId,
    pub components: Vec<ComponentUpdate>,
}

impl Serde for EntityUpdate {
    fn ser(&self, writer: &mut ByteWriter) {
        self.entity.ser(writer);
        let count = self.components.len() as u32;
        count.ser(writer);
        for component in &self.components {
            component.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let entity = EntityId::de(reader)?;
        let count = u32::de(reader)?;
        let mut components = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            components.push(ComponentUpdate::de(reader)?);
        }
        Ok(EntityUpdate { entity, components })
    }
}
