use std::collections::BTreeMap;

use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::component::{kinds::ComponentTypeId, replicate::Replicate};

/// Stable identifier for an entity. Server-side ids are authoritative and
/// never reused; the client keeps its own id space and translates through a
/// `LocalEntityMap`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn to_u32(self) -> u32 {
        self.0
    }
}

impl Serde for EntityId {
    fn ser(&self, writer: &mut ByteWriter) {
        self.0.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(u32::de(reader)?))
    }
}

/// An entity's component set, at most one component per type. Keyed by wire
/// tag so iteration order is deterministic across hosts; serialization,
/// hashing, and command application all rely on that ordering.
pub struct Entity {
    components: BTreeMap<ComponentTypeId, Box<dyn Replicate>>,
}

impl Entity {
    pub(crate) fn new() -> Self {
        Self {
            components: BTreeMap::new(),
        }
    }

    pub fn has(&self, type_id: ComponentTypeId) -> bool {
        self.components.contains_key(&type_id)
    }

    pub fn component_types(&self) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.components.keys().copied()
    }

    pub fn component(&self, type_id: ComponentTypeId) -> Option<&dyn Replicate> {
        self.components.get(&type_id).map(|boxed| boxed.as_ref())
    }

    pub fn component_of<C: Replicate>(&self) -> Option<&C> {
        self.components
            .values()
            .find_map(|boxed| boxed.as_ref().downcast_ref::<C>())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn component_mut(
        &mut self,
        type_id: ComponentTypeId,
    ) -> Option<&mut Box<dyn Replicate>> {
        self.components.get_mut(&type_id)
    }

    pub(crate) fn components_mut(
        &mut self,
    ) -> impl Iterator<Item = (ComponentTypeId, &mut Box<dyn Replicate>)> {
        self.components.iter_mut().map(|(id, boxed)| (*id, boxed))
    }

    pub(crate) fn components(
        &self,
    ) -> impl Iterator<Item = (ComponentTypeId, &Box<dyn Replicate>)> {
        self.components.iter().map(|(id, boxed)| (*id, boxed))
    }

    pub(crate) fn insert(&mut self, type_id: ComponentTypeId, component: Box<dyn Replicate>) {
        self.components.insert(type_id, component);
    }
}
