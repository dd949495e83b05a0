use std::any::TypeId;

use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

/// Rust-side identifier for a component type. Only meaningful within one
/// process; never sent over the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentKind(TypeId);

impl ComponentKind {
    pub fn of<C: 'static>() -> Self {
        Self(TypeId::of::<C>())
    }
}

/// Stable wire tag for a component type, assigned in registration order. Both
/// sides must register the same components in the same order for these to
/// agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(u16);

impl ComponentTypeId {
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    pub fn to_u16(self) -> u16 {
        self.0
    }
}

impl Serde for ComponentTypeId {
    fn ser(&self, writer: &mut ByteWriter) {
        self.0.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(u16::de(reader)?))
    }
}
