//! The protocol the integration tests speak: `Transform` from the shared
//! crate plus two purpose-built components. Server and client must build it
//! identically, so both call [`test_protocol`].

use std::any::Any;
use std::time::Duration;

use statecast_shared::{
    component::dirty::{DirtyFlag, DirtyHandle},
    ByteReader, ByteWriter, ComponentKind, Protocol, Replicate, ReplicationPolicy, Serde,
    SerdeErr, Transform,
};

/// Hit points. Replicates on change over the reliable channel; dying to a
/// dropped packet would be a structural loss.
pub struct Health {
    current: i32,
    maximum: i32,
    dirty: DirtyFlag,
}

impl Health {
    pub fn new(current: i32, maximum: i32) -> Self {
        Self {
            current,
            maximum,
            dirty: DirtyFlag::new(),
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn maximum(&self) -> i32 {
        self.maximum
    }

    pub fn set_current(&mut self, current: i32) {
        if current != self.current {
            self.current = current;
            self.dirty.mark();
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100, 100)
    }
}

impl Replicate for Health {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<Health>()
    }

    fn name(&self) -> &'static str {
        "Health"
    }

    fn write(&self, writer: &mut ByteWriter) {
        self.current.ser(writer);
        self.maximum.ser(writer);
    }

    fn read(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        self.current = i32::de(reader)?;
        self.maximum = i32::de(reader)?;
        Ok(())
    }

    fn clone_boxed(&self) -> Box<dyn Replicate> {
        Box::new(Self::new(self.current, self.maximum))
    }

    fn bind_dirty(&mut self, handle: DirtyHandle) {
        self.dirty.bind(handle);
    }

    fn unbind_dirty(&mut self) {
        self.dirty.unbind();
    }

    fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Server-internal counter. Registered with `send_on_update = false`, so
/// however often it changes, clients only ever see the value it had when the
/// entity entered their scope.
pub struct ServerCounter {
    value: u32,
    dirty: DirtyFlag,
}

impl ServerCounter {
    pub fn new(value: u32) -> Self {
        Self {
            value,
            dirty: DirtyFlag::new(),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn set_value(&mut self, value: u32) {
        if value != self.value {
            self.value = value;
            self.dirty.mark();
        }
    }
}

impl Default for ServerCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Replicate for ServerCounter {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<ServerCounter>()
    }

    fn name(&self) -> &'static str {
        "ServerCounter"
    }

    fn write(&self, writer: &mut ByteWriter) {
        self.value.ser(writer);
    }

    fn read(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        self.value = u32::de(reader)?;
        Ok(())
    }

    fn clone_boxed(&self) -> Box<dyn Replicate> {
        Box::new(Self::new(self.value))
    }

    fn bind_dirty(&mut self, handle: DirtyHandle) {
        self.dirty.bind(handle);
    }

    fn unbind_dirty(&mut self) {
        self.dirty.unbind();
    }

    fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 20 Hz, 1200 byte packets, three component types. Registration order
/// defines wire tags, so every host in a test builds exactly this.
pub fn test_protocol() -> Protocol {
    let mut protocol = Protocol::builder();
    protocol
        .tick_interval(Duration::from_millis(50))
        .max_packet_bytes(1200)
        .add_component::<Transform>(ReplicationPolicy::default())
        .add_component::<Health>(ReplicationPolicy {
            reliable: true,
            ..ReplicationPolicy::default()
        })
        .add_component::<ServerCounter>(ReplicationPolicy {
            send_on_update: false,
            ..ReplicationPolicy::default()
        });
    protocol.build()
}
