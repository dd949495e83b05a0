use std::any::Any;

use log::warn;
use statecast_serde::{ByteReader, ByteWriter, SerdeErr};

use crate::{
    component::{dirty::DirtyHandle, kinds::ComponentKind},
    hash::ContentHash,
    messages::user_command::UserCommand,
    world::template::SimContext,
};

/// A replicable bag of state attached to an entity.
///
/// Implementations expose explicit setters that compare old and new values
/// and mark the component dirty only on an actual change; the wire layer
/// never inspects fields directly. The byte encoding produced by `write` is
/// the component's one canonical form, reused for updates, full creates, and
/// content hashing.
pub trait Replicate: Send + Sync + Any {
    /// Rust-side type identifier
    fn kind(&self) -> ComponentKind;

    /// Short type name, for diagnostics
    fn name(&self) -> &'static str;

    /// Serialize the component's replicated fields
    fn write(&self, writer: &mut ByteWriter);

    /// Overwrite the component's replicated fields from incoming bytes.
    /// Does not mark the component dirty.
    fn read(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr>;

    /// Value clone. The clone starts clean and unbound from any dirty log,
    /// so snapshots can be held without echoing into a store.
    fn clone_boxed(&self) -> Box<dyn Replicate>;

    // Dirty plumbing, wired up by the owning store

    fn bind_dirty(&mut self, handle: DirtyHandle);
    fn unbind_dirty(&mut self);
    fn is_dirty(&self) -> bool;
    fn clear_dirty(&mut self);

    /// Apply one tick of user input. Must be deterministic: same starting
    /// state and same command always produce the same result, on either
    /// host. Default: input does not affect this component.
    fn apply_command(&mut self, _command: &UserCommand, _context: &SimContext) {}

    /// Blend this component between two samples of itself. `t` runs from 0
    /// (at `from`) to 1 (at `to`). The default snaps to `to`, which is the
    /// right behavior for discrete state.
    fn interpolate_between(&mut self, _from: &dyn Replicate, to: &dyn Replicate, _t: f32) {
        let mut writer = ByteWriter::new();
        to.write(&mut writer);
        let bytes = writer.to_bytes();
        let mut reader = ByteReader::new(&bytes);
        if let Err(err) = self.read(&mut reader) {
            warn!("snap interpolation failed to decode {}: {err}", self.name());
        }
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Replicate {
    pub fn downcast_ref<C: Replicate>(&self) -> Option<&C> {
        self.as_any().downcast_ref::<C>()
    }

    pub fn downcast_mut<C: Replicate>(&mut self) -> Option<&mut C> {
        self.as_any_mut().downcast_mut::<C>()
    }

    /// Digest of the component's serialized form
    pub fn content_hash(&self) -> ContentHash {
        let mut writer = ByteWriter::new();
        self.write(&mut writer);
        ContentHash::of_bytes(writer.as_slice())
    }

    /// Copy another component's value into this one through the codec. Both
    /// components must be the same type.
    pub fn mirror(&mut self, other: &dyn Replicate) -> Result<(), SerdeErr> {
        let mut writer = ByteWriter::new();
        other.write(&mut writer);
        let bytes = writer.to_bytes();
        let mut reader = ByteReader::new(&bytes);
        self.read(&mut reader)
    }
}
