use crate::{error::SerdeErr, reader_writer::{ByteReader, ByteWriter}};

/// A type that can write itself to and read itself from a byte stream.
/// Encodings are little-endian with a fixed width per field, so a value's
/// encoded size never depends on its contents (length-prefixed buffers
/// excepted).
pub trait Serde: Sized {
    /// Serialize the value into the writer
    fn ser(&self, writer: &mut ByteWriter);

    /// Deserialize a value from the reader
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;
}
