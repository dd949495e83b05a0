//! # Statecast Serde
//! Byte-aligned, little-endian serialization shared by every statecast crate.
//! The same encoding is used for wire transfer, persistence, and content
//! hashing, so every field has a fixed width.

mod error;
mod impls;
mod reader_writer;
mod serde;

pub use error::SerdeErr;
pub use reader_writer::{ByteReader, ByteWriter};
pub use serde::Serde;
