use std::hash::Hasher;

use siphasher::sip128::{Hasher128, SipHasher13};
use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

/// A 128-bit digest over serialized component state, used to correlate a
/// client-side predicted entity with the authoritative entity the server
/// created for it. Purely a function of the bytes, so both sides compute the
/// same value for the same state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContentHash(u128);

impl ContentHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        // Fixed zero key: this is a correlation digest, not a keyed MAC.
        let mut hasher = SipHasher13::new();
        hasher.write(bytes);
        Self(hasher.finish128().as_u128())
    }

    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

// On the wire the hash travels as two u64s, low half first.
impl Serde for ContentHash {
    fn ser(&self, writer: &mut ByteWriter) {
        (self.0 as u64).ser(writer);
        ((self.0 >> 64) as u64).ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let low = u64::de(reader)?;
        let high = u64::de(reader)?;
        Ok(Self(u128::from(low) | (u128::from(high) << 64)))
    }
}
