use crate::{
    error::SerdeErr,
    reader_writer::{ByteReader, ByteWriter},
    serde::Serde,
};

// Unsigned integers

macro_rules! impl_serde_uint {
    ($type:ty) => {
        impl Serde for $type {
            fn ser(&self, writer: &mut ByteWriter) {
                writer.write_bytes(&self.to_le_bytes());
            }

            fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                const WIDTH: usize = std::mem::size_of::<$type>();
                let bytes = reader.read_bytes(WIDTH)?;
                let mut fixed = [0u8; WIDTH];
                fixed.copy_from_slice(bytes);
                Ok(<$type>::from_le_bytes(fixed))
            }
        }
    };
}

impl_serde_uint!(u8);
impl_serde_uint!(u16);
impl_serde_uint!(u32);
impl_serde_uint!(u64);

// Signed integers

macro_rules! impl_serde_int {
    ($type:ty) => {
        impl_serde_uint!($type);
    };
}

impl_serde_int!(i8);
impl_serde_int!(i16);
impl_serde_int!(i32);
impl_serde_int!(i64);

// Floats, encoded as their IEEE 754 bit patterns

impl Serde for f32 {
    fn ser(&self, writer: &mut ByteWriter) {
        self.to_bits().ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(f32::from_bits(u32::de(reader)?))
    }
}

impl Serde for f64 {
    fn ser(&self, writer: &mut ByteWriter) {
        self.to_bits().ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(f64::from_bits(u64::de(reader)?))
    }
}

// Bool, one byte, strictly 0 or 1

impl Serde for bool {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(SerdeErr::InvalidValue {
                type_name: "bool",
                value: u64::from(value),
            }),
        }
    }
}

// Byte buffers, length-prefixed with a u32

impl Serde for Vec<u8> {
    fn ser(&self, writer: &mut ByteWriter) {
        (self.len() as u32).ser(writer);
        writer.write_bytes(self);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let len = u32::de(reader)? as usize;
        Ok(reader.read_bytes(len)?.to_vec())
    }
}
