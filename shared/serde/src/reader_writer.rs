use crate::error::SerdeErr;

/// A growable byte buffer that values serialize themselves into.
pub struct ByteWriter {
    buffer: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_byte(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn to_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for ByteWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// A cursor over a received byte slice that values deserialize themselves
/// from. Reads past the end return `SerdeErr::UnexpectedEnd` instead of
/// panicking, since the bytes come off the network.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Number of bytes left to read
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        if self.cursor >= self.buffer.len() {
            return Err(SerdeErr::UnexpectedEnd {
                wanted: 1,
                remaining: 0,
            });
        }
        let byte = self.buffer[self.cursor];
        self.cursor += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'b [u8], SerdeErr> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(SerdeErr::UnexpectedEnd {
                wanted: len,
                remaining,
            });
        }
        let bytes = &self.buffer[self.cursor..self.cursor + len];
        self.cursor += len;
        Ok(bytes)
    }
}
