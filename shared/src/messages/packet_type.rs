use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

/// Discriminator carried as the first byte of every packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketType {
    /// Server to client: deletes plus component creates/updates for one tick
    UpdateEntities = 1,
    /// Client to server: one frame of input
    UserCommand = 2,
    /// Server to client: a predicted spawn was matched by content hash
    AcknowledgeClientSideEntity = 3,
    /// Client to server: the hash binding was received
    AcknowledgeServerSideEntity = 4,
}

impl Serde for PacketType {
    fn ser(&self, writer: &mut ByteWriter) {
        writer.write_byte(*self as u8);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            1 => Ok(PacketType::UpdateEntities),
            2 => Ok(PacketType::UserCommand),
            3 => Ok(PacketType::AcknowledgeClientSideEntity),
            4 => Ok(PacketType::AcknowledgeServerSideEntity),
            value => Err(SerdeErr::InvalidValue {
                type_name: "PacketType",
                value: u64::from(value),
            }),
        }
    }
}
