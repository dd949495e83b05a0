pub mod entity_update;
pub mod packet_type;
pub mod spawn_acks;
pub mod update_packet;
pub mod user_command;

use statecast_serde::{ByteWriter, Serde};

use packet_type::PacketType;

/// Frames `message` as a complete packet: one [`PacketType`] byte followed
/// by the message body.
pub fn encode_packet<M: Serde>(packet_type: PacketType, message: &M) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    packet_type.ser(&mut writer);
    message.ser(&mut writer);
    writer.to_bytes()
}
