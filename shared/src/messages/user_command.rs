use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::types::{CommandSeq, Tick};

/// A single input a player can hold down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Up = 1 << 0,
    Down = 1 << 1,
    Left = 1 << 2,
    Right = 1 << 3,
    Primary = 1 << 4,
    Secondary = 1 << 5,
}

/// Bitmask of simultaneously held [`Button`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonSet(u16);

impl ButtonSet {
    pub const EMPTY: ButtonSet = ButtonSet(0);

    pub fn with(self, button: Button) -> Self {
        ButtonSet(self.0 | button as u16)
    }

    pub fn insert(&mut self, button: Button) {
        self.0 |= button as u16;
    }

    pub fn remove(&mut self, button: Button) {
        self.0 &= !(button as u16);
    }

    pub fn contains(&self, button: Button) -> bool {
        self.0 & button as u16 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn from_bits(bits: u16) -> Self {
        ButtonSet(bits)
    }
}

impl Serde for ButtonSet {
    fn ser(&self, writer: &mut ByteWriter) {
        self.0.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(ButtonSet(u16::de(reader)?))
    }
}

/// One frame of player input, stamped with a client-assigned sequence
/// number so the server can report how far it has processed.
#[derive(Clone, Debug, PartialEq)]
pub struct UserCommand {
    /// Monotonically increasing per connection, starting at 1.
    pub sequence: CommandSeq,
    /// Seconds covered by this command, as measured on the client.
    pub delta_time: f32,
    /// Buttons held during the previous frame.
    pub previous_buttons: ButtonSet,
    /// Buttons held during this frame.
    pub buttons: ButtonSet,
    /// World tile the pointer rested on, in tile coordinates.
    pub pointed_tile_x: i32,
    pub pointed_tile_y: i32,
    /// Newest server tick the client had applied when it sampled input.
    pub last_received_server_tick: Tick,
}

impl UserCommand {
    /// True if `button` is held this frame.
    pub fn held(&self, button: Button) -> bool {
        self.buttons.contains(button)
    }

    /// True on the frame a button transitions from released to held.
    pub fn pressed(&self, button: Button) -> bool {
        self.buttons.contains(button) && !self.previous_buttons.contains(button)
    }

    /// True on the frame a button transitions from held to released.
    pub fn released(&self, button: Button) -> bool {
        !self.buttons.contains(button) && self.previous_buttons.contains(button)
    }
}

impl Serde for UserCommand {
    fn ser(&self, writer: &mut ByteWriter) {
        self.sequence.ser(writer);
        self.delta_time.ser(writer);
        self.previous_buttons.ser(writer);
        self.buttons.ser(writer);
        self.pointed_tile_x.ser(writer);
        self.pointed_tile_y.ser(writer);
        self.last_received_server_tick.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(UserCommand {
            sequence: CommandSeq::de(reader)?,
            delta_time: f32::de(reader)?,
            previous_buttons: ButtonSet::de(reader)?,
            buttons: ButtonSet::de(reader)?,
            pointed_tile_x: i32::de(reader)?,
            pointed_tile_y: i32::de(reader)?,
            last_received_server_tick: Tick::de(reader)?,
        })
    }
}
