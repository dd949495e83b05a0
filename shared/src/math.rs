use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

/// A plain 2D value vector. Deliberately has no arithmetic methods of its
/// own; combine values with the free functions below.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Serde for Vec2 {
    fn ser(&self, writer: &mut ByteWriter) {
        self.x.ser(writer);
        self.y.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            x: f32::de(reader)?,
            y: f32::de(reader)?,
        })
    }
}

pub fn add(a: Vec2, b: Vec2) -> Vec2 {
    Vec2::new(a.x + b.x, a.y + b.y)
}

pub fn scale(v: Vec2, factor: f32) -> Vec2 {
    Vec2::new(v.x * factor, v.y * factor)
}

pub fn distance_squared(a: Vec2, b: Vec2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dx * dx + dy * dy
}

/// Linear blend from `from` to `to`. `t` is clamped to [0, 1], so this never
/// extrapolates.
pub fn lerp(from: Vec2, to: Vec2, t: f32) -> Vec2 {
    let t = t.clamp(0.0, 1.0);
    Vec2::new(
        from.x + (to.x - from.x) * t,
        from.y + (to.y - from.y) * t,
    )
}
