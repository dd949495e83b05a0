use std::any::Any;

use log::warn;
use statecast_serde::{ByteReader, ByteWriter, Serde, SerdeErr};

use crate::{
    component::{
        dirty::{DirtyFlag, DirtyHandle},
        kinds::ComponentKind,
        replicate::Replicate,
    },
    math::{add, lerp, scale, Vec2},
    messages::user_command::{Button, UserCommand},
    world::template::SimContext,
};

/// Movement speed applied while a directional button is held, in world units
/// per second.
pub const MOVE_SPEED: f32 = 64.0;

/// Position and velocity of an entity in the world. The canonical replicated
/// component: movement input integrates into it deterministically, and remote
/// copies interpolate instead of snapping.
pub struct Transform {
    position: Vec2,
    velocity: Vec2,
    dirty: DirtyFlag,
}

impl Transform {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position,
            velocity,
            dirty: DirtyFlag::new(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Sets the position, marking the component dirty only if the value
    /// actually changed.
    pub fn set_position(&mut self, position: Vec2) {
        if position != self.position {
            self.position = position;
            self.dirty.mark();
        }
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        if velocity != self.velocity {
            self.velocity = velocity;
            self.dirty.mark();
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::ZERO)
    }
}

fn movement_direction(command: &UserCommand) -> Vec2 {
    let mut direction = Vec2::ZERO;
    if command.held(Button::Up) {
        direction.y -= 1.0;
    }
    if command.held(Button::Down) {
        direction.y += 1.0;
    }
    if command.held(Button::Left) {
        direction.x -= 1.0;
    }
    if command.held(Button::Right) {
        direction.x += 1.0;
    }

    let length = direction.length();
    if length > 0.0 {
        scale(direction, 1.0 / length)
    } else {
        Vec2::ZERO
    }
}

impl Replicate for Transform {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<Transform>()
    }

    fn name(&self) -> &'static str {
        "Transform"
    }

    fn write(&self, writer: &mut ByteWriter) {
        self.position.ser(writer);
        self.velocity.ser(writer);
    }

    fn read(&mut self, reader: &mut ByteReader) -> Result<(), SerdeErr> {
        self.position = Vec2::de(reader)?;
        self.velocity = Vec2::de(reader)?;
        Ok(())
    }

    fn clone_boxed(&self) -> Box<dyn Replicate> {
        Box::new(Self::new(self.position, self.velocity))
    }

    fn bind_dirty(&mut self, handle: DirtyHandle) {
        self.dirty.bind(handle);
    }

    fn unbind_dirty(&mut self) {
        self.dirty.unbind();
    }

    fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    fn apply_command(&mut self, command: &UserCommand, _context: &SimContext) {
        let velocity = scale(movement_direction(command), MOVE_SPEED);
        let position = add(self.position, scale(velocity, command.delta_time));
        self.set_velocity(velocity);
        self.set_position(position);
    }

    // Direct field writes: interpolation output is presentation state on a
    // remote mirror, not an authored change.
    fn interpolate_between(&mut self, from: &dyn Replicate, to: &dyn Replicate, t: f32) {
        let (Some(from), Some(to)) = (from.downcast_ref::<Self>(), to.downcast_ref::<Self>())
        else {
            warn!("Transform interpolation received samples of another component type");
            return;
        };
        self.position = lerp(from.position, to.position, t);
        self.velocity = lerp(from.velocity, to.velocity, t);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
