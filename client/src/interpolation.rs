use std::collections::HashMap;

use statecast_shared::{ComponentTypeId, Replicate};

/// Two samples of one remote component and the blend position between them.
/// `current` is where the component was when the newest authoritative sample
/// arrived; `target` is that sample. The live component is written by
/// [`advance`](InterpolationBuffer::advance) and glides toward `target`
/// instead of snapping, which hides the gap between discrete server ticks.
pub struct InterpolationBuffer {
    current: Box<dyn Replicate>,
    target: Box<dyn Replicate>,
    t: f32,
}

impl InterpolationBuffer {
    pub fn new(current: Box<dyn Replicate>, target: Box<dyn Replicate>) -> Self {
        Self {
            current,
            target,
            t: 0.0,
        }
    }

    /// Installs a fresh authoritative sample. The live value becomes the new
    /// starting point, so motion stays continuous even when samples arrive
    /// mid-glide.
    pub fn retarget(&mut self, live: &dyn Replicate, target: Box<dyn Replicate>) {
        self.current = live.clone_boxed();
        self.target = target;
        self.t = 0.0;
    }

    /// Moves the blend forward by `dt_fraction` (frame time over the
    /// interpolation window) and writes the blended value into `live`.
    pub fn advance(&mut self, live: &mut dyn Replicate, dt_fraction: f32) {
        self.t = (self.t + dt_fraction).min(1.0);
        live.interpolate_between(self.current.as_ref(), self.target.as_ref(), self.t);
    }

    /// Blend position in [0, 1]
    pub fn progress(&self) -> f32 {
        self.t
    }

    pub fn target(&self) -> &dyn Replicate {
        self.target.as_ref()
    }
}

/// Interpolation state for one remote entity, one buffer per replicated
/// component that has received at least one delta update.
#[derive(Default)]
pub struct EntityInterpolation {
    buffers: HashMap<ComponentTypeId, InterpolationBuffer>,
}

impl EntityInterpolation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retarget(
        &mut self,
        type_id: ComponentTypeId,
        live: &dyn Replicate,
        target: Box<dyn Replicate>,
    ) {
        match self.buffers.get_mut(&type_id) {
            Some(buffer) => buffer.retarget(live, target),
            None => {
                self.buffers
                    .insert(type_id, InterpolationBuffer::new(live.clone_boxed(), target));
            }
        }
    }

    pub fn buffers_mut(
        &mut self,
    ) -> impl Iterator<Item = (ComponentTypeId, &mut InterpolationBuffer)> {
        self.buffers.iter_mut().map(|(id, buffer)| (*id, buffer))
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}
