use std::time::Duration;

use bytemuck::{Pod, Zeroable};
use winit::dpi::PhysicalSize;

use crate::input::PointerState;

/// Multiplier applied to elapsed wall-clock seconds before they reach `time`.
pub const TIME_SCALE: f32 = 1.5;

/// CPU mirror of the `FrameParams` block declared by the shader header.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FrameUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub frame_index: i32,
    pub pointer: [f32; 3],
    pub padding: f32,
}

unsafe impl Zeroable for FrameUniforms {}
unsafe impl Pod for FrameUniforms {}

impl FrameUniforms {
    pub fn new(size: PhysicalSize<u32>) -> Self {
        Self {
            resolution: [size.width as f32, size.height as f32],
            time: 0.0,
            frame_index: 0,
            pointer: [0.0; 3],
            padding: 0.0,
        }
    }

    pub fn set_resolution(&mut self, size: PhysicalSize<u32>) {
        self.resolution = [size.width as f32, size.height as f32];
    }

    /// Rebuilds the per-tick values. Pointer y is flipped to a bottom-left
    /// origin against the current drawable height.
    pub fn update(&mut self, elapsed: Duration, frame_index: u32, pointer: PointerState) {
        self.time = scaled_time(elapsed);
        self.frame_index = frame_index.min(i32::MAX as u32) as i32;
        self.pointer = pointer.as_uniform(self.resolution[1]);
    }
}

pub(crate) fn scaled_time(elapsed: Duration) -> f32 {
    elapsed.as_secs_f32() * TIME_SCALE
}
