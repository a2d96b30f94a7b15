//! Renderer crate for pingshade, a double-buffered feedback shader harness.
//!
//! A simulation is a pair of GLSL bodies. Every tick the simulation body reads
//! the previous state from one half-float buffer and writes the next state into
//! the other; the buffers swap and the shade body turns the fresh state into
//! visible color. The flow is:
//!
//! ```text
//!   CLI / pingshade
//!          │ RendererConfig + MediaInputs
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ FrameDriver::tick()
//!                          │                    ├─▶ resize feedback buffers
//!                          │                    ├─▶ refresh input textures
//!                          │                    ├─▶ simulation pass ─▶ swap
//!                          ▼                    └─▶ shade pass ─▶ surface
//!                  InteractionTracker
//! ```
//!
//! [`FrameDriver`] does not depend on a window; tests and embedders can drive
//! it against any render target with synthetic elapsed times (see
//! [`HeadlessGpu`]). Shader authors should read the [`compile`] module docs for
//! the names available to bodies.

pub mod compile;
mod error;
mod gpu;
pub mod input;
pub mod media;
mod runtime;
pub mod sources;
mod types;
mod window;

use anyhow::Result;

pub use compile::{compose_fragment, validate_program, ProgramRole};
pub use error::RenderError;
pub use gpu::{
    BufferPair, FrameDriver, HeadlessGpu, MediaInputs, TickOutcome, UploadCounts,
    FEEDBACK_FORMAT, TIME_SCALE,
};
pub use input::{InteractionTracker, PointerState, SurfaceGeometry};
pub use runtime::{FrameScheduler, SimulationClock};
pub use types::{
    AdapterProfile, GpuPowerPreference, PixelBuffer, PixelFormat, RendererConfig,
    SimulationConfig,
};

/// Entry point for the interactive window.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the window and blocks until it is closed or the simulation fails.
    pub fn run(self, media: MediaInputs) -> Result<()> {
        window::run_window(self.config, media)
    }
}
