//! GPU side of the simulation harness.
//!
//! - `context` owns wgpu instance/device/surface wiring, windowed or headless.
//! - `buffers` holds the ping-pong feedback targets.
//! - `pipeline` compiles the simulation and shade programs against a shared
//!   three-group layout (frame uniforms, input textures, feedback).
//! - `channels` uploads auxiliary input samples into textures.
//! - `uniforms` mirrors the header's uniform block.
//! - `driver` sequences the two passes every tick.

mod buffers;
mod channels;
mod context;
mod driver;
mod pipeline;
mod uniforms;

pub use buffers::{BufferPair, FEEDBACK_FORMAT};
pub use channels::UploadCounts;
pub use context::HeadlessGpu;
pub use driver::{FrameDriver, MediaInputs, TickOutcome};
pub use uniforms::TIME_SCALE;

pub(crate) use context::GpuContext;
