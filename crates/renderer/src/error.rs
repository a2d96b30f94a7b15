use std::path::PathBuf;

use crate::compile::ProgramRole;

/// Fatal setup failures for a simulation instance.
///
/// Everything here aborts [`FrameDriver::start`](crate::FrameDriver::start) or
/// GPU acquisition. Missing media samples never show up as errors; the
/// affected texture simply keeps its previous contents.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to parse {role} shader:\n{diagnostic}")]
    ShaderParse {
        role: ProgramRole,
        diagnostic: String,
    },
    #[error("{role} shader failed validation:\n{diagnostic}")]
    ShaderValidation {
        role: ProgramRole,
        diagnostic: String,
    },
    #[error("failed to create {role} pipeline: {diagnostic}")]
    Pipeline {
        role: ProgramRole,
        diagnostic: String,
    },
    #[error("failed to allocate {what} ({width}x{height}): {diagnostic}")]
    Allocation {
        what: &'static str,
        width: u32,
        height: u32,
        diagnostic: String,
    },
    #[error("adapter cannot render to or filter {format:?} feedback buffers")]
    UnsupportedFeedbackFormat { format: wgpu::TextureFormat },
    #[error("no suitable GPU adapter found: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to load static texture {path}: {source}")]
    StaticTexture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
