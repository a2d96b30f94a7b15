use std::path::{Path, PathBuf};

use image::imageops::flip_vertical_in_place;

use crate::error::RenderError;

/// Immutable description of one simulation instance.
///
/// The two bodies are opaque GLSL payloads; the renderer only guarantees the
/// uniform and texture surface they may rely on (see [`crate::compile`]).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationConfig {
    /// Body of the simulation-role program (advances the feedback state).
    pub simulation_body: String,
    /// Body of the shade-role program (turns state into visible color).
    pub shade_body: String,
    /// Optional image uploaded once into `noiseTexture`. Procedural noise is
    /// used when absent.
    pub static_texture: Option<PathBuf>,
    /// Upload the audio analyser's time-domain buffer into `spectrumTexture`.
    pub enable_audio: bool,
    /// Upload the latest decoded video frame into `videoTexture`.
    pub enable_video: bool,
}

impl SimulationConfig {
    pub fn new(simulation_body: impl Into<String>, shade_body: impl Into<String>) -> Self {
        Self {
            simulation_body: simulation_body.into(),
            shade_body: shade_body.into(),
            ..Self::default()
        }
    }
}

/// Adapter power preference requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Host configuration for the windowed simulation.
#[derive(Clone, Debug)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Optional FPS cap; `None` renders on every redraw.
    pub target_fps: Option<f32>,
    /// Adapter selection hint.
    pub gpu_power: GpuPowerPreference,
    /// Window title.
    pub title: String,
    pub simulation: SimulationConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            target_fps: None,
            gpu_power: GpuPowerPreference::default(),
            title: "pingshade".to_string(),
            simulation: SimulationConfig::default(),
        }
    }
}

/// Summary of the selected adapter, used for logging and pacing decisions.
#[derive(Debug, Clone)]
pub struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
    pub max_texture_dimension: u32,
}

impl AdapterProfile {
    pub fn from_wgpu(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
            max_texture_dimension: limits.max_texture_dimension_2d,
        }
    }

    /// True for CPU rasterisers such as llvmpipe or WARP.
    pub fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
            || self.name.to_ascii_lowercase().contains("llvmpipe")
    }
}

/// Texel layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Four 8-bit channels.
    Rgba8,
    /// One 8-bit channel.
    R8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::R8 => 1,
        }
    }

    pub(crate) fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            PixelFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
            PixelFormat::R8 => wgpu::TextureFormat::R8Unorm,
        }
    }
}

/// Rectangular block of texels ready for upload, rows ordered bottom to top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw texel data, returning `None` when the length does not match
    /// the dimensions.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel() as usize;
        if width == 0 || height == 0 || data.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn filled(width: u32, height: u32, format: PixelFormat, value: u8) -> Self {
        let len = width.max(1) as usize * height.max(1) as usize * format.bytes_per_pixel() as usize;
        Self {
            width: width.max(1),
            height: height.max(1),
            format,
            data: vec![value; len],
        }
    }

    /// Decodes an image file into RGBA8, flipped so the bottom row comes first.
    pub fn from_image_path(path: &Path) -> Result<Self, RenderError> {
        let image = image::open(path).map_err(|source| RenderError::StaticTexture {
            path: path.to_path_buf(),
            source,
        })?;
        let mut rgba = image.to_rgba8();
        flip_vertical_in_place(&mut rgba);
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            data: rgba.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.format.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_buffer_rejects_mismatched_lengths() {
        assert!(PixelBuffer::new(2, 2, PixelFormat::Rgba8, vec![0; 16]).is_some());
        assert!(PixelBuffer::new(2, 2, PixelFormat::Rgba8, vec![0; 15]).is_none());
        assert!(PixelBuffer::new(0, 2, PixelFormat::R8, Vec::new()).is_none());
    }

    #[test]
    fn image_loading_flips_rows_bottom_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripes.png");
        let mut image = image::RgbaImage::new(1, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        image.save(&path).unwrap();

        let buffer = PixelBuffer::from_image_path(&path).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (1, 2));
        assert_eq!(&buffer.data()[..4], &[0, 0, 255, 255]);
        assert_eq!(&buffer.data()[4..], &[255, 0, 0, 255]);
    }

    #[test]
    fn missing_image_reports_path() {
        let err = PixelBuffer::from_image_path(Path::new("/nonexistent/noise.png")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/noise.png"));
    }
}
