//! External sample sources feeding the auxiliary textures.
//!
//! A source hands out a [`PixelBuffer`] when it has something worth uploading
//! and `None` otherwise. Sources never block and never fail; a missing sample
//! means the texture keeps whatever it showed last.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::RenderError;
use crate::types::{PixelBuffer, PixelFormat};

/// Length of the audio time-domain buffer, and width of `spectrumTexture`.
pub const AUDIO_SAMPLE_COUNT: usize = 1024;

/// Edge length of the procedural noise texture.
pub const NOISE_TEXTURE_SIZE: u32 = 256;

const NOISE_SEED: u64 = 0x5eed_0f_5ade;

/// Something that can produce texel data for one texture.
pub trait SampleSource {
    /// Returns the sample to upload this tick, if any.
    fn poll(&mut self) -> Option<&PixelBuffer>;
}

/// A single image delivered once and never again.
#[derive(Debug)]
pub struct StaticImage {
    buffer: PixelBuffer,
    delivered: bool,
}

impl StaticImage {
    pub fn new(buffer: PixelBuffer) -> Self {
        Self {
            buffer,
            delivered: false,
        }
    }

    /// Loads `path` when given, otherwise generates procedural noise.
    pub fn load(path: Option<&Path>) -> Result<Self, RenderError> {
        match path {
            Some(path) => {
                let buffer = PixelBuffer::from_image_path(path)?;
                tracing::debug!(
                    path = %path.display(),
                    width = buffer.width(),
                    height = buffer.height(),
                    "loaded static texture"
                );
                Ok(Self::new(buffer))
            }
            None => Ok(Self::procedural(NOISE_SEED)),
        }
    }

    /// Uniform RGBA noise from a seeded generator.
    pub fn procedural(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let len = (NOISE_TEXTURE_SIZE * NOISE_TEXTURE_SIZE * 4) as usize;
        let mut data = vec![0u8; len];
        rng.fill(data.as_mut_slice());
        let buffer = PixelBuffer::new(NOISE_TEXTURE_SIZE, NOISE_TEXTURE_SIZE, PixelFormat::Rgba8, data)
            .unwrap_or_else(|| {
                PixelBuffer::filled(NOISE_TEXTURE_SIZE, NOISE_TEXTURE_SIZE, PixelFormat::Rgba8, 0)
            });
        Self::new(buffer)
    }
}

impl SampleSource for StaticImage {
    fn poll(&mut self) -> Option<&PixelBuffer> {
        if self.delivered {
            return None;
        }
        self.delivered = true;
        Some(&self.buffer)
    }
}

/// What a video player reports about its own progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub playing: bool,
    /// Playback time has moved since the player started.
    pub time_advanced: bool,
}

/// A video decode/playback service.
pub trait VideoFeed {
    fn status(&mut self) -> PlaybackStatus;
    /// The most recently decoded frame, if any frame was decoded yet.
    fn latest_frame(&mut self) -> Option<&PixelBuffer>;
}

/// Uploads the current video frame on every tick once playback is ready.
pub struct VideoSource {
    feed: Box<dyn VideoFeed>,
    ready: bool,
}

impl VideoSource {
    pub fn new(feed: Box<dyn VideoFeed>) -> Self {
        Self { feed, ready: false }
    }
}

impl SampleSource for VideoSource {
    fn poll(&mut self) -> Option<&PixelBuffer> {
        if !self.ready {
            let status = self.feed.status();
            if !(status.playing && status.time_advanced) {
                return None;
            }
            self.ready = true;
            tracing::debug!("video feed ready");
        }
        self.feed.latest_frame()
    }
}

/// An audio analysis service.
pub trait AudioAnalyser {
    /// Fills `out` with the latest time-domain samples in `-1.0..=1.0`.
    /// Returns `false` when no samples have arrived yet.
    fn fill_time_domain(&mut self, out: &mut [f32]) -> bool;
}

/// Packs the analyser's time-domain buffer into one row of 8-bit texels.
pub struct SpectrumSource {
    analyser: Box<dyn AudioAnalyser>,
    samples: Vec<f32>,
    buffer: PixelBuffer,
}

impl SpectrumSource {
    pub fn new(analyser: Box<dyn AudioAnalyser>) -> Self {
        Self {
            analyser,
            samples: vec![0.0; AUDIO_SAMPLE_COUNT],
            buffer: PixelBuffer::filled(AUDIO_SAMPLE_COUNT as u32, 1, PixelFormat::R8, 128),
        }
    }
}

impl SampleSource for SpectrumSource {
    fn poll(&mut self) -> Option<&PixelBuffer> {
        if !self.analyser.fill_time_domain(&mut self.samples) {
            tracing::trace!("no audio samples available");
            return None;
        }
        for (texel, sample) in self.buffer.data_mut().iter_mut().zip(&self.samples) {
            *texel = sample_to_byte(*sample);
        }
        Some(&self.buffer)
    }
}

/// Maps a `-1.0..=1.0` sample to the byte range, 0.0 landing on 127/128.
pub(crate) fn sample_to_byte(sample: f32) -> u8 {
    ((sample.clamp(-1.0, 1.0) * 0.5 + 0.5) * 255.0).round() as u8
}
