use std::time::Duration;

use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::error::RenderError;
use crate::input::PointerState;
use crate::sources::{
    AudioAnalyser, SampleSource, SpectrumSource, StaticImage, VideoFeed, VideoSource,
};
use crate::types::{PixelFormat, SimulationConfig};

use super::buffers::FeedbackBuffers;
use super::channels::{InputTextures, TextureAdapter, TextureSlot, UploadCounts};
use super::pipeline::{PipelineLayouts, ProgramSet};
use super::uniforms::FrameUniforms;

/// Byte value of a zero audio sample; `spectrumTexture` holds it until the
/// first block arrives.
const SILENT_SAMPLE: u8 = 128;

/// External media collaborators handed to [`FrameDriver::start`].
///
/// A feed is only consulted when the matching flag in [`SimulationConfig`]
/// is set.
#[derive(Default)]
pub struct MediaInputs {
    pub video: Option<Box<dyn VideoFeed>>,
    pub audio: Option<Box<dyn AudioAnalyser>>,
}

/// What a call to [`FrameDriver::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Both passes were submitted; `frame_index` is the counter after the tick.
    Rendered { frame_index: u32 },
    /// The drawable had a zero dimension; nothing ran.
    Skipped,
}

/// Runs the simulation/shade pass pair once per tick.
///
/// The driver never schedules itself: the host calls [`tick`](Self::tick)
/// once per display refresh with the elapsed time since start-up.
pub struct FrameDriver {
    device: wgpu::Device,
    queue: wgpu::Queue,
    layouts: PipelineLayouts,
    programs: ProgramSet,
    buffers: FeedbackBuffers,
    inputs: InputTextures,
    uniforms: FrameUniforms,
    uniform_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    frame_index: u32,
}

impl FrameDriver {
    /// Compiles both programs, allocates the feedback buffers at `size`, and
    /// uploads the static texture. Any failure here is fatal for the instance.
    pub fn start(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output_format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        config: &SimulationConfig,
        media: MediaInputs,
    ) -> Result<Self, RenderError> {
        let layouts = PipelineLayouts::new(device);
        let programs = ProgramSet::build(
            device,
            &layouts,
            output_format,
            &config.simulation_body,
            &config.shade_body,
        )?;
        let buffers = FeedbackBuffers::initialize(device, &layouts.feedback_layout, size)?;

        let noise_source = StaticImage::load(config.static_texture.as_deref())?;
        let mut noise = TextureAdapter::new(
            TextureSlot::placeholder(
                device,
                queue,
                "noise texture",
                PixelFormat::Rgba8,
                0,
                wgpu::AddressMode::Repeat,
            )?,
            Some(Box::new(noise_source)),
        );
        noise.refresh(device, queue)?;

        let video = TextureAdapter::new(
            TextureSlot::placeholder(
                device,
                queue,
                "video texture",
                PixelFormat::Rgba8,
                0,
                wgpu::AddressMode::ClampToEdge,
            )?,
            video_source(config.enable_video, media.video),
        );
        let spectrum = TextureAdapter::new(
            TextureSlot::placeholder(
                device,
                queue,
                "spectrum texture",
                PixelFormat::R8,
                SILENT_SAMPLE,
                wgpu::AddressMode::ClampToEdge,
            )?,
            spectrum_source(config.enable_audio, media.audio),
        );
        let inputs = InputTextures::new(device, &layouts.inputs_layout, noise, video, spectrum);

        let uniforms = FrameUniforms::new(size);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame uniform bind group"),
            layout: &layouts.frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        tracing::info!(
            width = size.width,
            height = size.height,
            ?output_format,
            audio = config.enable_audio,
            video = config.enable_video,
            "simulation started"
        );

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            layouts,
            programs,
            buffers,
            inputs,
            uniforms,
            uniform_buffer,
            frame_bind_group,
            frame_index: 0,
        })
    }

    /// Advances the simulation by one frame and shades it into `target`.
    ///
    /// `drawable` is the size of `target`. A size change reallocates the
    /// feedback buffers (discarding state) before anything is drawn.
    pub fn tick(
        &mut self,
        elapsed: Duration,
        drawable: PhysicalSize<u32>,
        pointer: PointerState,
        target: &wgpu::TextureView,
    ) -> Result<TickOutcome, RenderError> {
        if drawable.width == 0 || drawable.height == 0 {
            return Ok(TickOutcome::Skipped);
        }

        if drawable != self.buffers.size() {
            self.buffers
                .resize(&self.device, &self.layouts.feedback_layout, drawable)?;
            self.uniforms.set_resolution(drawable);
        }

        self.inputs
            .refresh(&self.device, &self.queue, &self.layouts.inputs_layout);

        self.uniforms.update(elapsed, self.frame_index, pointer);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        self.draw(
            &mut encoder,
            "simulation pass",
            &self.programs.simulation,
            &self.buffers.write().view,
        );
        self.buffers.swap();
        self.frame_index = self.frame_index.saturating_add(1);
        self.draw(&mut encoder, "shade pass", &self.programs.shade, target);

        self.queue.submit(Some(encoder.finish()));
        Ok(TickOutcome::Rendered {
            frame_index: self.frame_index,
        })
    }

    /// Full-screen draw reading the current read-side feedback buffer.
    fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        pipeline: &wgpu::RenderPipeline,
        target: &wgpu::TextureView,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        pass.set_bind_group(1, &self.inputs.bind_group, &[]);
        pass.set_bind_group(2, &self.buffers.read().bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    /// Completed frames since start-up.
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    pub fn buffer_size(&self) -> PhysicalSize<u32> {
        self.buffers.size()
    }

    pub fn upload_counts(&self) -> UploadCounts {
        self.inputs.upload_counts()
    }
}

fn video_source(
    enabled: bool,
    feed: Option<Box<dyn VideoFeed>>,
) -> Option<Box<dyn SampleSource>> {
    match (enabled, feed) {
        (true, Some(feed)) => Some(Box::new(VideoSource::new(feed))),
        (true, None) => {
            tracing::warn!("video input enabled but no video feed was supplied");
            None
        }
        (false, _) => None,
    }
}

fn spectrum_source(
    enabled: bool,
    analyser: Option<Box<dyn AudioAnalyser>>,
) -> Option<Box<dyn SampleSource>> {
    match (enabled, analyser) {
        (true, Some(analyser)) => Some(Box::new(SpectrumSource::new(analyser))),
        (true, None) => {
            tracing::warn!("audio input enabled but no analyser was supplied");
            None
        }
        (false, _) => None,
    }
}
