use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::error::RenderError;
use crate::sources::SampleSource;
use crate::types::{PixelBuffer, PixelFormat};

/// One auxiliary texture and its sampler, reallocated when the incoming
/// sample changes size or format.
pub(crate) struct TextureSlot {
    label: &'static str,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    format: PixelFormat,
    uploads: u32,
}

impl TextureSlot {
    /// A 1x1 stand-in holding `fill` until the first real sample arrives.
    /// Creating it does not count as an upload.
    pub fn placeholder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &'static str,
        format: PixelFormat,
        fill: u8,
        address_mode: wgpu::AddressMode,
    ) -> Result<Self, RenderError> {
        let fill = PixelBuffer::filled(1, 1, format, fill);
        let texture = create_texture(device, queue, label, &fill)?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Ok(Self {
            label,
            texture,
            view,
            sampler,
            format,
            uploads: 0,
        })
    }

    /// Writes `buffer` into the texture, returning `true` when the texture had
    /// to be reallocated (callers must rebuild bind groups). On error the
    /// previous texture stays bound.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        buffer: &PixelBuffer,
    ) -> Result<bool, RenderError> {
        let size = self.texture.size();
        if size.width != buffer.width()
            || size.height != buffer.height()
            || self.format != buffer.format()
        {
            tracing::debug!(
                texture = self.label,
                width = buffer.width(),
                height = buffer.height(),
                format = ?buffer.format(),
                "reallocating input texture"
            );
            let texture = create_texture(device, queue, self.label, buffer)?;
            self.texture.destroy();
            self.texture = texture;
            self.view = self.texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.format = buffer.format();
            self.uploads = self.uploads.saturating_add(1);
            return Ok(true);
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            buffer.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(buffer.bytes_per_row()),
                rows_per_image: Some(buffer.height()),
            },
            size,
        );
        self.uploads = self.uploads.saturating_add(1);
        Ok(false)
    }

    pub fn upload_count(&self) -> u32 {
        self.uploads
    }
}

fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &'static str,
    buffer: &PixelBuffer,
) -> Result<wgpu::Texture, RenderError> {
    let max_dimension = device.limits().max_texture_dimension_2d;
    if buffer.width() > max_dimension || buffer.height() > max_dimension {
        return Err(RenderError::Allocation {
            what: label,
            width: buffer.width(),
            height: buffer.height(),
            diagnostic: format!("dimensions must be within 1..={max_dimension}"),
        });
    }

    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: buffer.width(),
                height: buffer.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: buffer.format().texture_format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        buffer.data(),
    );
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());

    if let Some(error) = validation.or(out_of_memory) {
        texture.destroy();
        return Err(RenderError::Allocation {
            what: label,
            width: buffer.width(),
            height: buffer.height(),
            diagnostic: error.to_string(),
        });
    }
    Ok(texture)
}

/// Binds a [`SampleSource`] to a [`TextureSlot`].
pub(crate) struct TextureAdapter {
    source: Option<Box<dyn SampleSource>>,
    slot: TextureSlot,
}

impl TextureAdapter {
    /// Without a source the slot keeps its placeholder forever.
    pub fn new(slot: TextureSlot, source: Option<Box<dyn SampleSource>>) -> Self {
        Self { source, slot }
    }

    /// Uploads the source's pending sample, if it has one. Returns `true` when
    /// the texture was reallocated.
    pub fn refresh(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<bool, RenderError> {
        let Some(source) = self.source.as_mut() else {
            return Ok(false);
        };
        match source.poll() {
            Some(buffer) => self.slot.upload(device, queue, buffer),
            None => Ok(false),
        }
    }

    /// Like [`refresh`](Self::refresh), but a sample that cannot be uploaded
    /// is logged and dropped.
    fn refresh_or_skip(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        self.refresh(device, queue).unwrap_or_else(|err| {
            tracing::warn!(
                texture = self.slot.label,
                error = %err,
                "skipping input sample; keeping previous texture"
            );
            false
        })
    }

    pub fn current_texture(&self) -> &wgpu::TextureView {
        &self.slot.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.slot.sampler
    }

    pub fn upload_count(&self) -> u32 {
        self.slot.upload_count()
    }
}

/// Number of texture uploads issued per auxiliary input since start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadCounts {
    pub noise: u32,
    pub video: u32,
    pub spectrum: u32,
}

/// The three auxiliary inputs bound at set 1.
pub(crate) struct InputTextures {
    pub noise: TextureAdapter,
    pub video: TextureAdapter,
    pub spectrum: TextureAdapter,
    pub bind_group: wgpu::BindGroup,
}

impl InputTextures {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        noise: TextureAdapter,
        video: TextureAdapter,
        spectrum: TextureAdapter,
    ) -> Self {
        let bind_group = build_bind_group(device, layout, [&noise, &video, &spectrum]);
        Self {
            noise,
            video,
            spectrum,
            bind_group,
        }
    }

    /// Refreshes every adapter, rebuilding the bind group if any texture was
    /// reallocated. Samples that fail to upload are skipped for this tick.
    pub fn refresh(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layout: &wgpu::BindGroupLayout) {
        let mut reallocated = self.noise.refresh_or_skip(device, queue);
        reallocated |= self.video.refresh_or_skip(device, queue);
        reallocated |= self.spectrum.refresh_or_skip(device, queue);
        if reallocated {
            self.bind_group =
                build_bind_group(device, layout, [&self.noise, &self.video, &self.spectrum]);
        }
    }

    pub fn upload_counts(&self) -> UploadCounts {
        UploadCounts {
            noise: self.noise.upload_count(),
            video: self.video.upload_count(),
            spectrum: self.spectrum.upload_count(),
        }
    }
}

fn build_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    adapters: [&TextureAdapter; 3],
) -> wgpu::BindGroup {
    let mut entries = Vec::with_capacity(adapters.len() * 2);
    for (index, adapter) in adapters.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2,
            resource: wgpu::BindingResource::TextureView(adapter.current_texture()),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2 + 1,
            resource: wgpu::BindingResource::Sampler(adapter.sampler()),
        });
    }
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("input texture bind group"),
        layout,
        entries: &entries,
    })
}
