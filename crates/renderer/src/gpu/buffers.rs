use winit::dpi::PhysicalSize;

use crate::error::RenderError;

/// Texel format of the feedback render targets.
pub const FEEDBACK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;

/// Two slots with a movable read/write assignment.
///
/// `swap` only flips an index; the slots themselves never move.
#[derive(Debug)]
pub struct BufferPair<T> {
    slots: [T; 2],
    read: usize,
}

impl<T> BufferPair<T> {
    /// Slot `a` starts out as the read side.
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            read: 0,
        }
    }

    pub fn read(&self) -> &T {
        &self.slots[self.read]
    }

    pub fn write(&self) -> &T {
        &self.slots[1 - self.read]
    }

    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }

    /// Replaces both slots, resetting the read side to the first one.
    pub fn replace(&mut self, a: T, b: T) {
        self.slots = [a, b];
        self.read = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

/// One feedback render target plus the bind group that samples it.
pub(crate) struct FeedbackTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
}

/// The ping-pong pair of simulation state textures.
pub(crate) struct FeedbackBuffers {
    pair: BufferPair<FeedbackTarget>,
    sampler: wgpu::Sampler,
    size: PhysicalSize<u32>,
}

impl FeedbackBuffers {
    pub fn initialize(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        size: PhysicalSize<u32>,
    ) -> Result<Self, RenderError> {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("feedback sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let (a, b) = allocate_targets(device, layout, &sampler, size)?;
        tracing::debug!(
            width = size.width,
            height = size.height,
            "allocated feedback buffers"
        );
        Ok(Self {
            pair: BufferPair::new(a, b),
            sampler,
            size,
        })
    }

    /// Drops both targets and allocates fresh, zeroed ones at `size`.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        size: PhysicalSize<u32>,
    ) -> Result<(), RenderError> {
        let (a, b) = allocate_targets(device, layout, &self.sampler, size)?;
        for target in self.pair.iter() {
            target.texture.destroy();
        }
        self.pair.replace(a, b);
        tracing::debug!(
            old_width = self.size.width,
            old_height = self.size.height,
            width = size.width,
            height = size.height,
            "reallocated feedback buffers; simulation state reset"
        );
        self.size = size;
        Ok(())
    }

    pub fn swap(&mut self) {
        self.pair.swap();
    }

    pub fn read(&self) -> &FeedbackTarget {
        self.pair.read()
    }

    pub fn write(&self) -> &FeedbackTarget {
        self.pair.write()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }
}

fn allocate_targets(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    size: PhysicalSize<u32>,
) -> Result<(FeedbackTarget, FeedbackTarget), RenderError> {
    let max_dimension = device.limits().max_texture_dimension_2d;
    if size.width == 0 || size.height == 0 || size.width > max_dimension || size.height > max_dimension
    {
        return Err(RenderError::Allocation {
            what: "feedback buffers",
            width: size.width,
            height: size.height,
            diagnostic: format!("dimensions must be within 1..={max_dimension}"),
        });
    }

    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let a = create_target(device, layout, sampler, size, "feedback buffer a");
    let b = create_target(device, layout, sampler, size, "feedback buffer b");
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());

    if let Some(error) = validation.or(out_of_memory) {
        return Err(RenderError::Allocation {
            what: "feedback buffers",
            width: size.width,
            height: size.height,
            diagnostic: error.to_string(),
        });
    }
    Ok((a, b))
}

fn create_target(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    size: PhysicalSize<u32>,
    label: &str,
) -> FeedbackTarget {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FEEDBACK_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    FeedbackTarget {
        texture,
        view,
        bind_group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_twice_restores_roles() {
        let mut pair = BufferPair::new("front", "back");
        for _ in 0..5 {
            let (read, write) = (*pair.read(), *pair.write());
            pair.swap();
            assert_eq!(*pair.read(), write);
            assert_eq!(*pair.write(), read);
            pair.swap();
            assert_eq!(*pair.read(), read);
            assert_eq!(*pair.write(), write);
            pair.swap();
        }
    }

    #[test]
    fn read_and_write_are_always_distinct() {
        let mut pair = BufferPair::new(1, 2);
        for _ in 0..4 {
            assert_ne!(pair.read(), pair.write());
            pair.swap();
        }
    }

    #[test]
    fn replace_resets_read_side() {
        let mut pair = BufferPair::new(1, 2);
        pair.swap();
        assert_eq!((*pair.read(), *pair.write()), (2, 1));
        pair.replace(3, 4);
        assert_eq!((*pair.read(), *pair.write()), (3, 4));
    }
}
