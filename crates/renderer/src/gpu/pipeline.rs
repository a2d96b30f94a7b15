use crate::compile::{compile_fragment_shader, compile_vertex_shader, ProgramRole};
use crate::error::RenderError;

use super::buffers::FEEDBACK_FORMAT;

/// Number of auxiliary input textures in set 1 (noise, video, spectrum).
pub(crate) const INPUT_TEXTURE_COUNT: u32 = 3;

pub(crate) struct PipelineLayouts {
    pub frame_layout: wgpu::BindGroupLayout,
    pub inputs_layout: wgpu::BindGroupLayout,
    pub feedback_layout: wgpu::BindGroupLayout,
    pub vertex_module: wgpu::ShaderModule,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let inputs_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("input texture layout"),
            entries: &texture_layout_entries(INPUT_TEXTURE_COUNT),
        });
        let feedback_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("feedback layout"),
            entries: &texture_layout_entries(1),
        });

        Self {
            frame_layout,
            inputs_layout,
            feedback_layout,
            vertex_module: compile_vertex_shader(device),
        }
    }
}

/// The compiled simulation and shade pipelines.
///
/// Both share one layout; uniform values and textures are rebound per draw.
pub(crate) struct ProgramSet {
    pub simulation: wgpu::RenderPipeline,
    pub shade: wgpu::RenderPipeline,
}

impl ProgramSet {
    pub fn build(
        device: &wgpu::Device,
        layouts: &PipelineLayouts,
        output_format: wgpu::TextureFormat,
        simulation_body: &str,
        shade_body: &str,
    ) -> Result<Self, RenderError> {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("simulation pipeline layout"),
            bind_group_layouts: &[
                &layouts.frame_layout,
                &layouts.inputs_layout,
                &layouts.feedback_layout,
            ],
            push_constant_ranges: &[],
        });

        let simulation = build_pipeline(
            device,
            layouts,
            &pipeline_layout,
            ProgramRole::Simulation,
            simulation_body,
            FEEDBACK_FORMAT,
        )?;
        let shade = build_pipeline(
            device,
            layouts,
            &pipeline_layout,
            ProgramRole::Shade,
            shade_body,
            output_format,
        )?;
        tracing::debug!(?output_format, "built simulation and shade pipelines");

        Ok(Self { simulation, shade })
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    pipeline_layout: &wgpu::PipelineLayout,
    role: ProgramRole,
    body: &str,
    target_format: wgpu::TextureFormat,
) -> Result<wgpu::RenderPipeline, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let built = compile_fragment_shader(device, role, body).map(|fragment_module| {
        create_pipeline(
            device,
            layouts,
            pipeline_layout,
            role,
            &fragment_module,
            target_format,
        )
    });
    let scope_error = pollster::block_on(device.pop_error_scope());
    let pipeline = built?;
    if let Some(error) = scope_error {
        return Err(RenderError::Pipeline {
            role,
            diagnostic: error.to_string(),
        });
    }
    Ok(pipeline)
}

fn create_pipeline(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    pipeline_layout: &wgpu::PipelineLayout,
    role: ProgramRole,
    fragment_module: &wgpu::ShaderModule,
    target_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let label = format!("{role} pipeline");
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(pipeline_layout),
        vertex: wgpu::VertexState {
            module: &layouts.vertex_module,
            entry_point: Some("main"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}

/// Texture/sampler pairs at bindings `2n` and `2n + 1`.
fn texture_layout_entries(count: u32) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(count as usize * 2);
    for index in 0..count {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}
