//! The full-screen composite pass: geometry, pipeline, and bindings.
//!
//! The composite pass draws one viewport-sized quad through a fixed
//! orthographic projection, sampling the color and depth targets per pixel
//! and blending neighbors through the bokeh kernel in
//! `shaders/composite.wgsl`. The quad is real geometry in pixel
//! coordinates, recreated rather than scaled whenever the viewport changes,
//! so its dimensions participate in the same resolution invariant as the
//! render targets.

use glam::Mat4;

use crate::error::{RenderError, Result};
use crate::gpu::GpuContext;
use crate::shader::{ShaderProgram, UniformTable, UniformType, UniformValue};

/// A composite vertex: pixel-space position and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

const QUAD_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<QuadVertex>() as u64,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x2,
        },
        wgpu::VertexAttribute {
            offset: 8,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x2,
        },
    ],
};

/// A two-triangle quad covering the viewport exactly, in pixel
/// coordinates, with the orthographic matrix that maps it to clip space.
pub struct CompositeQuad {
    vertex_buffer: wgpu::Buffer,
    width: u32,
    height: u32,
}

impl CompositeQuad {
    /// Builds the quad at the given viewport resolution.
    ///
    /// Allocation failure is caught through an out-of-memory error scope
    /// and reported as [`RenderError::ResourceExhausted`], matching the
    /// render targets the quad is recreated alongside.
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Result<Self> {
        use wgpu::util::DeviceExt;

        let w = width as f32;
        let h = height as f32;
        // Texture v runs top-down while the ortho y axis runs bottom-up.
        let vertices = [
            QuadVertex { position: [0.0, 0.0], uv: [0.0, 1.0] },
            QuadVertex { position: [w, 0.0], uv: [1.0, 1.0] },
            QuadVertex { position: [w, h], uv: [1.0, 0.0] },
            QuadVertex { position: [w, h], uv: [1.0, 0.0] },
            QuadVertex { position: [0.0, h], uv: [0.0, 0.0] },
            QuadVertex { position: [0.0, 0.0], uv: [0.0, 1.0] },
        ];

        gpu.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Composite Quad"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        if let Some(error) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(RenderError::ResourceExhausted(format!(
                "composite quad at {width}x{height}: {error}"
            )));
        }

        Ok(Self {
            vertex_buffer,
            width,
            height,
        })
    }

    /// The fixed orthographic projection matching this quad's viewport.
    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(0.0, self.width as f32, 0.0, self.height as f32, -1.0, 1.0)
    }

    /// Quad resolution in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// The composite render pass: program, pipeline, and texture bindings.
pub struct CompositePass {
    /// The composite program, carrying the depth-of-field uniform table.
    pub program: ShaderProgram,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl CompositePass {
    /// Field layout of the composite uniform table. Order matches the
    /// `CompositeUniforms` struct in `shaders/composite.wgsl`.
    fn uniform_layout() -> UniformTable {
        UniformTable::new(&[
            ("proj", UniformType::Mat4),
            ("texture_width", UniformType::Float),
            ("texture_height", UniformType::Float),
            ("focal_depth", UniformType::Float),
            ("focal_length", UniformType::Float),
            ("aperture", UniformType::Float),
            ("max_blur", UniformType::Float),
            ("near", UniformType::Float),
            ("far", UniformType::Float),
            ("ring_count", UniformType::Uint),
            ("sample_count", UniformType::Uint),
            ("noise", UniformType::Uint),
            ("dither", UniformType::Float),
        ])
    }

    /// Compiles the composite shader and builds the pipeline targeting the
    /// visible surface format.
    pub fn new(gpu: &GpuContext) -> Result<Self> {
        let mut program = ShaderProgram::compile_with_uniforms(
            gpu,
            include_str!("shaders/composite.wgsl"),
            "Composite Shader",
            Self::uniform_layout(),
        )?;
        program.uniforms_mut().bind(gpu, "Composite Uniforms");

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Composite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Composite Bind Group Layout"),
                    entries: &[
                        // Uniforms
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        // Color target
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        // Linear-depth target
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        // Sampler
                        wgpu::BindGroupLayoutEntry {
                            binding: 3,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ],
                });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Composite Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Composite Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &program.module,
                    entry_point: Some("vs"),
                    buffers: &[QUAD_LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.module,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        Ok(Self {
            program,
            pipeline,
            bind_group_layout,
            sampler,
        })
    }

    /// Records the composite draw: one clear, one quad, six vertices.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        destination: &wgpu::TextureView,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        quad: &CompositeQuad,
    ) {
        self.program.uniforms_mut().upload(&gpu.queue);

        let buffer = self
            .program
            .uniforms()
            .buffer()
            .expect("composite uniforms are bound at construction");

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(color_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: destination,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, quad.vertex_buffer.slice(..));
        pass.draw(0..6, 0..1);
    }

    /// Stages a composite uniform by name.
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<()> {
        self.program.set_uniform(name, value)
    }
}
