//! Scene traversal and draw submission.
//!
//! [`Renderer::draw`] renders a whole [`Scene`](crate::Scene) through a
//! camera into any color attachment, the visible surface or an off-screen
//! [`RenderTarget`](crate::RenderTarget) view. Supplying an override
//! [`ScenePipeline`] draws every node with that pipeline instead of the
//! node's lit material; the depth pass uses this to emit linearized depth
//! through the exact same traversal, without ever mutating node state.
//!
//! Per-node uniforms live in one dynamically offset uniform buffer written
//! once per draw call, so a pass with N nodes costs one buffer write and N
//! indexed draws.

use crate::camera::Camera;
use crate::error::Result;
use crate::gpu::GpuContext;
use crate::mesh::Vertex3d;
use crate::scene::Scene;
use crate::shader::ShaderProgram;

/// Per-frame uniforms shared by the lit and depth-capture pipelines
/// (bind group 0).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// View matrix, used by the depth pass to recover view-space depth.
    pub view: [[f32; 4]; 4],
    /// Camera position in world space.
    pub camera_pos: [f32; 3],
    /// Elapsed time in seconds.
    pub time: f32,
    /// Point light position in world space.
    pub light_pos: [f32; 3],
    /// Near clip plane distance.
    pub near: f32,
    /// Point light color, premultiplied by intensity.
    pub light_color: [f32; 3],
    /// Far clip plane distance.
    pub far: f32,
}

/// Per-node uniforms (bind group 1, dynamically offset).
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    /// Model matrix.
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix, for normals under
    /// non-uniform scale.
    pub normal_matrix: [[f32; 4]; 4],
    /// RGBA base color.
    pub color: [f32; 4],
}

/// Stride between per-node uniform slots. 256 satisfies the default
/// `min_uniform_buffer_offset_alignment` on every backend.
const MODEL_STRIDE: u64 = 256;

const INITIAL_NODE_CAPACITY: usize = 16;

/// A pipeline compatible with scene traversal: [`Vertex3d`] input, frame
/// uniforms at group 0, model uniforms at group 1, depth-tested.
///
/// The lit pipeline and the depth-capture pipeline are both
/// `ScenePipeline`s targeting different formats, which is what lets the
/// renderer swap one for the other per pass.
pub struct ScenePipeline {
    /// The compiled program the pipeline was built from.
    pub program: ShaderProgram,
    pipeline: wgpu::RenderPipeline,
}

/// Draws scenes through a camera into a destination view.
pub struct Renderer {
    lit: ScenePipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    frame_layout: wgpu::BindGroupLayout,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    model_capacity: usize,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl Renderer {
    /// Creates the renderer: bind group layouts, uniform buffers, the lit
    /// scene pipeline, and a z-buffer sized to the current viewport.
    pub fn new(gpu: &GpuContext) -> Result<Self> {
        let device = &gpu.device;

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ModelUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });

        let (model_buffer, model_bind_group) =
            Self::create_model_buffer(gpu, &model_layout, INITIAL_NODE_CAPACITY);

        let lit_program = ShaderProgram::compile(
            gpu,
            include_str!("shaders/scene.wgsl"),
            "Scene Shader",
        )?;
        let lit = Self::build_scene_pipeline(
            gpu,
            &frame_layout,
            &model_layout,
            lit_program,
            gpu.config.format,
            "Scene Pipeline",
        );

        let (depth_texture, depth_view) = Self::create_depth_texture(gpu);

        Ok(Self {
            lit,
            frame_buffer,
            frame_bind_group,
            frame_layout,
            model_buffer,
            model_bind_group,
            model_layout,
            model_capacity: INITIAL_NODE_CAPACITY,
            depth_texture,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        })
    }

    /// Builds an override pipeline from WGSL source, sharing this
    /// renderer's bind group layouts so it can stand in for the lit
    /// pipeline during traversal.
    pub fn create_override_pipeline(
        &self,
        gpu: &GpuContext,
        source: &str,
        target_format: wgpu::TextureFormat,
        label: &str,
    ) -> Result<ScenePipeline> {
        let program = ShaderProgram::compile(gpu, source, label)?;
        Ok(Self::build_scene_pipeline(
            gpu,
            &self.frame_layout,
            &self.model_layout,
            program,
            target_format,
            label,
        ))
    }

    fn build_scene_pipeline(
        gpu: &GpuContext,
        frame_layout: &wgpu::BindGroupLayout,
        model_layout: &wgpu::BindGroupLayout,
        program: ShaderProgram,
        target_format: wgpu::TextureFormat,
        label: &str,
    ) -> ScenePipeline {
        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[frame_layout, model_layout],
                push_constant_ranges: &[],
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &program.module,
                    entry_point: Some("vs"),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.module,
                    entry_point: Some("fs"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: target_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: wgpu::TextureFormat::Depth32Float,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        ScenePipeline { program, pipeline }
    }

    fn create_model_buffer(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Uniforms"),
            size: capacity as u64 * MODEL_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_depth_texture(gpu: &GpuContext) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Renderer Z-Buffer"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Recreates the z-buffer at the current viewport size. Called by the
    /// resize coordinator between frames.
    pub fn resize(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            let (texture, view) = Self::create_depth_texture(gpu);
            self.depth_texture = texture;
            self.depth_view = view;
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    fn ensure_model_capacity(&mut self, gpu: &GpuContext, nodes: usize) {
        if nodes > self.model_capacity {
            let capacity = nodes.next_power_of_two();
            let (buffer, bind_group) = Self::create_model_buffer(gpu, &self.model_layout, capacity);
            self.model_buffer = buffer;
            self.model_bind_group = bind_group;
            self.model_capacity = capacity;
        }
    }

    /// Draws the scene through `camera` into `destination`.
    ///
    /// * `override_pipeline`: when `Some`, every node is drawn with the
    ///   given pipeline instead of the lit one. The destination's format
    ///   must match the pipeline's target format.
    /// * `clear`: whether the color and depth attachments are cleared
    ///   before this draw. The pipeline clears each target exactly once
    ///   per frame, never per node.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        scene: &Scene,
        camera: &mut Camera,
        time: f32,
        destination: &wgpu::TextureView,
        override_pipeline: Option<&ScenePipeline>,
        clear: bool,
    ) {
        self.ensure_model_capacity(gpu, scene.nodes.len());

        let view = camera.view_matrix();
        let proj = camera.projection_matrix();
        let light = scene.light;

        let frame = FrameUniforms {
            view_proj: (proj * view).to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            time,
            light_pos: light.position.to_array(),
            near: camera.near(),
            light_color: [
                light.color[0] * light.intensity,
                light.color[1] * light.intensity,
                light.color[2] * light.intensity,
            ],
            far: camera.far(),
        };
        gpu.queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        // One staged write covering every node's slot.
        let mut staged = vec![0u8; scene.nodes.len() * MODEL_STRIDE as usize];
        for (i, node) in scene.nodes.iter().enumerate() {
            let model = node.transform.matrix();
            let uniforms = ModelUniforms {
                model: model.to_cols_array_2d(),
                normal_matrix: model.inverse().transpose().to_cols_array_2d(),
                color: node.color,
            };
            let offset = i * MODEL_STRIDE as usize;
            staged[offset..offset + std::mem::size_of::<ModelUniforms>()]
                .copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        if !staged.is_empty() {
            gpu.queue.write_buffer(&self.model_buffer, 0, &staged);
        }

        let load_op = if clear {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        };
        let depth_load = if clear {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: destination,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: load_op,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let pipeline = override_pipeline.unwrap_or(&self.lit);
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);

        for (i, node) in scene.nodes.iter().enumerate() {
            let offset = (i as u64 * MODEL_STRIDE) as u32;
            pass.set_bind_group(1, &self.model_bind_group, &[offset]);
            pass.set_vertex_buffer(0, node.mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(node.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..node.mesh.index_count, 0, 0..1);
        }
    }
}
