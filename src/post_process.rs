//! Three-pass depth-of-field pipeline.
//!
//! Each frame renders the scene twice into offscreen targets: once with the
//! lit pipeline into the color target, once with the depth-capture override
//! into the linear-depth target. A final composite pass draws a
//! viewport-sized quad to the visible surface, blurring the color target per
//! pixel by the distance between the captured depth and the focal plane.
//!
//! A frame only proceeds when both targets and the composite quad match the
//! surface resolution exactly. A stale frame is skipped, not stretched; the
//! resize path recreates everything before the next one.

use crate::camera::Camera;
use crate::composite::{CompositePass, CompositeQuad};
use crate::dof::{DofParams, DofUpdate};
use crate::error::{RenderError, Result};
use crate::gpu::GpuContext;
use crate::render_target::RenderTarget;
use crate::renderer::{Renderer, ScenePipeline};
use crate::scene::Scene;
use crate::shader::UniformValue;

/// Format of the offscreen linear-depth target. Filterable and linear, so
/// the composite kernel can sample it like any color texture.
pub const DEPTH_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Outcome of a single pipeline frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameReport {
    /// All three passes ran and the frame was presented.
    Rendered,
    /// Targets did not match the surface resolution; nothing was drawn.
    SkippedStaleTargets,
}

/// The full post-processing pipeline: two offscreen targets, a depth-capture
/// override for the scene renderer, and the bokeh composite pass.
pub struct PostProcessPipeline {
    color_target: RenderTarget,
    depth_target: RenderTarget,
    depth_capture: ScenePipeline,
    composite: CompositePass,
    quad: CompositeQuad,
    dof: DofParams,
}

impl PostProcessPipeline {
    /// Builds both targets, the depth-capture pipeline, and the composite
    /// pass at the current surface resolution.
    pub fn new(gpu: &GpuContext, renderer: &Renderer) -> Result<Self> {
        let (width, height) = (gpu.width(), gpu.height());

        let color_target =
            RenderTarget::create(gpu, width, height, gpu.config.format, "Color Target")?;
        let depth_target =
            RenderTarget::create(gpu, width, height, DEPTH_TARGET_FORMAT, "Depth Target")?;

        let depth_capture = renderer.create_override_pipeline(
            gpu,
            include_str!("shaders/depth.wgsl"),
            DEPTH_TARGET_FORMAT,
            "Depth Capture",
        )?;

        let composite = CompositePass::new(gpu)?;
        let quad = CompositeQuad::new(gpu, width, height)?;

        let mut pipeline = Self {
            color_target,
            depth_target,
            depth_capture,
            composite,
            quad,
            dof: DofParams::default(),
        };
        pipeline.push_viewport_uniforms()?;
        pipeline.push_dof_uniforms()?;
        Ok(pipeline)
    }

    /// Current depth-of-field parameters.
    pub fn dof(&self) -> &DofParams {
        &self.dof
    }

    /// Applies a depth-of-field update. The update is validated as a whole
    /// before anything changes; on rejection the previous parameters stay in
    /// effect, on the GPU as well as here.
    pub fn set_depth_of_field(&mut self, update: DofUpdate) -> Result<()> {
        self.dof.apply(update)?;
        self.push_dof_uniforms()
    }

    /// Recreates both targets and the composite quad at the new resolution.
    /// The old textures are destroyed first; their handles are replaced, not
    /// reconfigured.
    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) -> Result<()> {
        self.color_target.resize(gpu, width, height)?;
        self.depth_target.resize(gpu, width, height)?;
        self.quad = CompositeQuad::new(gpu, width, height)?;
        self.push_viewport_uniforms()
    }

    /// Runs the full frame: color pass, depth-capture pass, composite pass,
    /// then submit and present. Skips the frame when targets are stale, and
    /// reports a lost or outdated surface as transient so the caller can
    /// retry on the next frame.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        renderer: &mut Renderer,
        scene: &Scene,
        camera: &mut Camera,
        time: f32,
    ) -> Result<FrameReport> {
        let viewport = (gpu.width(), gpu.height());
        if !targets_cover(
            self.color_target.size(),
            self.depth_target.size(),
            self.quad.size(),
            viewport,
        ) {
            log::debug!(
                "skipping frame: targets {:?}/{:?} vs surface {:?}",
                self.color_target.size(),
                self.depth_target.size(),
                viewport
            );
            return Ok(FrameReport::SkippedStaleTargets);
        }

        self.composite
            .set_uniform("near", UniformValue::Float(camera.near()))?;
        self.composite
            .set_uniform("far", UniformValue::Float(camera.far()))?;

        let output = gpu
            .surface
            .get_current_texture()
            .map_err(|e| RenderError::TransientDevice(e.to_string()))?;
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        renderer.draw(
            gpu,
            &mut encoder,
            scene,
            camera,
            time,
            &self.color_target.view,
            None,
            true,
        );
        renderer.draw(
            gpu,
            &mut encoder,
            scene,
            camera,
            time,
            &self.depth_target.view,
            Some(&self.depth_capture),
            true,
        );
        self.composite.render(
            gpu,
            &mut encoder,
            &screen_view,
            &self.color_target.view,
            &self.depth_target.view,
            &self.quad,
        );

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(FrameReport::Rendered)
    }

    fn push_viewport_uniforms(&mut self) -> Result<()> {
        let (width, height) = self.quad.size();
        self.composite.set_uniform(
            "proj",
            UniformValue::Mat4(self.quad.projection().to_cols_array_2d()),
        )?;
        self.composite
            .set_uniform("texture_width", UniformValue::Float(width as f32))?;
        self.composite
            .set_uniform("texture_height", UniformValue::Float(height as f32))
    }

    fn push_dof_uniforms(&mut self) -> Result<()> {
        let dof = self.dof;
        self.composite
            .set_uniform("focal_depth", UniformValue::Float(dof.focal_depth))?;
        self.composite
            .set_uniform("focal_length", UniformValue::Float(dof.focal_length))?;
        self.composite
            .set_uniform("aperture", UniformValue::Float(dof.aperture))?;
        self.composite
            .set_uniform("max_blur", UniformValue::Float(dof.max_blur))?;
        self.composite
            .set_uniform("ring_count", UniformValue::Uint(dof.ring_count))?;
        self.composite
            .set_uniform("sample_count", UniformValue::Uint(dof.sample_count))?;
        self.composite
            .set_uniform("noise", UniformValue::Uint(dof.noise as u32))?;
        self.composite
            .set_uniform("dither", UniformValue::Float(dof.dither))
    }
}

/// True when every intermediate surface matches the viewport exactly.
fn targets_cover(
    color: (u32, u32),
    depth: (u32, u32),
    quad: (u32, u32),
    viewport: (u32, u32),
) -> bool {
    color == viewport && depth == viewport && quad == viewport
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_targets_cover_viewport() {
        let v = (1280, 720);
        assert!(targets_cover(v, v, v, v));
    }

    #[test]
    fn any_stale_surface_fails_the_gate() {
        let v = (1280, 720);
        let old = (800, 600);
        assert!(!targets_cover(old, v, v, v));
        assert!(!targets_cover(v, old, v, v));
        assert!(!targets_cover(v, v, old, v));
    }

    #[test]
    fn gate_checks_both_dimensions() {
        assert!(!targets_cover((1280, 600), (1280, 720), (1280, 720), (1280, 720)));
        assert!(!targets_cover((800, 720), (1280, 720), (1280, 720), (1280, 720)));
    }
}
