//! Everything a frame needs, in one place.

use crate::animation::Animator;
use crate::camera::Camera;
use crate::dof::DofUpdate;
use crate::error::{RenderError, Result};
use crate::gpu::GpuContext;
use crate::post_process::{FrameReport, PostProcessPipeline};
use crate::renderer::Renderer;
use crate::resize::ResizeCoordinator;
use crate::scene::Scene;

/// Owns the scene, camera, renderer, and post-process pipeline, and runs a
/// frame through them in order.
pub struct RenderContext {
    pub scene: Scene,
    pub camera: Camera,
    pub renderer: Renderer,
    pub pipeline: PostProcessPipeline,
    pub resize: ResizeCoordinator,
    pub animator: Animator,
}

impl RenderContext {
    /// Builds the renderer and post-process pipeline around a scene and
    /// camera at the current surface resolution.
    pub fn new(gpu: &GpuContext, scene: Scene, camera: Camera, animator: Animator) -> Result<Self> {
        let renderer = Renderer::new(gpu)?;
        let pipeline = PostProcessPipeline::new(gpu, &renderer)?;
        Ok(Self {
            scene,
            camera,
            renderer,
            pipeline,
            resize: ResizeCoordinator::new(),
            animator,
        })
    }

    /// Adjusts the depth-of-field parameters for subsequent frames.
    pub fn set_depth_of_field(&mut self, update: DofUpdate) -> Result<()> {
        self.pipeline.set_depth_of_field(update)
    }

    /// Runs one frame at `time` seconds: apply any pending resize, step the
    /// animation, then render. A failed resize or a transient device fault
    /// drops this frame and leaves the next one to retry.
    pub fn frame(&mut self, gpu: &mut GpuContext, time: f32) {
        if let Err(e) = self
            .resize
            .apply(gpu, &mut self.camera, &mut self.renderer, &mut self.pipeline)
        {
            log::warn!("resize failed, retrying next frame: {e}");
            return;
        }

        self.animator.step(&mut self.scene, time);

        if let Some(track) = self.animator.focus_sweep() {
            let update = DofUpdate {
                focal_depth: Some(track.sample(time)),
                ..Default::default()
            };
            if let Err(e) = self.pipeline.set_depth_of_field(update) {
                log::error!("focus sweep produced an invalid focal depth: {e}");
            }
        }

        match self.pipeline.render(
            gpu,
            &mut self.renderer,
            &self.scene,
            &mut self.camera,
            time,
        ) {
            Ok(FrameReport::Rendered) => {}
            Ok(FrameReport::SkippedStaleTargets) => {
                log::debug!("frame skipped while targets catch up to the surface");
            }
            Err(RenderError::TransientDevice(reason)) => {
                log::warn!("dropped frame on transient surface fault: {reason}");
            }
            Err(e) => {
                log::error!("frame failed: {e}");
            }
        }
    }
}
