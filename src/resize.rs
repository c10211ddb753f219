//! Debounced resize handling.
//!
//! Window systems deliver resize events in bursts, often several per frame
//! while a drag is in progress. Reconfiguring the surface and rebuilding
//! every render target on each event would thrash the GPU, so resize events
//! only stash the requested size here. The pending size is applied once, at
//! the next frame boundary, and later events simply overwrite earlier ones.

use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::post_process::PostProcessPipeline;
use crate::renderer::Renderer;
use crate::error::Result;

/// Collapses bursts of resize events into at most one application per frame.
#[derive(Default)]
pub struct ResizeCoordinator {
    pending: Option<(u32, u32)>,
}

impl ResizeCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a requested size. Zero-area sizes (minimized windows) are
    /// ignored; the latest surviving request wins.
    pub fn notify(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.pending = Some((width, height));
    }

    /// True when a resize is waiting to be applied.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Applies the pending size, if any, in dependency order: camera aspect,
    /// surface, z-buffer, then the post-process targets. Returns whether a
    /// resize was applied. On failure the request is re-stashed so the next
    /// frame retries it.
    pub fn apply(
        &mut self,
        gpu: &mut GpuContext,
        camera: &mut Camera,
        renderer: &mut Renderer,
        pipeline: &mut PostProcessPipeline,
    ) -> Result<bool> {
        let Some((width, height)) = self.pending.take() else {
            return Ok(false);
        };
        if (width, height) == (gpu.width(), gpu.height()) {
            return Ok(false);
        }

        log::info!("resizing to {width}x{height}");

        let result = (|| {
            camera.set_aspect(width as f32 / height as f32)?;
            gpu.resize(width, height);
            renderer.resize(gpu);
            pipeline.resize(gpu, width, height)
        })();

        if result.is_err() {
            self.pending = Some((width, height));
        }
        result.map(|_| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_collapses_to_latest() {
        let mut resize = ResizeCoordinator::new();
        resize.notify(800, 600);
        resize.notify(1024, 768);
        resize.notify(1280, 720);
        assert_eq!(resize.pending, Some((1280, 720)));
    }

    #[test]
    fn zero_sizes_are_ignored() {
        let mut resize = ResizeCoordinator::new();
        resize.notify(0, 600);
        resize.notify(800, 0);
        assert!(!resize.is_pending());

        resize.notify(800, 600);
        resize.notify(0, 0);
        assert_eq!(resize.pending, Some((800, 600)));
    }

    #[test]
    fn starts_with_nothing_pending() {
        assert!(!ResizeCoordinator::new().is_pending());
    }
}
