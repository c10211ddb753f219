//! Off-screen render targets for the color and depth passes.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{RenderError, Result};
use crate::gpu::GpuContext;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// An off-screen destination with a fixed pixel resolution that can later
/// be sampled as a texture.
///
/// Targets are created with both `RENDER_ATTACHMENT` and `TEXTURE_BINDING`
/// usage, so after [`create`](Self::create) returns the target is
/// immediately usable as a draw destination and as a read-only texture
/// source in a later pass.
///
/// A target is never resized in place. [`resize`](Self::resize) destroys
/// the texture and allocates a fresh one, so no pass can ever alias stale
/// GPU memory from the previous resolution. Each allocation gets a new
/// [`generation`](Self::generation) number, which is how the swap stays
/// observable (and shows up in the resize logs).
pub struct RenderTarget {
    /// The underlying GPU texture that stores pixel data.
    pub texture: wgpu::Texture,
    /// A view into the texture, used for render pass attachments and
    /// shader sampling.
    pub view: wgpu::TextureView,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    label: &'static str,
    generation: u64,
}

impl RenderTarget {
    /// Allocates a target at the given resolution and format.
    ///
    /// Allocation failure is caught through an out-of-memory error scope
    /// and reported as [`RenderError::ResourceExhausted`]; the caller must
    /// not use the target afterward.
    pub fn create(
        gpu: &GpuContext,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: &'static str,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidParameter(format!(
                "render target {label} requires non-zero dimensions, got {width}x{height}"
            )));
        }

        gpu.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        if let Some(error) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(RenderError::ResourceExhausted(format!(
                "{label} at {width}x{height}: {error}"
            )));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self {
            texture,
            view,
            width,
            height,
            format,
            label,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Replaces the target with a fresh allocation at the new resolution.
    ///
    /// Implemented as destroy-then-recreate rather than in-place mutation
    /// so a failure never leaves a partially valid target: on error the old
    /// value is untouched and the caller decides whether to retry.
    pub fn resize(&mut self, gpu: &GpuContext, width: u32, height: u32) -> Result<()> {
        let next = Self::create(gpu, width, height, self.format, self.label)?;
        self.texture.destroy();
        log::debug!(
            "render target {} recreated: {}x{} gen {} -> {}x{} gen {}",
            self.label,
            self.width,
            self.height,
            self.generation,
            width,
            height,
            next.generation
        );
        *self = next;
        Ok(())
    }

    /// Current resolution in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Texture format the target was allocated with.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Monotonically increasing allocation counter. Two targets (or the
    /// same target before and after a resize) never share a generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
