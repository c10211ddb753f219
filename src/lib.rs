//! A small 3D renderer with a depth-of-field post-process pipeline.
//!
//! Scenes are flat lists of meshes lit by one animated point light. Every
//! frame is rendered twice off-screen, once lit and once as linearized
//! depth, then composited to the window through a bokeh blur whose radius
//! follows each pixel's distance from the focal plane.
//!
//! [`run`] owns the window and event loop; [`RenderContext`] holds
//! everything a frame needs. Depth-of-field parameters are adjusted at
//! runtime through [`DofUpdate`], validated as a whole before any of them
//! take effect.

pub mod animation;
pub mod app;
pub mod camera;
pub mod composite;
pub mod context;
pub mod dof;
pub mod error;
pub mod gpu;
pub mod mesh;
pub mod post_process;
pub mod render_target;
pub mod renderer;
pub mod resize;
pub mod scene;
pub mod shader;
pub mod wave;

pub use animation::{Animator, WaveTrack};
pub use app::{run, AppConfig};
pub use camera::Camera;
pub use composite::{CompositePass, CompositeQuad};
pub use context::RenderContext;
pub use dof::{DofParams, DofUpdate};
pub use error::{RenderError, Result};
pub use gpu::GpuContext;
pub use mesh::{Mesh, Transform, Vertex3d};
pub use post_process::{FrameReport, PostProcessPipeline};
pub use render_target::RenderTarget;
pub use renderer::{Renderer, ScenePipeline};
pub use resize::ResizeCoordinator;
pub use scene::{Node, PointLight, Scene};
pub use shader::{ShaderProgram, UniformTable, UniformType, UniformValue};
pub use wave::wave;

// Math types used throughout the public API.
pub use glam::{Mat4, Quat, Vec3, Vec4};
