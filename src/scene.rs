//! Scene data: drawable nodes and the point light.
//!
//! The scene is owned by the application and read by the renderer and the
//! post-process pipeline. A node owns its mesh outright, so a drawable's
//! geometry reference is valid for as long as the scene holds the node.

use glam::Vec3;

use crate::mesh::{Mesh, Transform};

/// A drawable node: geometry, placement, and a base color.
pub struct Node {
    /// The node's geometry, owned by the node.
    pub mesh: Mesh,
    /// World-space placement.
    pub transform: Transform,
    /// RGBA base color multiplied into the lighting result.
    pub color: [f32; 4],
}

/// A point light with inverse-square falloff.
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    /// World-space position.
    pub position: Vec3,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Scalar intensity multiplied into the color.
    pub intensity: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -3.0, 7.0),
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

/// An unordered set of drawable nodes plus the scene's light.
#[derive(Default)]
pub struct Scene {
    /// Drawable nodes, traversed in insertion order.
    pub nodes: Vec<Node>,
    /// The single point light illuminating the scene.
    pub light: PointLight,
}

impl Scene {
    /// Creates an empty scene with a default light.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its index.
    pub fn add(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}
