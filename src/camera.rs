//! Perspective camera with a lazily cached projection matrix.

use glam::{Mat4, Vec3};

use crate::error::{RenderError, Result};

/// Film-gauge sensor height in millimeters used to convert between field
/// of view and focal length, matching the 35 mm full-frame convention.
pub const SENSOR_HEIGHT_MM: f32 = 24.0;

/// A perspective camera: projection parameters plus a position/look-at
/// transform.
///
/// Projection fields (`fov`, `aspect`, `near`, `far`) are only mutated
/// through setters, each of which invalidates the cached projection matrix
/// synchronously, so [`projection_matrix`](Self::projection_matrix) never
/// observes stale parameters. The transform fields are plain data; the
/// view matrix is cheap and computed fresh on every call.
///
/// Field of view and focal length are two representations of the same
/// quantity, linked through [`SENSOR_HEIGHT_MM`]; setting either keeps the
/// other consistent.
#[derive(Clone, Debug)]
pub struct Camera {
    fov_y: f32, // radians
    aspect: f32,
    near: f32,
    far: f32,
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// World-space up vector.
    pub up: Vec3,
    cached_projection: Option<Mat4>,
}

impl Camera {
    /// Creates a perspective camera.
    ///
    /// Rejects non-positive aspect ratios and any near/far pair violating
    /// `0 < near < far`.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Result<Self> {
        if !(fov_y_degrees > 0.0 && fov_y_degrees < 180.0) {
            return Err(RenderError::InvalidParameter(format!(
                "field of view must be in (0, 180) degrees, got {fov_y_degrees}"
            )));
        }
        if !(aspect > 0.0) {
            return Err(RenderError::InvalidParameter(format!(
                "aspect ratio must be positive, got {aspect}"
            )));
        }
        if !(near > 0.0 && near < far) {
            return Err(RenderError::InvalidParameter(format!(
                "near/far planes must satisfy 0 < near < far, got {near}/{far}"
            )));
        }
        Ok(Self {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            cached_projection: None,
        })
    }

    /// Positions the camera (builder style).
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Aims the camera at a world-space point (builder style).
    pub fn looking_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Updates the aspect ratio and invalidates the projection cache.
    pub fn set_aspect(&mut self, aspect: f32) -> Result<()> {
        if !(aspect > 0.0) {
            return Err(RenderError::InvalidParameter(format!(
                "aspect ratio must be positive, got {aspect}"
            )));
        }
        self.aspect = aspect;
        self.cached_projection = None;
        Ok(())
    }

    /// Updates the vertical field of view (degrees) and invalidates the
    /// projection cache. The derived focal length follows.
    pub fn set_fov(&mut self, fov_y_degrees: f32) -> Result<()> {
        if !(fov_y_degrees > 0.0 && fov_y_degrees < 180.0) {
            return Err(RenderError::InvalidParameter(format!(
                "field of view must be in (0, 180) degrees, got {fov_y_degrees}"
            )));
        }
        self.fov_y = fov_y_degrees.to_radians();
        self.cached_projection = None;
        Ok(())
    }

    /// Sets the lens focal length in millimeters, deriving the field of
    /// view from the fixed sensor height. Invalidates the projection cache.
    pub fn set_focal_length(&mut self, millimeters: f32) -> Result<()> {
        if !(millimeters > 0.0) {
            return Err(RenderError::InvalidParameter(format!(
                "focal length must be positive, got {millimeters}"
            )));
        }
        self.fov_y = 2.0 * (SENSOR_HEIGHT_MM * 0.5 / millimeters).atan();
        self.cached_projection = None;
        Ok(())
    }

    /// Lens focal length in millimeters, derived from the field of view.
    pub fn focal_length(&self) -> f32 {
        SENSOR_HEIGHT_MM * 0.5 / (self.fov_y * 0.5).tan()
    }

    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Current aspect ratio.
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Near clip plane distance.
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far clip plane distance.
    pub fn far(&self) -> f32 {
        self.far
    }

    /// The projection matrix, recomputed lazily and cached until a
    /// projection field changes.
    pub fn projection_matrix(&mut self) -> Mat4 {
        *self.cached_projection.get_or_insert_with(|| {
            Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
        })
    }

    /// The view matrix from the current position/target/up transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    #[cfg(test)]
    fn projection_is_cached(&self) -> bool {
        self.cached_projection.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_planes_and_aspect() {
        assert!(Camera::perspective(50.0, 0.0, 0.1, 15.0).is_err());
        assert!(Camera::perspective(50.0, 1.5, 0.0, 15.0).is_err());
        assert!(Camera::perspective(50.0, 1.5, 15.0, 0.1).is_err());
        assert!(Camera::perspective(0.0, 1.5, 0.1, 15.0).is_err());
    }

    #[test]
    fn setters_invalidate_the_cache_synchronously() {
        let mut camera = Camera::perspective(50.0, 800.0 / 600.0, 0.1, 15.0).unwrap();

        let before = camera.projection_matrix();
        assert!(camera.projection_is_cached());

        camera.set_aspect(400.0 / 300.0).unwrap();
        assert!(!camera.projection_is_cached());

        // Same ratio, so the matrix matches; but it was recomputed, not
        // served stale.
        let after = camera.projection_matrix();
        assert_eq!(before, after);

        camera.set_aspect(2.0).unwrap();
        assert_ne!(camera.projection_matrix(), after);
    }

    #[test]
    fn fov_and_focal_length_stay_consistent() {
        let mut camera = Camera::perspective(50.0, 1.5, 0.1, 15.0).unwrap();

        camera.set_focal_length(35.0).unwrap();
        assert!((camera.focal_length() - 35.0).abs() < 1e-4);

        let fov_at_35mm = camera.fov_y();
        camera.set_fov(fov_at_35mm.to_degrees()).unwrap();
        assert!((camera.focal_length() - 35.0).abs() < 1e-3);

        // Longer lens means narrower field of view.
        camera.set_focal_length(85.0).unwrap();
        assert!(camera.fov_y() < fov_at_35mm);
    }

    #[test]
    fn repeated_calls_reuse_the_cached_matrix() {
        let mut camera = Camera::perspective(50.0, 1.5, 0.1, 15.0).unwrap();
        let a = camera.projection_matrix();
        let b = camera.projection_matrix();
        assert_eq!(a, b);
        assert!(camera.projection_is_cached());
    }
}
