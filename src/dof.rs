//! Depth-of-field parameters and the optics math behind the composite pass.
//!
//! [`DofParams`] is owned by the
//! [`PostProcessPipeline`](crate::PostProcessPipeline) and mutated only
//! through [`set_depth_of_field`](crate::PostProcessPipeline::set_depth_of_field),
//! which takes a [`DofUpdate`]: a struct of optional fields where anything
//! left `None` keeps its current value. Updates are validated as a whole
//! before any field is applied, so a rejected update leaves the parameters
//! untouched.
//!
//! The helpers [`linearize_depth`], [`view_depth`], and [`blur_radius`] are
//! CPU mirrors of the formulas in `shaders/depth.wgsl` and
//! `shaders/composite.wgsl`, kept in lockstep so the optics can be reasoned
//! about (and tested) without a GPU.

use crate::error::{RenderError, Result};

/// Reference focal length in millimeters at which the blur factor is 1:1
/// with distance from the focal plane. Matches the 35 mm default lens the
/// composite shader is tuned around.
pub const REFERENCE_FOCAL_LENGTH: f32 = 35.0;

/// Tunable depth-of-field parameters consumed by the composite shader
/// every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DofParams {
    /// Distance from the camera to the focal plane, in world units.
    pub focal_depth: f32,
    /// Lens focal length in millimeters. Longer lenses blur faster.
    pub focal_length: f32,
    /// Aperture as an f-stop. Smaller numbers mean a wider aperture and
    /// shallower depth of field.
    pub aperture: f32,
    /// Upper bound on the blur kernel radius. The shader clamps here, never
    /// extrapolates.
    pub max_blur: f32,
    /// Number of concentric sample rings in the bokeh kernel.
    pub ring_count: u32,
    /// Samples on the innermost ring; outer rings scale up proportionally.
    pub sample_count: u32,
    /// Jitter sample positions to hide ring banding.
    pub noise: bool,
    /// Strength of the jitter, as a fraction of the blur radius in `[0, 1]`.
    pub dither: f32,
}

impl Default for DofParams {
    fn default() -> Self {
        Self {
            focal_depth: 1.6,
            focal_length: REFERENCE_FOCAL_LENGTH,
            aperture: 2.2,
            max_blur: 1.3,
            ring_count: 3,
            sample_count: 4,
            noise: true,
            dither: 0.0001,
        }
    }
}

/// A partial update to [`DofParams`]. Fields left `None` preserve the
/// current value. Being a closed struct, there is no such thing as an
/// unknown key; range violations are reported as
/// [`RenderError::InvalidParameter`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DofUpdate {
    pub focal_depth: Option<f32>,
    pub focal_length: Option<f32>,
    pub aperture: Option<f32>,
    pub max_blur: Option<f32>,
    pub ring_count: Option<u32>,
    pub sample_count: Option<u32>,
    pub noise: Option<bool>,
    pub dither: Option<f32>,
}

impl DofParams {
    /// Validates `update` and applies it. On error nothing is changed.
    pub fn apply(&mut self, update: DofUpdate) -> Result<()> {
        let mut next = *self;
        if let Some(v) = update.focal_depth {
            if !v.is_finite() || v < 0.0 {
                return Err(RenderError::InvalidParameter(format!(
                    "focal_depth must be finite and non-negative, got {v}"
                )));
            }
            next.focal_depth = v;
        }
        if let Some(v) = update.focal_length {
            if !v.is_finite() || v <= 0.0 {
                return Err(RenderError::InvalidParameter(format!(
                    "focal_length must be positive, got {v}"
                )));
            }
            next.focal_length = v;
        }
        if let Some(v) = update.aperture {
            if !v.is_finite() || v <= 0.0 {
                return Err(RenderError::InvalidParameter(format!(
                    "aperture must be positive, got {v}"
                )));
            }
            next.aperture = v;
        }
        if let Some(v) = update.max_blur {
            if !v.is_finite() || v < 0.0 {
                return Err(RenderError::InvalidParameter(format!(
                    "max_blur must be non-negative, got {v}"
                )));
            }
            next.max_blur = v;
        }
        if let Some(v) = update.ring_count {
            if v == 0 {
                return Err(RenderError::InvalidParameter(
                    "ring_count must be at least 1".into(),
                ));
            }
            next.ring_count = v;
        }
        if let Some(v) = update.sample_count {
            if v == 0 {
                return Err(RenderError::InvalidParameter(
                    "sample_count must be at least 1".into(),
                ));
            }
            next.sample_count = v;
        }
        if let Some(v) = update.noise {
            next.noise = v;
        }
        if let Some(v) = update.dither {
            if !(0.0..=1.0).contains(&v) {
                return Err(RenderError::InvalidParameter(format!(
                    "dither must be in [0, 1], got {v}"
                )));
            }
            next.dither = v;
        }
        *self = next;
        Ok(())
    }
}

/// Maps a view-space distance onto `[0, 1]` between the near and far planes.
///
/// Distances outside `[near, far]` clamp to the boundary; the depth pass
/// never extrapolates. Callers guarantee `0 < near < far` (the camera
/// enforces it), so the result is always finite.
pub fn linearize_depth(view_z: f32, near: f32, far: f32) -> f32 {
    ((view_z - near) / (far - near)).clamp(0.0, 1.0)
}

/// Inverse of [`linearize_depth`]: recovers the view-space distance a
/// stored `[0, 1]` depth sample encodes. The composite shader applies this
/// to the depth target before comparing against the focal plane, so both
/// sides of that comparison are in world units.
pub fn view_depth(stored: f32, near: f32, far: f32) -> f32 {
    near + stored.clamp(0.0, 1.0) * (far - near)
}

/// Blur kernel radius for a surface at `depth` (world units from the
/// camera).
///
/// Zero at the focal plane, growing linearly with distance from it (scaled
/// by focal length, divided by the aperture f-stop) and saturating at
/// `max_blur`. This is the same formula the composite shader evaluates per
/// pixel.
pub fn blur_radius(depth: f32, params: &DofParams) -> f32 {
    let factor = (depth - params.focal_depth).abs() * params.focal_length
        / (REFERENCE_FOCAL_LENGTH * params.aperture);
    params.max_blur * factor.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_clamps_outside_planes() {
        let near = 0.1;
        let far = 15.0;
        assert_eq!(linearize_depth(-4.0, near, far), 0.0);
        assert_eq!(linearize_depth(0.0, near, far), 0.0);
        assert_eq!(linearize_depth(100.0, near, far), 1.0);

        let mid = linearize_depth(7.55, near, far);
        assert!(mid > 0.0 && mid < 1.0);
        assert!(mid.is_finite());
    }

    #[test]
    fn depth_is_never_nan_for_out_of_range_samples() {
        for view_z in [-1e30_f32, -1.0, 0.0, 1e30] {
            let d = linearize_depth(view_z, 0.1, 15.0);
            assert!(!d.is_nan());
            assert!((0.0..=1.0).contains(&d));
        }
    }

    #[test]
    fn blur_stays_zero_through_the_depth_target_encoding() {
        // Same data flow as the GPU path: the depth pass stores normalized
        // depth, the composite pass recovers world units, then blurs.
        let near = 0.1;
        let far = 15.0;
        let params = DofParams {
            focal_depth: 1.6,
            aperture: 2.2,
            max_blur: 1.3,
            ..DofParams::default()
        };

        let stored = linearize_depth(params.focal_depth, near, far);
        let radius = blur_radius(view_depth(stored, near, far), &params);
        assert!(
            radius < 1e-4,
            "plane at the focal depth must not blur, got {radius}"
        );
    }

    #[test]
    fn view_depth_inverts_linearize_within_the_planes() {
        let near = 0.1;
        let far = 15.0;
        for z in [0.1, 1.6, 7.3, 15.0] {
            let roundtrip = view_depth(linearize_depth(z, near, far), near, far);
            assert!((roundtrip - z).abs() < 1e-4, "roundtrip broke at {z}");
        }
        // Out-of-range samples clamp to the planes.
        assert_eq!(view_depth(-0.5, near, far), near);
        assert_eq!(view_depth(2.0, near, far), far);
    }

    #[test]
    fn blur_is_zero_at_focal_plane() {
        let params = DofParams {
            focal_depth: 1.6,
            aperture: 2.2,
            max_blur: 1.3,
            ..DofParams::default()
        };
        assert_eq!(blur_radius(1.6, &params), 0.0);
    }

    #[test]
    fn blur_grows_monotonically_away_from_focal_plane() {
        let params = DofParams {
            focal_depth: 1.6,
            aperture: 2.2,
            max_blur: 1.3,
            ..DofParams::default()
        };

        // A plane at twice the focal depth must blur.
        assert!(blur_radius(3.2, &params) > 0.0);

        let mut previous = 0.0;
        for i in 1..=20 {
            let depth = 1.6 + i as f32 * 0.1;
            let radius = blur_radius(depth, &params);
            assert!(radius >= previous, "not monotone at depth {}", depth);
            assert!(radius <= params.max_blur);
            previous = radius;
        }
    }

    #[test]
    fn blur_saturates_at_max() {
        let params = DofParams::default();
        assert_eq!(blur_radius(1000.0, &params), params.max_blur);
    }

    #[test]
    fn update_applies_only_provided_fields() {
        let mut params = DofParams::default();
        params
            .apply(DofUpdate {
                aperture: Some(5.6),
                noise: Some(false),
                ..DofUpdate::default()
            })
            .unwrap();

        assert_eq!(params.aperture, 5.6);
        assert!(!params.noise);
        // Untouched fields keep their defaults.
        assert_eq!(params.focal_depth, DofParams::default().focal_depth);
        assert_eq!(params.ring_count, DofParams::default().ring_count);
    }

    #[test]
    fn rejected_update_leaves_state_unchanged() {
        let mut params = DofParams::default();
        let before = params;

        let result = params.apply(DofUpdate {
            focal_depth: Some(4.0),
            aperture: Some(-1.0), // invalid
            ..DofUpdate::default()
        });

        assert!(matches!(result, Err(RenderError::InvalidParameter(_))));
        assert_eq!(params, before, "partial update must not be applied");
    }

    #[test]
    fn zero_ring_or_sample_count_is_rejected() {
        let mut params = DofParams::default();
        assert!(
            params
                .apply(DofUpdate {
                    ring_count: Some(0),
                    ..DofUpdate::default()
                })
                .is_err()
        );
        assert!(
            params
                .apply(DofUpdate {
                    sample_count: Some(0),
                    ..DofUpdate::default()
                })
                .is_err()
        );
    }
}
