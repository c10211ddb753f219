//! Cosine oscillators for animating scene parameters over time.
//!
//! Everything that moves in a scene, a light bobbing up and down or a focal
//! plane sweeping back and forth, is driven by [`wave`], a pure function
//! mapping elapsed time to a value bounded by `[low, high]`. Feed it a
//! monotonically increasing position (usually seconds since startup) once
//! per frame and it produces smooth periodic motion with no retained state.

/// Maps a position along a cosine wave into the range `[low, high]`.
///
/// Returns `low + amplitude + amplitude * cos(position * frequency)` where
/// `amplitude = (high - low) / 2`. At `position == 0` the result is `high`;
/// half a period later it is `low`. The function is total: any finite input
/// produces a finite output, and `low == high` yields that constant.
///
/// `frequency` is in radians per unit of `position`, so a full cycle takes
/// `2π / frequency`.
///
/// # Example
///
/// ```
/// use bokeh::wave;
///
/// // A light bobbing between y = -3 and y = 3, one cycle every ~25 seconds.
/// let y = wave(-3.0, 3.0, 1.5, 0.25);
/// assert!((-3.0..=3.0).contains(&y));
/// ```
pub fn wave(low: f32, high: f32, position: f32, frequency: f32) -> f32 {
    let amplitude = (high - low) / 2.0;
    low + amplitude + amplitude * (position * frequency).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_bounds() {
        for i in 0..1000 {
            let position = i as f32 * 0.173;
            let value = wave(-3.0, 3.0, position, 0.25);
            assert!((-3.0..=3.0).contains(&value), "out of range at {}", position);
        }
    }

    #[test]
    fn degenerate_range_is_constant() {
        for i in 0..100 {
            assert_eq!(wave(0.0, 0.0, i as f32 * 0.5, 1.0), 0.0);
        }
    }

    #[test]
    fn starts_at_high_and_reaches_low() {
        let high = wave(1.0, 5.0, 0.0, 1.0);
        assert!((high - 5.0).abs() < 1e-6);

        let low = wave(1.0, 5.0, std::f32::consts::PI, 1.0);
        assert!((low - 1.0).abs() < 1e-5);
    }

    #[test]
    fn periodic_in_two_pi_over_frequency() {
        let frequency = 0.5;
        let period = std::f32::consts::TAU / frequency;
        for i in 0..50 {
            let x = i as f32 * 0.31;
            let a = wave(-1.0, 1.0, x, frequency);
            let b = wave(-1.0, 1.0, x + period, frequency);
            assert!((a - b).abs() < 1e-4, "not periodic at {}", x);
        }
    }
}
