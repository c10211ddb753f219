//! Time-driven scene animation.

use crate::scene::Scene;
use crate::wave::wave;

/// A cosine oscillation between two values, sampled by elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct WaveTrack {
    pub low: f32,
    pub high: f32,
    /// Oscillation rate in radians per second.
    pub frequency: f32,
}

impl WaveTrack {
    pub fn new(low: f32, high: f32, frequency: f32) -> Self {
        Self {
            low,
            high,
            frequency,
        }
    }

    /// Value of the track at `time` seconds.
    pub fn sample(&self, time: f32) -> f32 {
        wave(self.low, self.high, time, self.frequency)
    }
}

/// Drives the scene's point light up and down over time, and optionally
/// sweeps the focal plane.
pub struct Animator {
    light_height: WaveTrack,
    focus_sweep: Option<WaveTrack>,
}

impl Animator {
    pub fn new(light_height: WaveTrack) -> Self {
        Self {
            light_height,
            focus_sweep: None,
        }
    }

    /// Also oscillate the depth-of-field focal plane along `track`.
    pub fn with_focus_sweep(mut self, track: WaveTrack) -> Self {
        self.focus_sweep = Some(track);
        self
    }

    /// The focal-plane track, if one was configured.
    pub fn focus_sweep(&self) -> Option<WaveTrack> {
        self.focus_sweep
    }

    /// Advances the scene to `time` seconds. Stateless in `time`, so frames
    /// may be skipped or replayed without drift.
    pub fn step(&self, scene: &mut Scene, time: f32) {
        scene.light.position.y = self.light_height.sample(time);
    }
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(WaveTrack::new(3.0, -3.0, 0.25))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_stays_in_range() {
        let track = WaveTrack::new(3.0, -3.0, 0.25);
        for i in 0..1000 {
            let v = track.sample(i as f32 * 0.1);
            assert!((-3.0..=3.0).contains(&v), "out of range at sample {i}: {v}");
        }
    }

    #[test]
    fn step_moves_only_the_light_height() {
        let mut scene = Scene::new();
        let x = scene.light.position.x;
        let z = scene.light.position.z;

        let animator = Animator::default();
        animator.step(&mut scene, 1.7);

        assert_eq!(scene.light.position.x, x);
        assert_eq!(scene.light.position.z, z);
        assert_eq!(
            scene.light.position.y,
            WaveTrack::new(3.0, -3.0, 0.25).sample(1.7)
        );
    }

    #[test]
    fn step_is_deterministic_in_time() {
        let animator = Animator::default();
        let mut a = Scene::new();
        let mut b = Scene::new();

        animator.step(&mut a, 0.5);
        animator.step(&mut a, 2.0);
        animator.step(&mut b, 2.0);

        assert_eq!(a.light.position.y, b.light.position.y);
    }
}
