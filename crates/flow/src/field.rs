//! Noise-driven vector field over 3D space.
//!
//! Three decorrelated fractal-noise channels are read as azimuth, cosine of
//! the polar angle and a cube-rooted radius, so each sample is a point
//! inside the unit ball with uniform volumetric density.

use flamefield_core::prng::spherical_to_cartesian;
use flamefield_core::DVec3;
use noise::{NoiseFn, OpenSimplex};
use std::f64::consts::TAU;

/// Spatial scale applied to positions before sampling.
pub const DEFAULT_SCALE: f64 = 0.25;
/// Octaves summed per noise channel.
pub const DEFAULT_OCTAVES: u32 = 2;

/// Seed offsets of the polar and radius channels.
const COS_THETA_OFFSET: f64 = 100.0;
const RADIUS_OFFSET: f64 = 1000.0;

/// Multi-octave 4D OpenSimplex noise with the seed as the fourth axis.
pub struct NoiseField {
    noise: OpenSimplex,
    seed: f64,
    scale: f64,
    octaves: u32,
}

impl NoiseField {
    pub fn new(seed: f64, scale: f64, octaves: u32) -> Self {
        Self {
            noise: OpenSimplex::new(seed as u32),
            seed,
            scale,
            octaves,
        }
    }

    pub fn seed(&self) -> f64 {
        self.seed
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn octaves(&self) -> u32 {
        self.octaves
    }

    /// Fractal noise at `p` in [0, 1].
    ///
    /// Octave `i` has amplitude `2^-i` and frequency `2^i`; each octave is
    /// mapped into [0, 1] before summing, and the sum is capped at 1.
    pub fn noise(&self, p: DVec3, seed_offset: f64) -> f64 {
        let w = self.seed + seed_offset;
        let (sum, _, _) = (0..self.octaves).fold((0.0, 1.0, 1.0), |(sum, amp, freq), _| {
            let n = self.noise.get([p.x * freq, p.y * freq, p.z * freq, w]);
            let unit = (n * 0.5 + 0.5).clamp(0.0, 1.0);
            (sum + amp * unit, amp * 0.5, freq * 2.0)
        });
        sum.min(1.0)
    }

    /// Field value at `v`: a point inside the unit ball.
    pub fn sample(&self, v: DVec3) -> DVec3 {
        let p = v * self.scale;
        let phi = self.noise(p, 0.0) * TAU;
        let cos_theta = self.noise(p, COS_THETA_OFFSET) * 2.0 - 1.0;
        let u = self.noise(p, RADIUS_OFFSET);
        spherical_to_cartesian(phi, cos_theta, u.cbrt())
    }
}
