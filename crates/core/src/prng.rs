//! Deterministic PRNG based on the Xorshift64 algorithm.
//!
//! Every random draw in a run goes through one explicitly passed
//! [`Xorshift64`] handle, so the same seed reproduces the same image.

use std::f64::consts::TAU;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Xorshift64 deterministic PRNG. Same seed always produces the same sequence.
///
/// Uses shifts (13, 7, 17). A seed of 0 is replaced with a non-zero fallback
/// to avoid the all-zeros fixed point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    /// Creates a new PRNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Advances the state and returns the next 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Returns a uniformly distributed f64 in [0, 1), built from the upper
    /// 53 bits of `next_u64()`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Returns a uniformly distributed f64 in [min, max).
    pub fn next_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }

    /// Returns a uniformly distributed usize in [0, max).
    ///
    /// # Panics
    ///
    /// Panics if `max` is 0.
    pub fn next_usize(&mut self, max: usize) -> usize {
        (self.next_u64() as usize) % max
    }

    /// Returns -1.0 or 1.0. A draw at or below one half gives -1.
    pub fn next_sign(&mut self) -> f64 {
        if self.next_f64() <= 0.5 {
            -1.0
        } else {
            1.0
        }
    }

    /// Returns a value in (-max, max) whose magnitude is uniform in [0, max)
    /// and whose sign is a fair coin. Magnitude is drawn before sign.
    pub fn next_signed(&mut self, max: f64) -> f64 {
        let magnitude = self.next_range(0.0, max);
        magnitude * self.next_sign()
    }

    /// Returns a normally distributed f64 (Box-Muller, one value per call).
    pub fn next_gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // 1 - [0, 1) keeps the logarithm argument away from zero
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
    }

    /// Returns a point uniformly distributed inside the ball of `radius`.
    ///
    /// Draws azimuth, cos(polar angle) and a cube-rooted uniform radius, so
    /// density is uniform by volume rather than clustered at the center.
    pub fn next_in_sphere(&mut self, radius: f64) -> DVec3 {
        let phi = self.next_range(0.0, TAU);
        let cos_theta = self.next_range(-1.0, 1.0);
        let u = self.next_f64();
        spherical_to_cartesian(phi, cos_theta, radius * u.cbrt())
    }

    /// Returns a point uniformly distributed in the cube [-half, half)^3.
    pub fn next_in_cube(&mut self, half: f64) -> DVec3 {
        let x = self.next_range(-half, half);
        let y = self.next_range(-half, half);
        let z = self.next_range(-half, half);
        DVec3::new(x, y, z)
    }
}

/// Converts azimuth `phi`, `cos_theta` and radius to a Cartesian point.
///
/// `cos_theta` is clamped to [-1, 1] before `acos`.
pub fn spherical_to_cartesian(phi: f64, cos_theta: f64, radius: f64) -> DVec3 {
    let theta = cos_theta.clamp(-1.0, 1.0).acos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    DVec3::new(
        radius * sin_theta * phi.cos(),
        radius * sin_theta * phi.sin(),
        radius * cos_theta,
    )
}
