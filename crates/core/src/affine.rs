//! Twelve-coefficient affine map on 3D points.
//!
//! Coefficients are stored row-major as a 3x4 matrix `[a b c d | e f g h | i j k l]`,
//! mapping `(x, y, z)` to `(ax + by + cz + d, ex + fy + gz + h, ix + jy + kz + l)`.
//! The same twelve numbers double as the auxiliary coefficients read by the
//! `wave` and `popcorn` variations.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::prng::Xorshift64;

/// Number of coefficients in an [`Affine`] map.
pub const AFFINE_LEN: usize = 12;

/// Bound on the magnitude of randomly drawn coefficients.
pub const COEFFICIENT_RANGE: f64 = 1.2;

/// A 3x4 affine map: linear part plus translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    coefficients: [f64; AFFINE_LEN],
}

impl Affine {
    /// The map that leaves every point unchanged.
    pub const IDENTITY: Affine = Affine {
        coefficients: [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    };

    pub fn new(coefficients: [f64; AFFINE_LEN]) -> Self {
        Self { coefficients }
    }

    /// Draws every coefficient independently from ±U[0, 1.2).
    pub fn random(rng: &mut Xorshift64) -> Self {
        let mut coefficients = [0.0; AFFINE_LEN];
        for c in coefficients.iter_mut() {
            *c = rng.next_signed(COEFFICIENT_RANGE);
        }
        Self { coefficients }
    }

    pub fn coefficients(&self) -> &[f64; AFFINE_LEN] {
        &self.coefficients
    }

    /// Applies the map to `v`.
    #[inline]
    pub fn apply(&self, v: DVec3) -> DVec3 {
        let a = &self.coefficients;
        DVec3::new(
            v.x * a[0] + v.y * a[1] + v.z * a[2] + a[3],
            v.x * a[4] + v.y * a[5] + v.z * a[6] + a[7],
            v.x * a[8] + v.y * a[9] + v.z * a[10] + a[11],
        )
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}
