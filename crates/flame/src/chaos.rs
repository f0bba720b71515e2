//! The chaos game: a weighted set of transforms folded over a running point.

use flamefield_core::error::EngineError;
use flamefield_core::prng::Xorshift64;
use flamefield_core::variation::Variation;
use flamefield_core::DVec3;
use tracing::debug;

use crate::transform::{distribute_weights, Transform};

/// Smallest and largest number of transforms in a random system.
pub const MIN_TRANSFORMS: usize = 2;
pub const MAX_TRANSFORMS: usize = 14;

/// Total selection weight a random system stops at. Slightly short of 1,
/// so some draws fall off the end and land on transform 0.
pub const WEIGHT_TARGET: f64 = 0.99;

/// First increment of the halving weight schedule.
const FIRST_INCREMENT: f64 = 0.5;

/// Half-width of the cube a system's point is seeded and reseeded in.
const SEED_EXTENT: f64 = 1.0;

/// A chaos-game system.
///
/// Each [`ChaosGame::step`] picks a transform by weighted draw, folds the
/// running point through it and then through the final transform.
#[derive(Debug, Clone)]
pub struct ChaosGame {
    transforms: Vec<Transform>,
    weights: Vec<f64>,
    final_transform: Transform,
    point: DVec3,
    reseeds: u64,
}

impl ChaosGame {
    /// Builds a system from explicit parts and seeds its point uniformly in
    /// [-1, 1]³.
    ///
    /// Returns `EngineError::EmptyTransforms` if `transforms` is empty and
    /// `EngineError::WeightCountMismatch` if the weight list has a different
    /// length. Weights need not sum to 1.
    pub fn new(
        transforms: Vec<Transform>,
        weights: Vec<f64>,
        final_transform: Transform,
        rng: &mut Xorshift64,
    ) -> Result<Self, EngineError> {
        if transforms.is_empty() {
            return Err(EngineError::EmptyTransforms);
        }
        if transforms.len() != weights.len() {
            return Err(EngineError::WeightCountMismatch {
                transforms: transforms.len(),
                weights: weights.len(),
            });
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(EngineError::InvalidParameter {
                name: "weights".into(),
                reason: format!("weight {w} must be finite and non-negative"),
            });
        }
        Ok(Self {
            transforms,
            weights,
            final_transform,
            point: rng.next_in_cube(SEED_EXTENT),
            reseeds: 0,
        })
    }

    /// Draws a random system.
    ///
    /// Picks 2 to 14 transforms, then spreads selection weight over them with
    /// increments 0.5, 0.25, 0.125, ... until the total reaches 0.99, then
    /// draws the final transform and the starting point.
    pub fn random(rng: &mut Xorshift64, subset: &[Variation]) -> Self {
        let count = rng.next_range(MIN_TRANSFORMS as f64, (MAX_TRANSFORMS + 1) as f64) as usize;
        let transforms: Vec<Transform> = (0..count).map(|_| Transform::random(rng, subset)).collect();
        let weights = distribute_weights(rng, count, halving_increments(FIRST_INCREMENT, WEIGHT_TARGET));
        let final_transform = Transform::random(rng, subset);
        debug!(
            transforms = count,
            final_terms = final_transform.terms().len(),
            "built chaos game"
        );
        Self {
            transforms,
            weights,
            final_transform,
            point: rng.next_in_cube(SEED_EXTENT),
            reseeds: 0,
        }
    }

    /// Advances the system one step and returns the new point.
    #[inline]
    pub fn step(&mut self, rng: &mut Xorshift64) -> DVec3 {
        self.reseed_if_non_finite(rng);
        let idx = select_index(&self.weights, rng.next_f64());
        let p = self.transforms[idx].resolve(self.point);
        self.point = self.final_transform.resolve(p);
        self.point
    }

    /// Replaces a non-finite point with a fresh one in [-1, 1]³.
    /// Returns whether a reseed happened.
    pub fn reseed_if_non_finite(&mut self, rng: &mut Xorshift64) -> bool {
        if self.point.is_finite() {
            return false;
        }
        self.point = rng.next_in_cube(SEED_EXTENT);
        self.reseeds += 1;
        true
    }

    pub fn point(&self) -> DVec3 {
        self.point
    }

    /// Overwrites the running point.
    pub fn set_point(&mut self, point: DVec3) {
        self.point = point;
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn final_transform(&self) -> &Transform {
        &self.final_transform
    }

    /// How many times the point has been reseeded since construction.
    pub fn reseeds(&self) -> u64 {
        self.reseeds
    }
}

/// Selects an index by linear scan over `weights`: the first index whose
/// running total reaches `r`. A draw past the total selects index 0.
#[inline]
pub fn select_index(weights: &[f64], r: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if r <= cumulative {
            return i;
        }
    }
    0
}

/// Increments starting at `first` and halving each time, until their sum
/// reaches `target`.
fn halving_increments(first: f64, target: f64) -> Vec<f64> {
    let mut increments = Vec::new();
    let mut inc = first;
    let mut sum = 0.0;
    while sum < target && inc > 0.0 {
        increments.push(inc);
        sum += inc;
        inc *= 0.5;
    }
    increments
}
