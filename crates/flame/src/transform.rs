//! A transform: pre-affine map, weighted blend of variations, post-affine map.

use flamefield_core::affine::Affine;
use flamefield_core::error::EngineError;
use flamefield_core::prng::Xorshift64;
use flamefield_core::variation::Variation;
use flamefield_core::DVec3;

/// Smallest and largest number of variations in a random transform.
pub const MIN_VARIATIONS: usize = 1;
pub const MAX_VARIATIONS: usize = 7;

/// Weight added to one randomly chosen bucket per increment.
const WEIGHT_STEP: f64 = 0.05;
/// Number of increments needed to reach a total weight of 1.
const WEIGHT_STEPS: usize = 20;

/// One node of a chaos-game system.
///
/// The pre-affine map is applied once and the same mapped point feeds every
/// variation; their weighted sum then goes through the post-affine map.
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pre: Affine,
    post: Affine,
    terms: Vec<(Variation, f64)>,
}

impl Transform {
    /// Builds a transform from explicit parts.
    ///
    /// Returns `EngineError::EmptyVariations` if `terms` is empty.
    pub fn new(pre: Affine, post: Affine, terms: Vec<(Variation, f64)>) -> Result<Self, EngineError> {
        if terms.is_empty() {
            return Err(EngineError::EmptyVariations);
        }
        if let Some((var, w)) = terms.iter().find(|(_, w)| !w.is_finite()) {
            return Err(EngineError::InvalidParameter {
                name: var.name().to_string(),
                reason: format!("weight {w} is not finite"),
            });
        }
        Ok(Self { pre, post, terms })
    }

    /// Draws a random transform.
    ///
    /// Picks 1 to 7 variations from `subset` (the whole catalog when empty),
    /// draws pre and post coefficients from ±[0, 1.2), and spreads a total
    /// weight of 1 across the variations in increments of 0.05, each
    /// increment going to a uniformly chosen variation.
    pub fn random(rng: &mut Xorshift64, subset: &[Variation]) -> Self {
        let len = rng.next_range(MIN_VARIATIONS as f64, (MAX_VARIATIONS + 1) as f64) as usize;
        let mut pre = [0.0; 12];
        let mut post = [0.0; 12];
        for (p, a) in post.iter_mut().zip(pre.iter_mut()) {
            *p = rng.next_signed(flamefield_core::affine::COEFFICIENT_RANGE);
            *a = rng.next_signed(flamefield_core::affine::COEFFICIENT_RANGE);
        }
        let vars: Vec<Variation> = (0..len).map(|_| Variation::choose(rng, subset)).collect();
        let weights = distribute_weights(rng, len, std::iter::repeat(WEIGHT_STEP).take(WEIGHT_STEPS));
        Self {
            pre: Affine::new(pre),
            post: Affine::new(post),
            terms: vars.into_iter().zip(weights).collect(),
        }
    }

    /// Maps `v` through the transform.
    #[inline]
    pub fn resolve(&self, v: DVec3) -> DVec3 {
        let mapped = self.pre.apply(v);
        let aux = self.pre.coefficients();
        let blended = self
            .terms
            .iter()
            .fold(DVec3::ZERO, |acc, &(var, w)| acc + w * var.apply(mapped, aux));
        self.post.apply(blended)
    }

    pub fn terms(&self) -> &[(Variation, f64)] {
        &self.terms
    }

    pub fn pre(&self) -> &Affine {
        &self.pre
    }

    pub fn post(&self) -> &Affine {
        &self.post
    }
}

/// Spreads `increments` over `buckets` weights, adding each increment to a
/// uniformly chosen bucket.
///
/// The result is deliberately not uniform: which buckets end up heavy depends
/// on the draw sequence, and with shrinking increments the first draws
/// dominate.
pub fn distribute_weights(
    rng: &mut Xorshift64,
    buckets: usize,
    increments: impl IntoIterator<Item = f64>,
) -> Vec<f64> {
    let mut weights = vec![0.0; buckets];
    if buckets == 0 {
        return weights;
    }
    for inc in increments {
        weights[rng.next_usize(buckets)] += inc;
    }
    weights
}
