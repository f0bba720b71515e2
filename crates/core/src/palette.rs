//! The run palette: a handful of hues chosen once per run.
//!
//! Every color an engine emits indexes into these hues. Hues are fractions
//! of a full turn in [0, 1).

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::prng::Xorshift64;

/// An ordered set of hues in [0, 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    hues: Vec<f64>,
}

impl Palette {
    /// Creates a palette from explicit hues, wrapping each into [0, 1).
    ///
    /// Requires at least one hue, and every hue must be finite.
    pub fn new(hues: Vec<f64>) -> Result<Self, EngineError> {
        if hues.is_empty() {
            return Err(EngineError::InvalidPalette(
                "palette requires at least 1 hue".to_string(),
            ));
        }
        if let Some(bad) = hues.iter().find(|h| !h.is_finite()) {
            return Err(EngineError::InvalidPalette(format!(
                "hue {bad} is not finite"
            )));
        }
        Ok(Self {
            hues: hues.into_iter().map(normalize_hue).collect(),
        })
    }

    /// Draws the standard three-hue run palette: a base hue, a near
    /// complement offset by 0.4 to 0.6 of a turn, and one free accent.
    pub fn generate(rng: &mut Xorshift64) -> Self {
        let base = rng.next_f64();
        let complement = normalize_hue(base + rng.next_range(0.4, 0.6));
        let accent = rng.next_f64();
        Self {
            hues: vec![base, complement, accent],
        }
    }

    pub fn hues(&self) -> &[f64] {
        &self.hues
    }

    pub fn len(&self) -> usize {
        self.hues.len()
    }

    /// Always false for a constructed palette.
    pub fn is_empty(&self) -> bool {
        self.hues.is_empty()
    }

    /// Picks the hue at index `floor(t * len)`, with `t` clamped to [0, 1].
    pub fn pick(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let idx = ((t * self.hues.len() as f64) as usize).min(self.hues.len() - 1);
        self.hues[idx]
    }
}

fn normalize_hue(h: f64) -> f64 {
    let wrapped = h.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
