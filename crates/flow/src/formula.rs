//! Polish-notation formulas over the variation catalog.
//!
//! A formula is a short left-to-right list of `(variation, combinator)`
//! pairs. The first variation is applied to the input; each later entry
//! folds the accumulator with its variation:
//!
//! | combinator | accumulator becomes     |
//! |------------|-------------------------|
//! | `Apply`    | `variation(acc)`        |
//! | `Add`      | `acc + variation(v)`    |
//! | `Sub`      | `acc - variation(v)`    |
//! | `Mul`      | `acc * variation(v)`    |
//! | `Div`      | `acc / variation(v)`    |
//!
//! where `v` is always the original input. Division treats a zero
//! component of the divisor as 1.

use flamefield_core::affine::{Affine, AFFINE_LEN};
use flamefield_core::error::EngineError;
use flamefield_core::prng::Xorshift64;
use flamefield_core::variation::Variation;
use flamefield_core::DVec3;

/// Smallest and largest number of entries in a random formula.
pub const MIN_LEN: usize = 1;
pub const MAX_LEN: usize = 4;

/// How an entry folds its variation into the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Apply,
    Add,
    Sub,
    Mul,
    Div,
}

impl Combinator {
    pub const ALL: [Combinator; 5] = [
        Combinator::Apply,
        Combinator::Add,
        Combinator::Sub,
        Combinator::Mul,
        Combinator::Div,
    ];

    /// Draws a combinator uniformly.
    pub fn random(rng: &mut Xorshift64) -> Self {
        Self::ALL[rng.next_usize(Self::ALL.len())]
    }

    pub fn name(self) -> &'static str {
        match self {
            Combinator::Apply => "apply",
            Combinator::Add => "add",
            Combinator::Sub => "sub",
            Combinator::Mul => "mul",
            Combinator::Div => "div",
        }
    }
}

/// A fixed formula with its own auxiliary coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    entries: Vec<(Variation, Combinator)>,
    coefficients: [f64; AFFINE_LEN],
}

impl Formula {
    /// Returns `EngineError::EmptyFormula` if `entries` is empty.
    pub fn new(
        entries: Vec<(Variation, Combinator)>,
        coefficients: [f64; AFFINE_LEN],
    ) -> Result<Self, EngineError> {
        if entries.is_empty() {
            return Err(EngineError::EmptyFormula);
        }
        Ok(Self {
            entries,
            coefficients,
        })
    }

    /// Draws a formula of `len` entries (1 to 4 when `None`) from `subset`,
    /// followed by its twelve coefficients in ±[0, 1.2).
    ///
    /// Four entries are always drawn and the first `len` kept, so the length
    /// does not change how many values are taken from `rng`.
    pub fn random(rng: &mut Xorshift64, subset: &[Variation], len: Option<usize>) -> Result<Self, EngineError> {
        let drawn_len = length_from_unit(rng.next_f64());
        let mut entries: Vec<(Variation, Combinator)> = (0..MAX_LEN)
            .map(|_| (Variation::choose(rng, subset), Combinator::random(rng)))
            .collect();
        let coefficients = *Affine::random(rng).coefficients();
        let len = len.unwrap_or(drawn_len);
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(EngineError::InvalidParameter {
                name: "formula_length".into(),
                reason: format!("must be between {MIN_LEN} and {MAX_LEN}, got {len}"),
            });
        }
        entries.truncate(len);
        Self::new(entries, coefficients)
    }

    /// Evaluates the formula at `v`.
    pub fn resolve(&self, v: DVec3) -> DVec3 {
        let aux = &self.coefficients;
        let Some((&(first, _), rest)) = self.entries.split_first() else {
            return v;
        };
        rest.iter().fold(first.apply(v, aux), |acc, &(var, op)| match op {
            Combinator::Apply => var.apply(acc, aux),
            Combinator::Add => acc + var.apply(v, aux),
            Combinator::Sub => acc - var.apply(v, aux),
            Combinator::Mul => acc * var.apply(v, aux),
            Combinator::Div => acc / nonzero3(var.apply(v, aux)),
        })
    }

    pub fn entries(&self) -> &[(Variation, Combinator)] {
        &self.entries
    }

    pub fn coefficients(&self) -> &[f64; AFFINE_LEN] {
        &self.coefficients
    }
}

/// Maps a unit draw onto `MIN_LEN..=MAX_LEN`. The top of the unit interval
/// rounds up to `MAX_LEN + 1`, hence the clamp.
fn length_from_unit(u: f64) -> usize {
    let span = (MAX_LEN + 1 - MIN_LEN) as f64;
    ((MIN_LEN as f64 + u * span) as usize).min(MAX_LEN)
}

fn nonzero3(d: DVec3) -> DVec3 {
    let nz = |x: f64| if x == 0.0 { 1.0 } else { x };
    DVec3::new(nz(d.x), nz(d.y), nz(d.z))
}
