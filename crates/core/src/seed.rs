//! Reproducible specification for one run.
//!
//! A [`Seed`] is what the configuration collaborator hands the engine: which
//! engine to build, the canvas size, parameter overrides, the PRNG seed and
//! how many engine steps to drive.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Everything needed to reproduce a run.
///
/// Two identical `Seed` values fed to the same build produce bit-identical
/// sample streams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seed {
    pub engine: String,
    pub width: usize,
    pub height: usize,
    #[serde(default = "empty_params")]
    pub params: serde_json::Value,
    pub seed: u64,
    #[serde(default)]
    pub steps: usize,
}

fn empty_params() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Seed {
    /// Creates a Seed with no parameter overrides and zero steps.
    pub fn new(engine: &str, width: usize, height: usize, seed: u64) -> Self {
        Self {
            engine: engine.to_string(),
            width,
            height,
            params: empty_params(),
            seed,
            steps: 0,
        }
    }

    /// Sets the number of engine steps (builder pattern).
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    /// Sets the parameter overrides (builder pattern).
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// Checks that the canvas is non-empty and `width * height` fits in `usize`,
    /// and that `params` is a JSON object.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        self.width
            .checked_mul(self.height)
            .ok_or(EngineError::InvalidDimensions)?;
        if !self.params.is_object() {
            return Err(EngineError::InvalidParameter {
                name: "params".into(),
                reason: "expected a JSON object".into(),
            });
        }
        Ok(())
    }
}
