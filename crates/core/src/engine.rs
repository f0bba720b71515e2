//! The `Engine` trait shared by the flame and flow engines.
//!
//! The trait is object-safe so the driver can hold engines as `dyn Engine`.

use crate::error::EngineError;
use crate::sample::SampleSink;
use serde_json::Value;

/// A step-based generator of screen samples.
///
/// Each call to [`Engine::step`] advances every system or particle the engine
/// owns and pushes the resulting samples into `sink`. Engines hold their own
/// PRNG, so a sequence of steps is fully determined by the construction seed.
pub trait Engine {
    /// Advances the simulation by one step, emitting samples into `sink`.
    fn step(&mut self, sink: &mut dyn SampleSink) -> Result<(), EngineError>;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing the parameters, their types, ranges and defaults.
    fn param_schema(&self) -> Value;
}
