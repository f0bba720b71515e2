#![deny(unsafe_code)]
//! Engine registry and driver loop.
//!
//! This crate sits between `flamefield-core` (which defines the `Engine`
//! trait) and the engine crates (`flamefield-flame`, `flamefield-flow`).
//! It maps engine names to implementations, drives an engine for a number
//! of steps into any [`SampleSink`], and provides an in-memory
//! [`Accumulator`] for callers that want pixels.

pub mod accumulator;

pub use accumulator::Accumulator;

use flamefield_core::error::EngineError;
use flamefield_core::sample::SampleSink;
use flamefield_core::seed::Seed;
use flamefield_core::Engine;
use flamefield_flame::FlameEngine;
use flamefield_flow::FlowEngine;
use serde_json::Value;
use tracing::{debug, info};

/// All available engine names.
const ENGINE_NAMES: &[&str] = &["flame", "flow"];

/// Enumeration of all available engines.
///
/// Wraps each engine implementation and delegates `Engine` trait methods.
/// Use [`EngineKind::from_name`] for string-based construction.
pub enum EngineKind {
    /// Chaos-game fractal flames with depth of field.
    Flame(FlameEngine),
    /// Particles advected through a noise vector field.
    Flow(FlowEngine),
}

impl EngineKind {
    /// Constructs an engine by name.
    ///
    /// Returns `EngineError::UnknownEngine` if the name is not recognized.
    pub fn from_name(
        name: &str,
        width: usize,
        height: usize,
        seed: u64,
        params: &Value,
    ) -> Result<Self, EngineError> {
        match name {
            "flame" => Ok(EngineKind::Flame(FlameEngine::from_json(
                width, height, seed, params,
            )?)),
            "flow" => Ok(EngineKind::Flow(FlowEngine::from_json(
                width, height, seed, params,
            )?)),
            _ => Err(EngineError::UnknownEngine(name.to_string())),
        }
    }

    /// Validates `seed` and constructs the engine it names.
    pub fn from_seed(seed: &Seed) -> Result<Self, EngineError> {
        seed.validate()?;
        Self::from_name(&seed.engine, seed.width, seed.height, seed.seed, &seed.params)
    }

    /// Returns a slice of all recognized engine names.
    pub fn list_engines() -> &'static [&'static str] {
        ENGINE_NAMES
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Flame(_) => "flame",
            EngineKind::Flow(_) => "flow",
        }
    }
}

impl Engine for EngineKind {
    fn step(&mut self, sink: &mut dyn SampleSink) -> Result<(), EngineError> {
        match self {
            EngineKind::Flame(e) => e.step(sink),
            EngineKind::Flow(e) => e.step(sink),
        }
    }

    fn params(&self) -> Value {
        match self {
            EngineKind::Flame(e) => e.params(),
            EngineKind::Flow(e) => e.params(),
        }
    }

    fn param_schema(&self) -> Value {
        match self {
            EngineKind::Flame(e) => e.param_schema(),
            EngineKind::Flow(e) => e.param_schema(),
        }
    }
}

/// Advances `engine` by `steps` steps, pushing every sample into `sink`.
///
/// Stops at the first step that fails.
pub fn run(engine: &mut dyn Engine, steps: usize, sink: &mut dyn SampleSink) -> Result<(), EngineError> {
    for i in 0..steps {
        engine.step(sink)?;
        debug!(step = i + 1, of = steps, "engine step done");
    }
    Ok(())
}

/// Builds the engine named by `seed`, runs it for `seed.steps` steps and
/// returns the accumulated image.
pub fn render(seed: &Seed) -> Result<Accumulator, EngineError> {
    let mut engine = EngineKind::from_seed(seed)?;
    let mut acc = Accumulator::new(seed.width, seed.height)?;
    info!(
        engine = engine.name(),
        width = seed.width,
        height = seed.height,
        seed = seed.seed,
        steps = seed.steps,
        "rendering"
    );
    run(&mut engine, seed.steps, &mut acc)?;
    info!(hits = acc.hits(), missed = acc.missed(), "render finished");
    Ok(acc)
}
