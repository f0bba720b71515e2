#![deny(unsafe_code)]
//! Fractal flame engine.
//!
//! Runs many independent chaos-game systems side by side. Each system owns a
//! weighted set of [`Transform`]s plus a final transform and traces an
//! attractor; every point it visits is scattered by depth of field and
//! projected into screen samples colored with the system's hue.
//!
//! Camera placement, projection mode, the variation subset, DOF shape and
//! field of view are drawn from the run seed, and any of them can be
//! overridden through the JSON params.

pub mod chaos;
pub mod transform;

pub use chaos::{select_index, ChaosGame};
pub use transform::Transform;

use flamefield_core::camera::{Camera, Compositor, DepthOfField, Projection};
use flamefield_core::error::EngineError;
use flamefield_core::palette::Palette;
use flamefield_core::params::{param_bool, param_f64, param_f64_in, param_usize, param_variations};
use flamefield_core::prng::Xorshift64;
use flamefield_core::sample::SampleSink;
use flamefield_core::variation::Variation;
use flamefield_core::{DVec3, Engine};
use serde_json::{json, Value};
use tracing::debug;

/// Chaos-game systems per run.
const DEFAULT_SYSTEMS: usize = 20;
/// Chaos-game steps per system per engine step.
const DEFAULT_ITERATIONS: usize = 800;
/// DOF samples per visited point.
const DEFAULT_SAMPLES: usize = 10;
/// Alpha of a sample at camera distance 1 or closer.
const DEFAULT_ALPHA: f64 = 0.05;
/// Chance of the alternate, distance-scaled projection.
const SCALED_PROJECTION_CHANCE: f64 = 0.4;
/// Standard deviation of each camera coordinate.
const CAMERA_SPREAD: f64 = 0.35;
/// Bounds on the size of the run's variation subset.
const MIN_SUBSET: usize = 2;
const MAX_SUBSET: usize = 7;
/// Saturation boost and ceiling applied to system colors.
const SATURATION_BOOST: f64 = 0.2;
const SATURATION_CEILING: f64 = 0.8;

/// Run-level parameters of the flame engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FlameParams {
    pub camera: DVec3,
    pub projection: Projection,
    /// Variations the systems draw from. Empty means the whole catalog.
    pub variations: Vec<Variation>,
    pub systems: usize,
    pub iterations: usize,
    pub samples: usize,
    pub dof: DepthOfField,
    pub fov: f64,
    pub alpha: f64,
}

impl FlameParams {
    /// Draws every parameter from `rng`, then applies overrides from
    /// `params`.
    ///
    /// Recognized keys: `scaled_projection`, `camera_x`, `camera_y`,
    /// `camera_z`, `variations` (array of names), `systems`, `iterations`,
    /// `samples`, `dof_m`, `dof_e`, `focal`, `fov`, `alpha`.
    pub fn from_json(params: &Value, rng: &mut Xorshift64) -> Result<Self, EngineError> {
        let scaled = rng.next_f64() <= SCALED_PROJECTION_CHANCE;
        let camera = DVec3::new(
            rng.next_gaussian(0.0, CAMERA_SPREAD),
            rng.next_gaussian(0.0, CAMERA_SPREAD),
            rng.next_gaussian(0.0, CAMERA_SPREAD),
        );
        let subset_len = rng.next_range(MIN_SUBSET as f64, (MAX_SUBSET + 1) as f64) as usize;
        let drawn: Vec<Variation> = (0..subset_len).map(|_| Variation::random(rng)).collect();
        let m = rng.next_range(0.01, 0.0265);
        let e = rng.next_range(1.2, 2.1);
        let focal = rng.next_range(0.75, 1.75);
        let fov = rng.next_range(2.0, 6.0);

        let projection = if param_bool(params, "scaled_projection", scaled) {
            Projection::Scaled
        } else {
            Projection::Inverse
        };
        let systems = param_usize(params, "systems", DEFAULT_SYSTEMS);
        if systems == 0 {
            return Err(EngineError::InvalidParameter {
                name: "systems".into(),
                reason: "at least one chaos-game system is required".into(),
            });
        }
        Ok(Self {
            camera: DVec3::new(
                param_f64(params, "camera_x", camera.x),
                param_f64(params, "camera_y", camera.y),
                param_f64(params, "camera_z", camera.z),
            ),
            projection,
            variations: param_variations(params, "variations")?.unwrap_or(drawn),
            systems,
            iterations: param_usize(params, "iterations", DEFAULT_ITERATIONS),
            samples: param_usize(params, "samples", DEFAULT_SAMPLES),
            dof: DepthOfField {
                m: param_f64_in(params, "dof_m", m, 0.0, 1.0),
                e: param_f64_in(params, "dof_e", e, 0.0, 8.0),
                focal: param_f64_in(params, "focal", focal, 0.0, 100.0),
            },
            fov: param_f64(params, "fov", fov),
            alpha: param_f64_in(params, "alpha", DEFAULT_ALPHA, 0.0, 1.0),
        })
    }
}

/// One chaos-game system with its color.
#[derive(Debug, Clone)]
struct System {
    game: ChaosGame,
    hue: f64,
    saturation: f64,
}

/// Fractal flame engine: many chaos-game systems behind one DOF compositor.
pub struct FlameEngine {
    systems: Vec<System>,
    compositor: Compositor,
    palette: Palette,
    params: FlameParams,
    rng: Xorshift64,
    emitted: u64,
}

impl FlameEngine {
    /// Creates an engine for a `width` x `height` canvas.
    ///
    /// The palette and every system are drawn from `seed` after `params`.
    pub fn new(
        width: usize,
        height: usize,
        mut rng: Xorshift64,
        params: FlameParams,
    ) -> Result<Self, EngineError> {
        let compositor = Compositor::new(
            Camera {
                position: params.camera,
                fov: params.fov,
                projection: params.projection,
            },
            Some(params.dof),
            width,
            height,
            params.samples,
            params.alpha,
        )?;
        let palette = Palette::generate(&mut rng);
        let systems: Vec<System> = (0..params.systems)
            .map(|_| {
                let game = ChaosGame::random(&mut rng, &params.variations);
                let hue = palette.pick(rng.next_f64());
                let saturation = rng.next_f64();
                System {
                    game,
                    hue,
                    saturation,
                }
            })
            .collect();
        debug!(
            systems = systems.len(),
            variations = ?params.variations,
            projection = ?params.projection,
            m = params.dof.m,
            e = params.dof.e,
            focal = params.dof.focal,
            fov = params.fov,
            "built flame engine"
        );
        Ok(Self {
            systems,
            compositor,
            palette,
            params,
            rng,
            emitted: 0,
        })
    }

    /// Creates an engine from a JSON params object, drawing every missing
    /// parameter from `seed`.
    pub fn from_json(
        width: usize,
        height: usize,
        seed: u64,
        json_params: &Value,
    ) -> Result<Self, EngineError> {
        let mut rng = Xorshift64::new(seed);
        let params = FlameParams::from_json(json_params, &mut rng)?;
        Self::new(width, height, rng, params)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Current point of every system.
    pub fn points(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.systems.iter().map(|s| s.game.point())
    }

    /// Total reseeds across all systems.
    pub fn reseeds(&self) -> u64 {
        self.systems.iter().map(|s| s.game.reseeds()).sum()
    }

    /// Samples pushed since construction.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl Engine for FlameEngine {
    fn step(&mut self, sink: &mut dyn SampleSink) -> Result<(), EngineError> {
        let mut emitted = 0usize;
        for _ in 0..self.params.iterations {
            for system in &mut self.systems {
                let p = system.game.step(&mut self.rng);
                let saturation = (system.saturation + SATURATION_BOOST).min(SATURATION_CEILING);
                emitted += self
                    .compositor
                    .splat(p, system.hue, saturation, &mut self.rng, sink);
            }
        }
        self.emitted += emitted as u64;
        debug!(emitted, reseeds = self.reseeds(), "flame step");
        Ok(())
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "scaled_projection": p.projection == Projection::Scaled,
            "camera_x": p.camera.x,
            "camera_y": p.camera.y,
            "camera_z": p.camera.z,
            "variations": p.variations.iter().map(|v| v.name()).collect::<Vec<_>>(),
            "systems": p.systems,
            "iterations": p.iterations,
            "samples": p.samples,
            "dof_m": p.dof.m,
            "dof_e": p.dof.e,
            "focal": p.dof.focal,
            "fov": p.fov,
            "alpha": p.alpha,
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "scaled_projection": {
                "type": "bool",
                "default": "random, true with probability 0.4",
                "description": "Scale the perspective divide by distance instead of dividing by it"
            },
            "camera_x": {
                "type": "number",
                "default": "N(0, 0.35)",
                "description": "Camera x position"
            },
            "camera_y": {
                "type": "number",
                "default": "N(0, 0.35)",
                "description": "Camera y position"
            },
            "camera_z": {
                "type": "number",
                "default": "N(0, 0.35)",
                "description": "Camera z position"
            },
            "variations": {
                "type": "array",
                "items": Variation::ALL.iter().map(|v| v.name()).collect::<Vec<_>>(),
                "default": "2 to 7 random variations",
                "description": "Variations the systems draw from; empty means all"
            },
            "systems": {
                "type": "integer",
                "default": DEFAULT_SYSTEMS,
                "min": 1,
                "description": "Independent chaos-game systems"
            },
            "iterations": {
                "type": "integer",
                "default": DEFAULT_ITERATIONS,
                "min": 0,
                "description": "Chaos-game steps per system per engine step"
            },
            "samples": {
                "type": "integer",
                "default": DEFAULT_SAMPLES,
                "min": 1,
                "description": "Depth-of-field samples per point"
            },
            "dof_m": {
                "type": "number",
                "default": "U(0.01, 0.0265)",
                "min": 0.0,
                "max": 1.0,
                "description": "Blur radius multiplier"
            },
            "dof_e": {
                "type": "number",
                "default": "U(1.2, 2.1)",
                "min": 0.0,
                "max": 8.0,
                "description": "Blur radius exponent"
            },
            "focal": {
                "type": "number",
                "default": "U(0.75, 1.75)",
                "min": 0.0,
                "max": 100.0,
                "description": "Distance from the camera that is in focus"
            },
            "fov": {
                "type": "number",
                "default": "U(2, 6)",
                "description": "Field of view divisor; must be positive"
            },
            "alpha": {
                "type": "number",
                "default": DEFAULT_ALPHA,
                "min": 0.0,
                "max": 1.0,
                "description": "Sample alpha at distance 1 or closer"
            }
        })
    }
}
