#![deny(unsafe_code)]
//! Noise-driven particle flow engine.
//!
//! A lattice of particles fills a box in front of the camera. Every step,
//! each particle samples a fractal-noise vector field, warps the sample
//! through a random [`Formula`] and moves along the result. Particles leave
//! one sample per step, so the image accumulates their trails.

pub mod field;
pub mod formula;
pub mod particle;

pub use field::NoiseField;
pub use formula::{Combinator, Formula};
pub use particle::Particle;

use flamefield_core::camera::{Camera, Compositor, Projection};
use flamefield_core::error::EngineError;
use flamefield_core::palette::Palette;
use flamefield_core::params::{param_f64, param_f64_in, param_usize, param_variations};
use flamefield_core::prng::Xorshift64;
use flamefield_core::sample::SampleSink;
use flamefield_core::variation::Variation;
use flamefield_core::{DVec3, Engine};
use serde_json::{json, Value};
use tracing::debug;

/// Default camera distance behind the lattice.
const DEFAULT_CAMERA_Z: f64 = -4.0;
/// Standard deviation of the camera's x and y.
const CAMERA_SPREAD: f64 = 0.01;
const DEFAULT_FOV: f64 = 0.3;
const DEFAULT_ALPHA: f64 = 0.2;
const DEFAULT_SPACING: f64 = 0.15;
/// Smallest accepted lattice spacing; finer lattices hold millions of particles.
const MIN_SPACING: f64 = 0.05;
const SATURATION_BOOST: f64 = 0.2;
const SATURATION_CEILING: f64 = 0.8;

/// Lattice bounds per axis, inclusive.
const LATTICE_XY: (f64, f64) = (-4.0, 4.0);
const LATTICE_Z: (f64, f64) = (-2.0, 6.0);

/// Run-level parameters of the flow engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowParams {
    pub noise_seed: f64,
    pub camera: DVec3,
    pub fov: f64,
    pub speed: f64,
    /// Formula length; `None` keeps the drawn length.
    pub formula_length: Option<usize>,
    /// Variations the formula draws from. Empty means the whole catalog.
    pub variations: Vec<Variation>,
    pub noise_scale: f64,
    pub octaves: u32,
    pub spacing: f64,
    pub alpha: f64,
}

impl FlowParams {
    /// Draws the randomized parameters from `rng`, then applies overrides
    /// from `params`.
    ///
    /// Recognized keys: `noise_seed`, `camera_x`, `camera_y`, `camera_z`,
    /// `fov`, `speed`, `formula_length`, `variations`, `noise_scale`,
    /// `octaves`, `spacing`, `alpha`.
    pub fn from_json(params: &Value, rng: &mut Xorshift64) -> Result<Self, EngineError> {
        let noise_seed = rng.next_range(0.0, 1000.0);
        let cam_x = rng.next_gaussian(0.0, CAMERA_SPREAD);
        let cam_y = rng.next_gaussian(0.0, CAMERA_SPREAD);
        let speed = rng.next_range(0.015, 0.28);

        Ok(Self {
            noise_seed: param_f64(params, "noise_seed", noise_seed),
            camera: DVec3::new(
                param_f64(params, "camera_x", cam_x),
                param_f64(params, "camera_y", cam_y),
                param_f64(params, "camera_z", DEFAULT_CAMERA_Z),
            ),
            fov: param_f64(params, "fov", DEFAULT_FOV),
            speed: param_f64_in(params, "speed", speed, 0.0, 10.0),
            formula_length: params
                .get("formula_length")
                .map(|_| param_usize(params, "formula_length", 0)),
            variations: param_variations(params, "variations")?.unwrap_or_default(),
            noise_scale: param_f64_in(params, "noise_scale", field::DEFAULT_SCALE, 1e-6, 1e3),
            octaves: param_usize(params, "octaves", field::DEFAULT_OCTAVES as usize).min(16) as u32,
            spacing: param_f64_in(params, "spacing", DEFAULT_SPACING, MIN_SPACING, 8.0),
            alpha: param_f64_in(params, "alpha", DEFAULT_ALPHA, 0.0, 1.0),
        })
    }
}

/// Flow engine: a particle lattice advected through a noise field.
pub struct FlowEngine {
    particles: Vec<Particle>,
    field: NoiseField,
    formula: Formula,
    palette: Palette,
    compositor: Compositor,
    params: FlowParams,
    rng: Xorshift64,
    emitted: u64,
}

impl FlowEngine {
    /// Creates an engine for a `width` x `height` canvas, drawing the
    /// formula and palette from `rng` after `params`.
    pub fn new(
        width: usize,
        height: usize,
        mut rng: Xorshift64,
        params: FlowParams,
    ) -> Result<Self, EngineError> {
        let compositor = Compositor::new(
            Camera {
                position: params.camera,
                fov: params.fov,
                projection: Projection::Inverse,
            },
            None,
            width,
            height,
            1,
            params.alpha,
        )?;
        let formula = Formula::random(&mut rng, &params.variations, params.formula_length)?;
        let palette = Palette::generate(&mut rng);
        let field = NoiseField::new(params.noise_seed, params.noise_scale, params.octaves);
        let particles: Vec<Particle> = lattice(params.spacing)
            .map(|pos| Particle::new(pos, &field, &palette))
            .collect();
        debug!(
            particles = particles.len(),
            formula = ?formula.entries(),
            speed = params.speed,
            noise_seed = params.noise_seed,
            "built flow engine"
        );
        Ok(Self {
            particles,
            field,
            formula,
            palette,
            compositor,
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
        let params = FlowParams::from_json(json_params, &mut rng)?;
        Self::new(width, height, rng, params)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl Engine for FlowEngine {
    fn step(&mut self, sink: &mut dyn SampleSink) -> Result<(), EngineError> {
        let mut emitted = 0usize;
        for particle in &mut self.particles {
            particle.update(&self.field, &self.formula, self.params.speed);
            let saturation = (particle.saturation + SATURATION_BOOST).min(SATURATION_CEILING);
            emitted += self
                .compositor
                .splat(particle.pos, particle.hue, saturation, &mut self.rng, sink);
        }
        self.emitted += emitted as u64;
        debug!(emitted, particles = self.particles.len(), "flow step");
        Ok(())
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "noise_seed": p.noise_seed,
            "camera_x": p.camera.x,
            "camera_y": p.camera.y,
            "camera_z": p.camera.z,
            "fov": p.fov,
            "speed": p.speed,
            "formula_length": self.formula.entries().len(),
            "formula": self
                .formula
                .entries()
                .iter()
                .map(|(v, c)| json!([v.name(), c.name()]))
                .collect::<Vec<_>>(),
            "variations": p.variations.iter().map(|v| v.name()).collect::<Vec<_>>(),
            "noise_scale": p.noise_scale,
            "octaves": p.octaves,
            "spacing": p.spacing,
            "alpha": p.alpha,
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "noise_seed": {
                "type": "number",
                "default": "U(0, 1000)",
                "description": "Fourth noise coordinate; selects the field"
            },
            "camera_x": {
                "type": "number",
                "default": "N(0, 0.01)",
                "description": "Camera x position"
            },
            "camera_y": {
                "type": "number",
                "default": "N(0, 0.01)",
                "description": "Camera y position"
            },
            "camera_z": {
                "type": "number",
                "default": DEFAULT_CAMERA_Z,
                "description": "Camera z position"
            },
            "fov": {
                "type": "number",
                "default": DEFAULT_FOV,
                "description": "Field of view divisor; must be positive"
            },
            "speed": {
                "type": "number",
                "default": "U(0.015, 0.28)",
                "min": 0.0,
                "max": 10.0,
                "description": "Distance moved per step per unit field magnitude"
            },
            "formula_length": {
                "type": "integer",
                "default": "1 to 4",
                "min": formula::MIN_LEN,
                "max": formula::MAX_LEN,
                "description": "Entries in the warp formula"
            },
            "formula": {
                "type": "array",
                "description": "Read-only: the drawn (variation, combinator) pairs"
            },
            "variations": {
                "type": "array",
                "items": Variation::ALL.iter().map(|v| v.name()).collect::<Vec<_>>(),
                "default": [],
                "description": "Variations the formula draws from; empty means all"
            },
            "noise_scale": {
                "type": "number",
                "default": field::DEFAULT_SCALE,
                "min": 1e-6,
                "max": 1e3,
                "description": "Spatial scale of the vector field"
            },
            "octaves": {
                "type": "integer",
                "default": field::DEFAULT_OCTAVES,
                "min": 0,
                "max": 16,
                "description": "Noise octaves per field channel"
            },
            "spacing": {
                "type": "number",
                "default": DEFAULT_SPACING,
                "min": MIN_SPACING,
                "max": 8.0,
                "description": "Distance between neighbouring particles in the initial lattice"
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

/// Lattice points covering the particle box at `spacing`, x outermost.
///
/// Coordinates are computed from integer indices so every row has the same
/// length regardless of float rounding.
pub fn lattice(spacing: f64) -> impl Iterator<Item = DVec3> {
    let axis = move |(lo, hi): (f64, f64)| {
        let n = ((hi - lo) / spacing + 1e-9).floor() as usize + 1;
        (0..n).map(move |i| lo + i as f64 * spacing)
    };
    axis(LATTICE_XY).flat_map(move |x| {
        axis(LATTICE_XY).flat_map(move |y| axis(LATTICE_Z).map(move |z| DVec3::new(x, y, z)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flamefield_core::sample::{CountingSink, Sample};

    fn coarse(seed: u64) -> FlowEngine {
        FlowEngine::from_json(600, 600, seed, &json!({"spacing": 1.0})).unwrap()
    }

    #[test]
    fn lattice_matches_the_box() {
        let points: Vec<DVec3> = lattice(1.0).collect();
        assert_eq!(points.len(), 9 * 9 * 9);
        assert_eq!(points[0], DVec3::new(-4.0, -4.0, -2.0));
        assert_eq!(points[points.len() - 1], DVec3::new(4.0, 4.0, 6.0));
    }

    #[test]
    fn default_lattice_has_54_points_per_axis() {
        assert_eq!(lattice(DEFAULT_SPACING).count(), 54 * 54 * 54);
    }

    #[test]
    fn from_json_applies_defaults() {
        let engine = coarse(1);
        let p = engine.params();
        assert_eq!(p["fov"], DEFAULT_FOV);
        assert_eq!(p["camera_z"], DEFAULT_CAMERA_Z);
        assert_eq!(p["alpha"], DEFAULT_ALPHA);
        let speed = p["speed"].as_f64().unwrap();
        assert!((0.015..0.28).contains(&speed));
        let len = p["formula_length"].as_u64().unwrap() as usize;
        assert!((formula::MIN_LEN..=formula::MAX_LEN).contains(&len));
        assert_eq!(engine.particles().len(), 729);
    }

    #[test]
    fn overrides_do_not_shift_the_draw_sequence() {
        let plain = coarse(8);
        let tuned = FlowEngine::from_json(600, 600, 8, &json!({"spacing": 1.0, "speed": 0.1})).unwrap();
        assert_eq!(tuned.params()["speed"], 0.1);
        assert_eq!(plain.formula(), tuned.formula());
        assert_eq!(plain.palette(), tuned.palette());
    }

    #[test]
    fn formula_length_override() {
        let engine =
            FlowEngine::from_json(300, 300, 2, &json!({"spacing": 2.0, "formula_length": 3})).unwrap();
        assert_eq!(engine.formula().entries().len(), 3);
    }

    #[test]
    fn rejects_bad_formula_length() {
        let result = FlowEngine::from_json(300, 300, 2, &json!({"spacing": 2.0, "formula_length": 0}));
        assert!(matches!(result, Err(EngineError::InvalidParameter { .. })));
    }

    #[test]
    fn rejects_zero_dimensions() {
        let result = FlowEngine::from_json(300, 0, 2, &json!({"spacing": 2.0}));
        assert!(matches!(result, Err(EngineError::InvalidDimensions)));
    }

    #[test]
    fn step_emits_at_most_one_sample_per_particle() {
        let mut engine = coarse(3);
        let mut sink = CountingSink::default();
        engine.step(&mut sink).unwrap();
        assert!(sink.count <= engine.particles().len());
        assert_eq!(engine.emitted(), sink.count as u64);
    }

    #[test]
    fn samples_carry_particle_colors() {
        let mut engine = coarse(4);
        let mut sink: Vec<Sample> = Vec::new();
        engine.step(&mut sink).unwrap();
        for s in &sink {
            assert!(s.x > 90.0 && s.x < 510.0 && s.y > 90.0 && s.y < 510.0);
            assert!(engine.palette().hues().contains(&s.color.hue));
            assert!(s.color.saturation >= SATURATION_BOOST && s.color.saturation <= SATURATION_CEILING);
            assert!(s.color.alpha <= DEFAULT_ALPHA);
        }
    }

    #[test]
    fn bounded_formula_keeps_central_particles_in_view() {
        // a lone sinusoidal entry moves each particle at most `speed`
        let params = json!({"spacing": 1.0, "variations": ["sinusoidal"], "formula_length": 1});
        let mut engine = FlowEngine::from_json(600, 600, 9, &params).unwrap();
        let mut sink = CountingSink::default();
        engine.step(&mut sink).unwrap();
        assert!(sink.count > 0);
    }

    #[test]
    fn identical_seeds_emit_identical_samples() {
        let run = |seed| {
            let mut engine = coarse(seed);
            let mut sink: Vec<Sample> = Vec::new();
            for _ in 0..3 {
                engine.step(&mut sink).unwrap();
            }
            sink
        };
        assert_eq!(run(17), run(17));
    }

    #[test]
    fn param_schema_lists_every_param() {
        let engine = coarse(1);
        let params = engine.params();
        let schema = engine.param_schema();
        for key in params.as_object().unwrap().keys() {
            assert!(schema.get(key).is_some(), "schema missing {key}");
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn lattice_points_stay_in_the_box(spacing in 0.5_f64..8.0) {
                for p in lattice(spacing) {
                    prop_assert!((-4.0..=4.0 + 1e-9).contains(&p.x));
                    prop_assert!((-4.0..=4.0 + 1e-9).contains(&p.y));
                    prop_assert!((-2.0..=6.0 + 1e-9).contains(&p.z));
                }
            }
        }
    }
}
