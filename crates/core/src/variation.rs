//! The fixed catalog of fractal-flame variations, extended to 3D.
//!
//! Each variation is a pure map from a point to a point. The shared terms are
//! the radii `R = |(x, y, z)|`, `R1 = |(x, y)|`, `R2 = |(x, z)|` and the angle
//! terms `O = atan(y / x)`, `O2 = atan(z / x)`. Any denominator that would be
//! zero is replaced with 1. Radii, trig arguments and `exp`/`cosh`/`sinh`
//! results saturate at `±f64::MAX`, as does every output component, so each
//! variation is finite for every finite input. `wave` and `popcorn`
//! additionally read twelve auxiliary coefficients, normally the pre-affine
//! coefficients of the owning transform.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::affine::AFFINE_LEN;
use crate::error::EngineError;
use crate::prng::Xorshift64;

/// One entry of the variation catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variation {
    Sinusoidal,
    Spiral,
    Swirl,
    Hyperbolic,
    Wave,
    Popcorn,
    Horseshoe,
    Handkerchief,
    Diamond,
    Cosine,
    Polar,
    Heart,
    Disc,
    Julia,
    Ex,
    Spherical,
    Power,
    Bent,
    Exponential,
}

/// Replaces a zero denominator with 1.
#[inline]
fn nonzero(d: f64) -> f64 {
    if d == 0.0 {
        1.0
    } else {
        d
    }
}

/// Clamps an overflowed intermediate back to the largest finite value.
#[inline]
fn saturate(x: f64) -> f64 {
    x.clamp(-f64::MAX, f64::MAX)
}

/// Radius and angle terms shared by most variations.
struct Polar3 {
    r: f64,
    r1: f64,
    r2: f64,
    o: f64,
    o2: f64,
}

impl Polar3 {
    #[inline]
    fn of(v: DVec3) -> Self {
        let x = nonzero(v.x);
        Self {
            r: saturate(v.x.hypot(v.y).hypot(v.z)),
            r1: saturate(v.x.hypot(v.y)),
            r2: saturate(v.x.hypot(v.z)),
            o: (v.y / x).atan(),
            o2: (v.z / x).atan(),
        }
    }
}

impl Variation {
    /// The whole catalog, in the order used for uniform random selection.
    pub const ALL: [Variation; 19] = [
        Variation::Sinusoidal,
        Variation::Spiral,
        Variation::Swirl,
        Variation::Hyperbolic,
        Variation::Wave,
        Variation::Popcorn,
        Variation::Horseshoe,
        Variation::Handkerchief,
        Variation::Diamond,
        Variation::Cosine,
        Variation::Polar,
        Variation::Heart,
        Variation::Disc,
        Variation::Julia,
        Variation::Ex,
        Variation::Spherical,
        Variation::Power,
        Variation::Bent,
        Variation::Exponential,
    ];

    /// Lowercase catalog name, as used in parameters and serialization.
    pub fn name(self) -> &'static str {
        match self {
            Variation::Sinusoidal => "sinusoidal",
            Variation::Spiral => "spiral",
            Variation::Swirl => "swirl",
            Variation::Hyperbolic => "hyperbolic",
            Variation::Wave => "wave",
            Variation::Popcorn => "popcorn",
            Variation::Horseshoe => "horseshoe",
            Variation::Handkerchief => "handkerchief",
            Variation::Diamond => "diamond",
            Variation::Cosine => "cosine",
            Variation::Polar => "polar",
            Variation::Heart => "heart",
            Variation::Disc => "disc",
            Variation::Julia => "julia",
            Variation::Ex => "ex",
            Variation::Spherical => "spherical",
            Variation::Power => "power",
            Variation::Bent => "bent",
            Variation::Exponential => "exponential",
        }
    }

    /// Whether this variation reads the auxiliary coefficients.
    pub fn uses_coefficients(self) -> bool {
        matches!(self, Variation::Wave | Variation::Popcorn)
    }

    /// Draws uniformly from the full catalog.
    pub fn random(rng: &mut Xorshift64) -> Self {
        Self::ALL[rng.next_usize(Self::ALL.len())]
    }

    /// Draws uniformly from `subset`, or from the full catalog when `subset`
    /// is empty.
    pub fn choose(rng: &mut Xorshift64, subset: &[Variation]) -> Self {
        if subset.is_empty() {
            Self::random(rng)
        } else {
            subset[rng.next_usize(subset.len())]
        }
    }

    /// Evaluates the variation at `v`.
    ///
    /// `aux` is only read by `wave` and `popcorn`.
    pub fn apply(self, v: DVec3, aux: &[f64; AFFINE_LEN]) -> DVec3 {
        let (x, y, z) = (v.x, v.y, v.z);
        let out = match self {
            Variation::Sinusoidal => DVec3::new(x.sin(), y.sin(), z.sin()),
            Variation::Spherical => v / nonzero(v.length_squared()),
            Variation::Spiral => {
                let p = Polar3::of(v);
                DVec3::new(
                    p.o.cos() + p.r.sin(),
                    p.o.sin() - p.r.cos(),
                    p.o2.cos() + p.r.sin(),
                ) / nonzero(p.r)
            }
            Variation::Swirl => {
                let (s, c) = saturate(v.length_squared()).sin_cos();
                DVec3::new(x * s - y * c, x * c + y * s, x * c - z * s)
            }
            Variation::Disc => {
                let p = Polar3::of(v);
                let (s, c) = saturate(PI * p.r).sin_cos();
                DVec3::new(p.o / PI * s, p.o / PI * c, p.o2 / PI * c)
            }
            Variation::Hyperbolic => {
                let p = Polar3::of(v);
                let r = nonzero(p.r);
                DVec3::new(p.o.sin() / r, p.r * p.o.cos(), p.o2.sin() / r)
            }
            Variation::Julia => {
                let p = Polar3::of(v);
                DVec3::new((p.o / 2.0).cos(), (p.o / 2.0).sin(), (p.o2 / 2.0).sin()) * p.r.sqrt()
            }
            Variation::Wave => DVec3::new(
                x + aux[1] * saturate(y / nonzero(aux[2] * aux[2])).sin(),
                y + aux[3] * saturate(x / nonzero(aux[4] * aux[4])).sin(),
                z + aux[5] * saturate(z / nonzero(aux[6] * aux[6])).sin(),
            ),
            Variation::Popcorn => DVec3::new(
                x + aux[1] * saturate(3.0 * y).tan().sin(),
                y + aux[2] * saturate(3.0 * z).tan().sin(),
                z + aux[3] * saturate(3.0 * x).tan().sin(),
            ),
            Variation::Horseshoe => {
                let p = Polar3::of(v);
                DVec3::new(
                    saturate(x - y) * saturate(x + y),
                    2.0 * x * y,
                    saturate(x - z) * saturate(x + z),
                ) / nonzero(p.r)
            }
            Variation::Polar => {
                let p = Polar3::of(v);
                DVec3::new(p.o / PI, p.r - 1.0, p.o2 / PI)
            }
            Variation::Handkerchief => {
                let p = Polar3::of(v);
                DVec3::new((p.o + p.r).sin(), (p.o - p.r).cos(), (p.o2 + p.r).sin()) * p.r
            }
            Variation::Heart => {
                let p = Polar3::of(v);
                DVec3::new(
                    saturate(p.o * p.r1).sin(),
                    -saturate(p.o * p.r1).cos(),
                    -saturate(p.o2 * p.r2).cos(),
                ) * p.r
            }
            Variation::Diamond => {
                let p = Polar3::of(v);
                let (sr, cr) = p.r.sin_cos();
                DVec3::new(p.o.sin() * cr, p.o.cos() * sr, p.o2.sin() * cr)
            }
            Variation::Ex => {
                let p = Polar3::of(v);
                let p0 = (p.o + p.r).sin().powi(3);
                let p1 = (p.o - p.r).cos().powi(3);
                let p2 = (p.o2 + p.r).sin().powi(3);
                let p3 = (p.o2 - p.r).cos().powi(3);
                DVec3::new(p0 + p1, p0 - p1, p2 - p3) * p.r
            }
            Variation::Cosine => {
                let (s, c) = saturate(PI * x).sin_cos();
                DVec3::new(c * saturate(y.cosh()), -s * saturate(y.sinh()), x.sin())
            }
            Variation::Power => {
                let p = Polar3::of(v);
                DVec3::new(p.o.cos(), p.o.sin(), p.o2.cos()) * saturate(p.r.powf(p.o.sin()))
            }
            Variation::Bent => match (x >= 0.0, y >= 0.0) {
                (true, true) => v,
                (false, true) => DVec3::new(2.0 * x, y, 2.0 * z),
                (true, false) => DVec3::new(x, y / 2.0, z / 2.0),
                (false, false) => DVec3::new(2.0 * x, y / 2.0, z),
            },
            Variation::Exponential => {
                let ex = saturate((x - 1.0).exp());
                let (s, c) = saturate(PI * y).sin_cos();
                DVec3::new(
                    ex * c,
                    ex * s,
                    saturate((y - 1.0).exp()) * saturate(PI * z).sin(),
                )
            }
        };
        out.clamp(DVec3::splat(-f64::MAX), DVec3::splat(f64::MAX))
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::UnknownVariation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_AUX: [f64; AFFINE_LEN] = [0.0; AFFINE_LEN];

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-12
    }

    #[test]
    fn catalog_has_nineteen_distinct_names() {
        let mut names: Vec<&str> = Variation::ALL.iter().map(|v| v.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 19);
    }

    #[test]
    fn names_parse_back_to_the_same_variation() {
        for v in Variation::ALL {
            assert_eq!(v.name().parse::<Variation>().unwrap(), v);
            assert_eq!(v.to_string(), v.name());
        }
        assert_eq!("  Julia ".parse::<Variation>().unwrap(), Variation::Julia);
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "butterfly".parse::<Variation>().unwrap_err();
        assert!(matches!(err, EngineError::UnknownVariation(name) if name == "butterfly"));
    }

    #[test]
    fn serde_uses_catalog_names() {
        let json = serde_json::to_string(&Variation::Handkerchief).unwrap();
        assert_eq!(json, "\"handkerchief\"");
        let back: Variation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Variation::Handkerchief);
    }

    #[test]
    fn only_wave_and_popcorn_read_coefficients() {
        let readers: Vec<Variation> = Variation::ALL
            .into_iter()
            .filter(|v| v.uses_coefficients())
            .collect();
        assert_eq!(readers, vec![Variation::Wave, Variation::Popcorn]);
    }

    #[test]
    fn sinusoidal_matches_componentwise_sine() {
        let v = DVec3::new(0.5, -1.0, 2.0);
        let out = Variation::Sinusoidal.apply(v, &NO_AUX);
        assert!(approx(out, DVec3::new(0.5_f64.sin(), (-1.0_f64).sin(), 2.0_f64.sin())));
    }

    #[test]
    fn spherical_inverts_radius() {
        let v = DVec3::new(2.0, 0.0, 0.0);
        let out = Variation::Spherical.apply(v, &NO_AUX);
        assert!(approx(out, DVec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn spherical_at_origin_substitutes_unit_denominator() {
        let out = Variation::Spherical.apply(DVec3::ZERO, &NO_AUX);
        assert_eq!(out, DVec3::ZERO);
    }

    #[test]
    fn polar_at_origin() {
        let out = Variation::Polar.apply(DVec3::ZERO, &NO_AUX);
        assert!(approx(out, DVec3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn angle_terms_use_unit_denominator_when_x_is_zero() {
        // O = atan(y / 1), O2 = atan(z / 1)
        let v = DVec3::new(0.0, 1.0, -1.0);
        let out = Variation::Polar.apply(v, &NO_AUX);
        let expected = DVec3::new(
            1.0_f64.atan() / PI,
            2.0_f64.sqrt() - 1.0,
            (-1.0_f64).atan() / PI,
        );
        assert!(approx(out, expected), "{out} vs {expected}");
    }

    #[test]
    fn bent_handles_each_quadrant() {
        let b = Variation::Bent;
        let v = DVec3::new(1.0, 1.0, 1.0);
        assert_eq!(b.apply(v, &NO_AUX), v);
        assert_eq!(
            b.apply(DVec3::new(-1.0, 1.0, 1.0), &NO_AUX),
            DVec3::new(-2.0, 1.0, 2.0)
        );
        assert_eq!(
            b.apply(DVec3::new(1.0, -1.0, 1.0), &NO_AUX),
            DVec3::new(1.0, -0.5, 0.5)
        );
        assert_eq!(
            b.apply(DVec3::new(-1.0, -1.0, 1.0), &NO_AUX),
            DVec3::new(-2.0, -0.5, 1.0)
        );
    }

    #[test]
    fn wave_reads_auxiliary_coefficients() {
        let mut aux = NO_AUX;
        aux[1] = 2.0;
        aux[2] = 1.0;
        let v = DVec3::new(0.0, PI / 2.0, 0.0);
        let out = Variation::Wave.apply(v, &aux);
        // x + 2 * sin(y / 1)
        assert!((out.x - 2.0).abs() < 1e-12, "{out}");
        assert_eq!(out.y, v.y);
    }

    #[test]
    fn wave_with_zero_coefficients_is_identity() {
        let v = DVec3::new(0.3, -0.7, 1.1);
        assert_eq!(Variation::Wave.apply(v, &NO_AUX), v);
    }

    #[test]
    fn popcorn_with_zero_coefficients_is_identity() {
        let v = DVec3::new(0.3, -0.7, 1.1);
        assert_eq!(Variation::Popcorn.apply(v, &NO_AUX), v);
    }

    #[test]
    fn every_variation_is_finite_at_origin_and_axes() {
        let degenerate = [
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::Z,
            DVec3::NEG_X,
            DVec3::new(0.0, -3.0, 2.0),
            DVec3::new(1e-300, 0.0, 0.0),
        ];
        let aux = [0.0, 0.5, 0.0, -0.5, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        for var in Variation::ALL {
            for v in degenerate {
                let out = var.apply(v, &aux);
                assert!(out.is_finite(), "{var} at {v} produced {out}");
            }
        }
    }

    #[test]
    fn every_variation_saturates_instead_of_overflowing() {
        let extreme = [
            DVec3::new(0.5, 800.0, 0.0),
            DVec3::new(800.0, 0.0, 0.0),
            DVec3::new(1e160, 0.0, 0.0),
            DVec3::new(-1e160, 1e160, -1e160),
            DVec3::splat(f64::MAX),
            DVec3::new(f64::MAX, -f64::MAX, f64::MAX),
            DVec3::new(1e-320, 0.0, 0.0),
        ];
        let aux = [0.0, 1.2, 1e-200, -1.2, f64::MAX, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        for var in Variation::ALL {
            for v in extreme {
                let out = var.apply(v, &aux);
                assert!(out.is_finite(), "{var} at {v} produced {out}");
            }
        }
    }

    #[test]
    fn cosine_saturates_large_hyperbolic_terms() {
        let out = Variation::Cosine.apply(DVec3::new(0.5, 800.0, 0.0), &NO_AUX);
        assert!(out.is_finite());
        assert!(out.y.abs() > 1e300, "{out}");
    }

    #[test]
    fn choose_respects_subset() {
        let mut rng = Xorshift64::new(4);
        let subset = [Variation::Heart, Variation::Ex];
        for _ in 0..200 {
            let v = Variation::choose(&mut rng, &subset);
            assert!(subset.contains(&v));
        }
    }

    #[test]
    fn choose_with_empty_subset_covers_catalog() {
        let mut rng = Xorshift64::new(9);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            seen.insert(Variation::choose(&mut rng, &[]));
        }
        assert_eq!(seen.len(), Variation::ALL.len());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn coord() -> impl Strategy<Value = f64> {
            prop_oneof![
                -100.0_f64..100.0,
                -1e-3_f64..1e-3,
                Just(0.0),
                prop::num::f64::POSITIVE
                    | prop::num::f64::NEGATIVE
                    | prop::num::f64::NORMAL
                    | prop::num::f64::SUBNORMAL
                    | prop::num::f64::ZERO,
            ]
        }

        fn point() -> impl Strategy<Value = DVec3> {
            (coord(), coord(), coord()).prop_map(|(x, y, z)| DVec3::new(x, y, z))
        }

        fn aux() -> impl Strategy<Value = [f64; AFFINE_LEN]> {
            prop::array::uniform12(prop_oneof![
                -1.2_f64..1.2,
                Just(0.0),
                prop::num::f64::POSITIVE
                    | prop::num::f64::NEGATIVE
                    | prop::num::f64::NORMAL
                    | prop::num::f64::SUBNORMAL,
            ])
        }

        proptest! {
            #[test]
            fn all_variations_finite_for_finite_input(v in point(), aux in aux()) {
                for var in Variation::ALL {
                    let out = var.apply(v, &aux);
                    prop_assert!(out.is_finite(), "{var} at {v} with {aux:?} produced {out}");
                }
            }

            #[test]
            fn variations_are_pure(v in point(), aux in aux()) {
                for var in Variation::ALL {
                    let a = var.apply(v, &aux);
                    let b = var.apply(v, &aux);
                    prop_assert_eq!(a.to_array().map(f64::to_bits), b.to_array().map(f64::to_bits));
                }
            }

            #[test]
            fn sinusoidal_is_bounded(v in point()) {
                let out = Variation::Sinusoidal.apply(v, &NO_AUX);
                prop_assert!(out.abs().max_element() <= 1.0);
            }
        }
    }
}
