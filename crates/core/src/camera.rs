//! Perspective projection, depth of field and the sample compositor.
//!
//! A 3D point is turned into one or more screen samples:
//!
//! 1. `d` = distance from the camera; alpha = `base_alpha / max(1, d)`.
//! 2. With depth of field, `samples` points are scattered uniformly inside a
//!    ball of radius `m * |f - d|^e` around the point; without it the point
//!    itself is the only sample.
//! 3. Each sample is projected by a perspective divide by `z - cam.z`,
//!    scaled by `1/d` ([`Projection::Inverse`]) or by `d`
//!    ([`Projection::Scaled`]), then mapped to pixels through the field of view.
//! 4. Samples outside a border margin are dropped. Each edge test adds a
//!    little Gaussian noise to the margin so the frame edge is soft.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::color::Hsba;
use crate::error::EngineError;
use crate::prng::Xorshift64;
use crate::sample::{Sample, SampleSink};

/// How the perspective-divided coordinate is scaled by camera distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// Divide by distance: distant points crowd toward the center.
    #[default]
    Inverse,
    /// Multiply by distance. Not physically meaningful, but produces a
    /// different family of images, so it is offered as an alternate mode.
    Scaled,
}

/// Camera position, field of view and projection mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: DVec3,
    pub fov: f64,
    pub projection: Projection,
}

impl Camera {
    /// Euclidean distance from the camera to `p`.
    pub fn distance(&self, p: DVec3) -> f64 {
        p.distance(self.position)
    }

    /// Projects `p` to pixel coordinates on a `width` x `height` canvas,
    /// using `d` as the distance term.
    ///
    /// Points in the camera's z plane project to non-finite coordinates,
    /// which every [`Border`] rejects.
    pub fn project(&self, p: DVec3, d: f64, width: f64, height: f64) -> (f64, f64) {
        let c = self.position;
        let depth = p.z - c.z;
        let factor = match self.projection {
            Projection::Inverse => 1.0 / d,
            Projection::Scaled => d,
        };
        let x = ((p.x - c.x) / depth * factor + c.x) * width / self.fov + width / 2.0;
        let y = ((p.y - c.y) / depth * factor + c.y) * height / self.fov + height / 2.0;
        (x, y)
    }
}

/// Depth-of-field shape: blur radius `m * |focal - d|^e`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthOfField {
    pub m: f64,
    pub e: f64,
    pub focal: f64,
}

impl DepthOfField {
    /// Scatter radius for a point at camera distance `d`. Zero at the focal
    /// distance and growing with `|focal - d|` for positive `e`.
    pub fn jitter_radius(&self, d: f64) -> f64 {
        self.m * (self.focal - d).abs().powf(self.e)
    }
}

/// Frame margin in pixels with Gaussian softness on each edge test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub margin: f64,
    pub softness: f64,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            margin: 100.0,
            softness: 2.0,
        }
    }
}

impl Border {
    /// Whether `(x, y)` falls inside the softened frame.
    ///
    /// The four edges are tested left, right, top, bottom, drawing one
    /// Gaussian per test and stopping at the first failing edge.
    pub fn contains(&self, x: f64, y: f64, width: f64, height: f64, rng: &mut Xorshift64) -> bool {
        let edge = |rng: &mut Xorshift64| self.margin + rng.next_gaussian(0.0, self.softness);
        x > edge(rng)
            && x < width - edge(rng)
            && y > edge(rng)
            && y < height - edge(rng)
    }
}

/// Turns 3D points into colored screen samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compositor {
    camera: Camera,
    dof: Option<DepthOfField>,
    border: Border,
    width: f64,
    height: f64,
    samples: usize,
    base_alpha: f64,
}

impl Compositor {
    /// Creates a compositor for a `width` x `height` canvas.
    ///
    /// With `dof` set, every point is scattered into `samples` samples;
    /// without it, every point yields at most one sample.
    pub fn new(
        camera: Camera,
        dof: Option<DepthOfField>,
        width: usize,
        height: usize,
        samples: usize,
        base_alpha: f64,
    ) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        if !(camera.fov.is_finite() && camera.fov > 0.0) {
            return Err(EngineError::InvalidParameter {
                name: "fov".into(),
                reason: format!("must be positive and finite, got {}", camera.fov),
            });
        }
        if !camera.position.is_finite() {
            return Err(EngineError::InvalidParameter {
                name: "camera".into(),
                reason: "position must be finite".into(),
            });
        }
        if dof.is_some() && samples == 0 {
            return Err(EngineError::InvalidParameter {
                name: "samples".into(),
                reason: "depth of field needs at least one sample per point".into(),
            });
        }
        Ok(Self {
            camera,
            dof,
            border: Border::default(),
            width: width as f64,
            height: height as f64,
            samples,
            base_alpha,
        })
    }

    /// Replaces the default 100 px / sigma 2 border.
    pub fn with_border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn dof(&self) -> Option<&DepthOfField> {
        self.dof.as_ref()
    }

    /// Alpha for a point at camera distance `d`.
    pub fn alpha(&self, d: f64) -> f64 {
        self.base_alpha / d.max(1.0)
    }

    /// Projects `p` and pushes every sample that survives the border test.
    /// Returns the number of samples pushed.
    pub fn splat(
        &self,
        p: DVec3,
        hue: f64,
        saturation: f64,
        rng: &mut Xorshift64,
        sink: &mut dyn SampleSink,
    ) -> usize {
        let d = self.camera.distance(p);
        let color = Hsba::new(hue, saturation, 1.0, self.alpha(d));
        match self.dof {
            Some(dof) => {
                let r = dof.jitter_radius(d);
                let mut emitted = 0;
                for _ in 0..self.samples {
                    let w = p + rng.next_in_sphere(r);
                    if self.emit(w, d, color, rng, sink) {
                        emitted += 1;
                    }
                }
                emitted
            }
            None => usize::from(self.emit(p, d, color, rng, sink)),
        }
    }

    fn emit(
        &self,
        w: DVec3,
        d: f64,
        color: Hsba,
        rng: &mut Xorshift64,
        sink: &mut dyn SampleSink,
    ) -> bool {
        let (x, y) = self.camera.project(w, d, self.width, self.height);
        if !self.border.contains(x, y, self.width, self.height, rng) {
            return false;
        }
        sink.push(Sample { x, y, color });
        true
    }
}
