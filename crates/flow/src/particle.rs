//! A particle advected through the noise field.

use flamefield_core::palette::Palette;
use flamefield_core::DVec3;

use crate::field::NoiseField;
use crate::formula::Formula;

/// Positions are shrunk by this factor before the color noise lookup, so
/// neighbouring particles share colors in broad patches.
const COLOR_NOISE_SHRINK: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: DVec3,
    pub hue: f64,
    pub saturation: f64,
}

impl Particle {
    /// Places a particle at `pos`, coloring it from the field's noise at
    /// `pos / 5`: the noise value picks the palette hue and is also the
    /// saturation.
    pub fn new(pos: DVec3, field: &NoiseField, palette: &Palette) -> Self {
        let n = field.noise(pos / COLOR_NOISE_SHRINK, 0.0);
        Self {
            pos,
            hue: palette.pick(n),
            saturation: n,
        }
    }

    /// `pos += formula(field(pos)) * speed`.
    #[inline]
    pub fn update(&mut self, field: &NoiseField, formula: &Formula, speed: f64) {
        let v = formula.resolve(field.sample(self.pos));
        self.pos += v * speed;
    }
}
