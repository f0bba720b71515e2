//! In-memory additive image buffer that collects engine samples.
//!
//! Each sample adds `rgb * alpha` to the pixel it lands on, so repeated
//! hits brighten a pixel instead of replacing it. Conversion to RGBA8 adds
//! the background and clamps.

use flamefield_core::color::Srgb;
use flamefield_core::error::EngineError;
use flamefield_core::sample::{Sample, SampleSink};

/// Gray level of the default background, out of 255.
const DEFAULT_BACKGROUND: u8 = 20;

/// Additive float RGB buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    width: usize,
    height: usize,
    background: Srgb,
    data: Vec<[f64; 3]>,
    hits: u64,
    missed: u64,
}

impl Accumulator {
    /// Creates an empty buffer over a dark gray background.
    ///
    /// Returns `EngineError::InvalidDimensions` if either side is zero or
    /// the pixel count overflows.
    pub fn new(width: usize, height: usize) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let len = width
            .checked_mul(height)
            .ok_or(EngineError::InvalidDimensions)?;
        Ok(Self {
            width,
            height,
            background: Srgb::gray(f64::from(DEFAULT_BACKGROUND) / 255.0),
            data: vec![[0.0; 3]; len],
            hits: 0,
            missed: 0,
        })
    }

    /// Replaces the background color (builder pattern).
    pub fn with_background(mut self, background: Srgb) -> Self {
        self.background = background;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples that landed on the canvas.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Samples that fell outside the canvas or had non-finite coordinates.
    pub fn missed(&self) -> u64 {
        self.missed
    }

    /// Accumulated light at pixel `(x, y)`, without background.
    pub fn get(&self, x: usize, y: usize) -> Option<[f64; 3]> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    /// Adds `sample` to the pixel containing it.
    pub fn splat(&mut self, sample: &Sample) {
        let Some(idx) = self.index(sample.x, sample.y) else {
            self.missed += 1;
            return;
        };
        let rgb = sample.color.to_srgb();
        let a = sample.color.alpha;
        let px = &mut self.data[idx];
        px[0] += rgb.r * a;
        px[1] += rgb.g * a;
        px[2] += rgb.b * a;
        self.hits += 1;
    }

    /// Background plus accumulated light, clamped to bytes. Alpha is always
    /// 255. The buffer length is `width * height * 4`.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let bg = [self.background.r, self.background.g, self.background.b];
        self.data
            .iter()
            .flat_map(|px| {
                let channel = |i: usize| ((bg[i] + px[i]).clamp(0.0, 1.0) * 255.0).round() as u8;
                [channel(0), channel(1), channel(2), 255u8]
            })
            .collect()
    }

    fn index(&self, x: f64, y: f64) -> Option<usize> {
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        let (px, py) = (x.floor() as usize, y.floor() as usize);
        (px < self.width && py < self.height).then(|| py * self.width + px)
    }
}

impl SampleSink for Accumulator {
    fn push(&mut self, sample: Sample) {
        self.splat(&sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flamefield_core::color::Hsba;

    fn white(x: f64, y: f64, alpha: f64) -> Sample {
        Sample {
            x,
            y,
            color: Hsba::new(0.0, 0.0, 1.0, alpha),
        }
    }

    #[test]
    fn new_rejects_zero_dimensions() {
        assert!(matches!(
            Accumulator::new(0, 4),
            Err(EngineError::InvalidDimensions)
        ));
        assert!(Accumulator::new(4, 0).is_err());
    }

    #[test]
    fn to_rgba8_correct_length_and_background() {
        let acc = Accumulator::new(8, 4).unwrap();
        let buf = acc.to_rgba8();
        assert_eq!(buf.len(), 8 * 4 * 4);
        assert_eq!(&buf[..4], &[20, 20, 20, 255]);
    }

    #[test]
    fn repeated_hits_brighten_additively() {
        let mut acc = Accumulator::new(4, 4).unwrap().with_background(Srgb::gray(0.0));
        acc.splat(&white(1.5, 2.2, 0.25));
        acc.splat(&white(1.9, 2.9, 0.25));
        let px = acc.get(1, 2).unwrap();
        assert!((px[0] - 0.5).abs() < 1e-12);
        let buf = acc.to_rgba8();
        let i = (2 * 4 + 1) * 4;
        assert_eq!(buf[i], 128);
        assert_eq!(acc.hits(), 2);
    }

    #[test]
    fn saturates_at_white() {
        let mut acc = Accumulator::new(2, 2).unwrap();
        for _ in 0..10 {
            acc.splat(&white(0.0, 0.0, 0.5));
        }
        assert_eq!(&acc.to_rgba8()[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn hue_reaches_the_right_channel() {
        let mut acc = Accumulator::new(1, 1).unwrap().with_background(Srgb::gray(0.0));
        SampleSink::push(
            &mut acc,
            Sample {
                x: 0.5,
                y: 0.5,
                color: Hsba::new(0.0, 1.0, 1.0, 1.0),
            },
        );
        assert_eq!(acc.to_rgba8(), vec![255, 0, 0, 255]);
    }

    #[test]
    fn off_canvas_and_non_finite_samples_are_counted_as_missed() {
        let mut acc = Accumulator::new(4, 4).unwrap();
        acc.splat(&white(-0.5, 1.0, 1.0));
        acc.splat(&white(4.0, 1.0, 1.0));
        acc.splat(&white(1.0, f64::NAN, 1.0));
        acc.splat(&white(f64::INFINITY, 1.0, 1.0));
        assert_eq!(acc.missed(), 4);
        assert_eq!(acc.hits(), 0);
        assert_eq!(acc.get(4, 0), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_sample_is_either_hit_or_missed(
                x in -10.0_f64..20.0,
                y in -10.0_f64..20.0,
                alpha in 0.0_f64..1.0,
            ) {
                let mut acc = Accumulator::new(10, 10).unwrap();
                acc.splat(&white(x, y, alpha));
                prop_assert_eq!(acc.hits() + acc.missed(), 1);
                prop_assert_eq!(acc.to_rgba8().len(), 400);
            }
        }
    }
}
