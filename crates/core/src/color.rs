//! Sample colors and their conversion to sRGB.
//!
//! Engines emit colors as [`Hsba`] (all four channels in [0, 1]); the
//! accumulator converts them to [`Srgb`] before blending.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EngineError;

/// sRGB color with components in [0, 1].
///
/// Serializes as a hex string `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Hue, saturation, brightness and alpha, each in [0, 1].
///
/// Hue wraps: 0.0 and 1.0 are both red.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsba {
    pub hue: f64,
    pub saturation: f64,
    pub brightness: f64,
    pub alpha: f64,
}

impl Srgb {
    /// Neutral gray with every component equal to `level`.
    pub fn gray(level: f64) -> Self {
        Self {
            r: level,
            g: level,
            b: level,
        }
    }

    /// Parses `"#rrggbb"` or `"rrggbb"` (case insensitive).
    pub fn from_hex(hex: &str) -> Result<Srgb, EngineError> {
        let invalid = |reason: String| EngineError::InvalidParameter {
            name: "color".into(),
            reason,
        };
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid(format!("expected 6 hex digits in '{hex}'")));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| v as f64 / 255.0)
                .map_err(|e| invalid(format!("'{hex}': {e}")))
        };
        Ok(Srgb {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Formats as `"#rrggbb"`, clamping and rounding each channel to 8 bits.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Clamps and rounds each channel to a byte.
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }
}

impl Serialize for Srgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Srgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Srgb::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Hsba {
    pub fn new(hue: f64, saturation: f64, brightness: f64, alpha: f64) -> Self {
        Self {
            hue,
            saturation,
            brightness,
            alpha,
        }
    }

    /// Converts the color part to sRGB, ignoring alpha.
    pub fn to_srgb(self) -> Srgb {
        let h = self.hue.rem_euclid(1.0) * 6.0;
        let s = self.saturation.clamp(0.0, 1.0);
        let v = self.brightness.clamp(0.0, 1.0);

        let sector = (h.floor() as usize).min(5);
        let f = h - sector as f64;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match sector {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };
        Srgb { r, g, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn close(a: Srgb, b: Srgb) -> bool {
        (a.r - b.r).abs() < EPSILON && (a.g - b.g).abs() < EPSILON && (a.b - b.b).abs() < EPSILON
    }

    #[test]
    fn primary_hues_map_to_primaries() {
        let red = Hsba::new(0.0, 1.0, 1.0, 1.0).to_srgb();
        let green = Hsba::new(1.0 / 3.0, 1.0, 1.0, 1.0).to_srgb();
        let blue = Hsba::new(2.0 / 3.0, 1.0, 1.0, 1.0).to_srgb();
        assert!(close(red, Srgb { r: 1.0, g: 0.0, b: 0.0 }), "{red:?}");
        assert!(close(green, Srgb { r: 0.0, g: 1.0, b: 0.0 }), "{green:?}");
        assert!(close(blue, Srgb { r: 0.0, g: 0.0, b: 1.0 }), "{blue:?}");
    }

    #[test]
    fn hue_wraps_at_one() {
        let a = Hsba::new(0.0, 0.7, 0.9, 1.0).to_srgb();
        let b = Hsba::new(1.0, 0.7, 0.9, 1.0).to_srgb();
        assert!(close(a, b));
    }

    #[test]
    fn zero_saturation_is_gray() {
        let c = Hsba::new(0.42, 0.0, 0.6, 1.0).to_srgb();
        assert!(close(c, Srgb::gray(0.6)));
    }

    #[test]
    fn hex_round_trip() {
        let c = Srgb::from_hex("#0a1420").unwrap();
        assert_eq!(c.to_hex(), "#0a1420");
        assert_eq!(Srgb::from_hex("0A1420").unwrap().to_hex(), "#0a1420");
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(Srgb::from_hex("#12345").is_err());
        assert!(Srgb::from_hex("#zzzzzz").is_err());
        assert!(Srgb::from_hex("#ééé").is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let json = serde_json::to_string(&Srgb::gray(1.0)).unwrap();
        assert_eq!(json, "\"#ffffff\"");
        let back: Srgb = serde_json::from_str("\"#000000\"").unwrap();
        assert_eq!(back, Srgb::gray(0.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn hsb_conversion_stays_in_unit_cube(
                h in -2.0_f64..2.0,
                s in 0.0_f64..=1.0,
                v in 0.0_f64..=1.0,
            ) {
                let c = Hsba::new(h, s, v, 1.0).to_srgb();
                for ch in [c.r, c.g, c.b] {
                    prop_assert!((-EPSILON..=1.0 + EPSILON).contains(&ch), "{c:?}");
                }
            }

            #[test]
            fn brightest_channel_equals_brightness(
                h in 0.0_f64..1.0,
                s in 0.0_f64..=1.0,
                v in 0.0_f64..=1.0,
            ) {
                let c = Hsba::new(h, s, v, 1.0).to_srgb();
                let max = c.r.max(c.g).max(c.b);
                prop_assert!((max - v).abs() < EPSILON);
            }
        }
    }
}
