//! Colour type, hex parsing, and perceptual helpers.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{GenError, Result};

/// An RGBA colour value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    /// Create a new colour from RGBA components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create a new opaque colour from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Fully transparent colour.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);

    /// White.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Parse a hex colour string.
    ///
    /// Accepts `#RGB`, `#RRGGBB` and `#RRGGBBAA`, with or without the `#`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return Err(invalid_hex(s));
        }

        match hex.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (slot, digit) in channels.iter_mut().zip(hex.chars()) {
                    let d = digit.to_digit(16).ok_or_else(|| invalid_hex(s))? as u8;
                    *slot = d << 4 | d;
                }
                Ok(Self::rgb(channels[0], channels[1], channels[2]))
            }
            6 => Ok(Self::rgb(
                parse_hex_byte(&hex[0..2], s)?,
                parse_hex_byte(&hex[2..4], s)?,
                parse_hex_byte(&hex[4..6], s)?,
            )),
            8 => Ok(Self::new(
                parse_hex_byte(&hex[0..2], s)?,
                parse_hex_byte(&hex[2..4], s)?,
                parse_hex_byte(&hex[4..6], s)?,
                parse_hex_byte(&hex[6..8], s)?,
            )),
            _ => Err(invalid_hex(s)),
        }
    }

    /// Convert to RGBA array.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Check if the colour is fully transparent.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Check if the colour is fully opaque.
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// The same colour with a different alpha.
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Weighted RGB distance.
    ///
    /// Uses the low-cost "redmean" approximation, which weights channels by
    /// the mean red value and tracks perception better than plain Euclidean
    /// distance. Alpha is ignored.
    pub fn distance(self, other: Colour) -> u32 {
        let rmean = (self.r as i32 + other.r as i32) / 2;
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;

        let r_weight = 512 + rmean;
        let b_weight = 767 - rmean;

        ((r_weight * dr * dr >> 8) + 4 * dg * dg + (b_weight * db * db >> 8)) as u32
    }

    /// Find the closest colour in `candidates`, if any.
    pub fn nearest(self, candidates: &[Colour]) -> Option<Colour> {
        candidates
            .iter()
            .copied()
            .min_by_key(|c| self.distance(*c))
    }

    /// Shift lightness in HSL space by `percent` (-100..=100).
    ///
    /// Positive values move toward white, negative toward black, relative to
    /// the remaining range. Alpha is preserved.
    pub fn shade(self, percent: f32) -> Colour {
        let rgb: Srgb<f32> = Srgb::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        );
        let mut hsl: Hsl = rgb.into_color();

        let delta = (percent / 100.0).clamp(-1.0, 1.0);
        if delta > 0.0 {
            hsl.lightness += (1.0 - hsl.lightness) * delta;
        } else {
            hsl.lightness += hsl.lightness * delta;
        }
        hsl.lightness = hsl.lightness.clamp(0.0, 1.0);

        let out: Srgb<f32> = hsl.into_color();
        Colour::new(
            (out.red * 255.0).round() as u8,
            (out.green * 255.0).round() as u8,
            (out.blue * 255.0).round() as u8,
            self.a,
        )
    }
}

impl From<Rgba<u8>> for Colour {
    fn from(p: Rgba<u8>) -> Self {
        Colour::new(p[0], p[1], p[2], p[3])
    }
}

impl From<Colour> for Rgba<u8> {
    fn from(c: Colour) -> Self {
        Rgba(c.to_rgba())
    }
}

impl FromStr for Colour {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Colour {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Colour {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Colour::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

fn invalid_hex(s: &str) -> GenError {
    GenError::Parse {
        message: format!("Invalid hex colour: {}", s),
        help: Some("Use #RGB, #RRGGBB, or #RRGGBBAA format".to_string()),
    }
}

fn parse_hex_byte(byte: &str, original: &str) -> Result<u8> {
    u8::from_str_radix(byte, 16).map_err(|_| invalid_hex(original))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_formats() {
        assert_eq!(Colour::from_hex("#FF0000").unwrap(), Colour::rgb(255, 0, 0));
        assert_eq!(Colour::from_hex("#ABC").unwrap(), Colour::rgb(0xAA, 0xBB, 0xCC));
        assert_eq!(
            Colour::from_hex("#FF000080").unwrap(),
            Colour::new(255, 0, 0, 128)
        );
        assert_eq!(Colour::from_hex("1a1a2e").unwrap(), Colour::rgb(0x1a, 0x1a, 0x2e));
    }

    #[test]
    fn test_from_hex_invalid() {
        assert!(Colour::from_hex("#GGG").is_err());
        assert!(Colour::from_hex("#12345").is_err());
        assert!(Colour::from_hex("").is_err());
        assert!(Colour::from_hex("#éé").is_err());
    }

    #[test]
    fn test_display_round_trips_through_serde() {
        let c = Colour::new(255, 0, 0, 128);
        assert_eq!(c.to_string(), "#FF000080");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"#FF000080\"");
        let back: Colour = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_distance_is_zero_for_equal_colours() {
        let c = Colour::rgb(12, 200, 40);
        assert_eq!(c.distance(c), 0);
        assert!(Colour::BLACK.distance(Colour::WHITE) > Colour::BLACK.distance(Colour::rgb(40, 40, 40)));
    }

    #[test]
    fn test_nearest() {
        let palette = [Colour::BLACK, Colour::WHITE, Colour::rgb(255, 0, 0)];
        assert_eq!(Colour::rgb(200, 30, 20).nearest(&palette), Some(Colour::rgb(255, 0, 0)));
        assert_eq!(Colour::rgb(240, 240, 240).nearest(&palette), Some(Colour::WHITE));
        assert_eq!(Colour::BLACK.nearest(&[]), None);
    }

    #[test]
    fn test_shade_lightens_and_darkens() {
        let base = Colour::rgb(200, 80, 40);
        let light = base.shade(40.0);
        let dark = base.shade(-40.0);
        let sum = |c: Colour| c.r as u32 + c.g as u32 + c.b as u32;
        assert!(sum(light) > sum(base));
        assert!(sum(dark) < sum(base));
        assert_eq!(base.with_alpha(10).shade(20.0).a, 10);
    }

    #[test]
    fn test_rgba_conversion() {
        let c = Colour::new(1, 2, 3, 4);
        let p: Rgba<u8> = c.into();
        assert_eq!(p.0, [1, 2, 3, 4]);
        assert_eq!(Colour::from(p), c);
    }
}
