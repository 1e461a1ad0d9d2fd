use serde::{Deserialize, Serialize};

use super::{ColorSpace, PackedColor};
use crate::error::{Error, Result};

/// An 8-bit sRGB color with opacity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub opacity: f64,
}

impl Rgb {
    /// Opaque color from 8-bit channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            opacity: 1.0,
        }
    }

    /// Color from 8-bit channels including alpha.
    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r,
            g,
            b,
            opacity: f64::from(a) / 255.0,
        }
    }

    /// Alpha as an 8-bit channel.
    pub fn alpha(&self) -> u8 {
        (self.opacity.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    /// Channels normalized to `[0, 1]`.
    pub(crate) fn normalized(&self) -> [f64; 3] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        ]
    }
}

/// The 8-bit sRGB space, packed as `0xRRGGBBAA`.
pub struct RgbSpace;

impl ColorSpace for RgbSpace {
    type Color = Rgb;

    fn encode(color: &Rgb) -> PackedColor {
        u32::from_be_bytes([color.r, color.g, color.b, color.alpha()])
    }

    fn decode(packed: PackedColor) -> Rgb {
        let [r, g, b, a] = packed.to_be_bytes();
        Rgb::from_rgba(r, g, b, a)
    }
}

impl RgbSpace {
    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex_string(color: &Rgb) -> String {
        let alpha = color.alpha();
        if alpha == u8::MAX {
            format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", color.r, color.g, color.b, alpha)
        }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (case-insensitive).
    pub fn from_hex_string(value: &str) -> Result<Rgb> {
        let invalid = || Error::InvalidColor(value.to_string());

        let digits = value.strip_prefix('#').ok_or_else(invalid)?;
        if !(digits.len() == 6 || digits.len() == 8) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        let r = channel(0)?;
        let g = channel(2)?;
        let b = channel(4)?;
        let a = if digits.len() == 8 { channel(6)? } else { u8::MAX };
        Ok(Rgb::from_rgba(r, g, b, a))
    }
}
