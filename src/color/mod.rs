//! Colorimetry: a CIELab-backed color value and its conversions.
//!
//! [`Color`] stores L*a*b* (D65) plus opacity. Every other representation is derived:
//!
//! ```text
//! Lab -> XYZ (clipped) -> sRGB (clipped) -> HSL / hex / packed RGBA
//! ```
//!
//! Out-of-gamut Lab values therefore map to the nearest in-gamut sRGB color.

mod difference;
mod hsl;
mod lab;
mod rgb;
mod xyz;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use difference::{cie76, ciede2000, DifferenceFormula};
pub use hsl::{clamp_h, clamp_l, clamp_s, Hsl, HslSpace};
pub use lab::{Lab, LabSpace};
pub use rgb::{Rgb, RgbSpace};
pub use xyz::{Xyz, XyzSpace};

/// An RGBA color packed as `0xRRGGBBAA`.
pub type PackedColor = u32;

/// A color space that can be packed into and unpacked from a [`PackedColor`].
pub trait ColorSpace {
    type Color;

    fn encode(color: &Self::Color) -> PackedColor;

    fn decode(packed: PackedColor) -> Self::Color;
}

/// An immutable perceptual color.
///
/// Components are always finite, Lab is clamped into range and opacity lies in `[0, 1]`.
/// Deserialization goes through [`Color::new`] and [`Color::with_opacity`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorFields", into = "ColorFields")]
pub struct Color {
    l: f64,
    a: f64,
    b: f64,
    opacity: f64,
}

/// Wire form of [`Color`].
#[derive(Serialize, Deserialize)]
struct ColorFields {
    l: f64,
    a: f64,
    b: f64,
    #[serde(default = "opaque")]
    opacity: f64,
}

fn opaque() -> f64 {
    1.0
}

impl TryFrom<ColorFields> for Color {
    type Error = Error;

    fn try_from(fields: ColorFields) -> Result<Self> {
        Color::new(fields.l, fields.a, fields.b)?.with_opacity(fields.opacity)
    }
}

impl From<Color> for ColorFields {
    fn from(color: Color) -> Self {
        Self {
            l: color.l,
            a: color.a,
            b: color.b,
            opacity: color.opacity,
        }
    }
}

impl Color {
    pub const MIN_CHROMA: f64 = 0.0;
    /// Chroma of the corner of the clamped a/b plane.
    pub const MAX_CHROMA: f64 = 181.019_336_207_947_2;

    /// Create an opaque color from Lab components, clamping them into range.
    pub fn new(l: f64, a: f64, b: f64) -> Result<Self> {
        if !(l.is_finite() && a.is_finite() && b.is_finite()) {
            return Err(Error::NonFinite {
                context: "color components",
            });
        }
        Ok(Self {
            l: LabSpace::clamp_l(l),
            a: LabSpace::clamp_a(a),
            b: LabSpace::clamp_b(b),
            opacity: 1.0,
        })
    }

    /// Same color with the given opacity, clamped to `[0, 1]`.
    pub fn with_opacity(self, opacity: f64) -> Result<Self> {
        if !opacity.is_finite() {
            return Err(Error::NonFinite { context: "opacity" });
        }
        Ok(Self {
            opacity: opacity.clamp(0.0, 1.0),
            ..self
        })
    }

    pub fn from_lab(lab: &Lab) -> Result<Self> {
        Self::new(lab.l, lab.a, lab.b)
    }

    /// Fails if the opacity is not finite; otherwise it is clamped to `[0, 1]`.
    pub fn from_rgb(rgb: &Rgb) -> Result<Self> {
        if !rgb.opacity.is_finite() {
            return Err(Error::NonFinite { context: "opacity" });
        }
        Ok(Self::from_srgb(rgb))
    }

    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_srgb(&Rgb::from_rgba(r, g, b, a))
    }

    pub fn from_packed(packed: PackedColor) -> Self {
        Self::from_srgb(&RgbSpace::decode(packed))
    }

    /// Parse a `#rrggbb` or `#rrggbbaa` string.
    pub fn parse(value: &str) -> Result<Self> {
        RgbSpace::from_hex_string(value).map(|rgb| Self::from_srgb(&rgb))
    }

    /// `rgb.opacity` must be finite.
    fn from_srgb(rgb: &Rgb) -> Self {
        let lab = LabSpace::from_xyz(&XyzSpace::from_rgb(rgb));
        Self {
            l: lab.l,
            a: lab.a,
            b: lab.b,
            opacity: rgb.opacity.clamp(0.0, 1.0),
        }
    }

    pub fn lightness(&self) -> f64 {
        self.l
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn to_lab(&self) -> Lab {
        Lab::new(self.l, self.a, self.b)
    }

    pub fn is_light(&self) -> bool {
        self.l > 50.0
    }

    pub fn is_dark(&self) -> bool {
        !self.is_light()
    }

    pub fn chroma(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Hue angle in degrees, `[0, 360)`.
    pub fn hue(&self) -> f64 {
        self.b.atan2(self.a).to_degrees().rem_euclid(360.0)
    }

    pub fn difference_to(&self, other: &Color, formula: DifferenceFormula) -> f64 {
        formula.compute(&self.to_lab(), &other.to_lab())
    }

    pub fn to_xyz(&self) -> Xyz {
        LabSpace::to_xyz(&self.to_lab())
    }

    pub fn to_rgb(&self) -> Rgb {
        XyzSpace::to_rgb(&self.to_xyz(), self.opacity)
    }

    pub fn to_hsl(&self) -> Hsl {
        HslSpace::from_rgb(&self.to_rgb())
    }

    pub fn to_hex_string(&self) -> String {
        RgbSpace::to_hex_string(&self.to_rgb())
    }

    pub fn to_packed(&self) -> PackedColor {
        RgbSpace::encode(&self.to_rgb())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Color {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_components() {
        assert!(matches!(
            Color::new(f64::NAN, 0.0, 0.0),
            Err(Error::NonFinite { .. })
        ));
        assert!(Color::new(50.0, f64::INFINITY, 0.0).is_err());
        assert!(Color::new(50.0, 0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn clamps_components() {
        let color = Color::new(150.0, -300.0, 300.0).unwrap();
        let lab = color.to_lab();
        assert_eq!((lab.l, lab.a, lab.b), (100.0, -128.0, 127.0));
    }

    #[test]
    fn parse_and_format_hex() {
        let color: Color = "#ff0000".parse().unwrap();
        assert_eq!(color.to_rgb(), Rgb::new(255, 0, 0));
        assert_eq!(color.to_hex_string(), "#ff0000");
        assert_eq!(color.to_string(), "#ff0000");

        let translucent = Color::parse("#0000ff80").unwrap();
        assert_eq!(translucent.to_hex_string(), "#0000ff80");
    }

    #[test]
    fn parse_rejects_other_strings() {
        for value in ["red", "rgb(0,0,0)", "#12", "#12345z"] {
            assert!(matches!(Color::parse(value), Err(Error::InvalidColor(_))));
        }
    }

    #[test]
    fn red_lab_coordinates() {
        let lab = Color::parse("#ff0000").unwrap().to_lab();
        assert!((lab.l - 53.24).abs() < 0.01, "l = {}", lab.l);
        assert!((lab.a - 80.09).abs() < 0.01, "a = {}", lab.a);
        assert!((lab.b - 67.20).abs() < 0.01, "b = {}", lab.b);
    }

    #[test]
    fn light_and_dark() {
        assert!(Color::parse("#ffffff").unwrap().is_light());
        assert!(Color::parse("#000000").unwrap().is_dark());
        let mid = Color::new(50.0, 0.0, 0.0).unwrap();
        assert!(mid.is_dark());
    }

    #[test]
    fn chroma_and_hue() {
        let color = Color::new(50.0, 0.0, -10.0).unwrap();
        assert_eq!(color.chroma(), 10.0);
        assert!((color.hue() - 270.0).abs() < 1e-9);
        assert_eq!(Color::new(50.0, 0.0, 0.0).unwrap().hue(), 0.0);
    }

    #[test]
    fn hsl_of_blue() {
        let hsl = Color::parse("#0000ff").unwrap().to_hsl();
        assert_eq!(hsl.h, 240.0);
        assert_eq!(hsl.s, 1.0);
        assert_eq!(hsl.l, 0.5);
    }

    #[test]
    fn packed_round_trip() {
        let color = Color::parse("#3366cc").unwrap();
        assert_eq!(color.to_packed(), 0x3366_ccff);
        assert_eq!(Color::from_packed(color.to_packed()).to_rgb(), color.to_rgb());
    }

    #[test]
    fn equality_ignores_origin_space() {
        let from_hex = Color::parse("#808080").unwrap();
        let from_rgb = Color::from_rgba(128, 128, 128, 255);
        assert_eq!(from_hex, from_rgb);
    }

    #[test]
    fn difference_between_colors() {
        let red = Color::parse("#ff0000").unwrap();
        assert_eq!(red.difference_to(&red, DifferenceFormula::Cie76), 0.0);
        let blue = Color::parse("#0000ff").unwrap();
        assert!(red.difference_to(&blue, DifferenceFormula::Ciede2000) > 40.0);
    }

    #[test]
    fn from_rgb_rejects_non_finite_opacity() {
        let rgb = Rgb {
            opacity: f64::NAN,
            ..Rgb::new(10, 20, 30)
        };
        assert!(matches!(Color::from_rgb(&rgb), Err(Error::NonFinite { .. })));

        let over = Rgb {
            opacity: 3.0,
            ..Rgb::new(10, 20, 30)
        };
        assert_eq!(Color::from_rgb(&over).unwrap().opacity(), 1.0);
    }

    #[test]
    fn deserialize_clamps_like_new() {
        let color: Color = serde_json::from_str(r#"{"l":500,"a":-900,"b":0,"opacity":7}"#).unwrap();
        let lab = color.to_lab();
        assert_eq!((lab.l, lab.a, lab.b), (100.0, -128.0, 0.0));
        assert_eq!(color.opacity(), 1.0);

        let opaque: Color = serde_json::from_str(r#"{"l":50,"a":0,"b":0}"#).unwrap();
        assert_eq!(opaque.opacity(), 1.0);

        let original = Color::parse("#33669980").unwrap();
        let back: Color = serde_json::from_str(&serde_json::to_string(&original).unwrap()).unwrap();
        assert_eq!(back.to_hex_string(), "#33669980");
    }
}
