use serde::{Deserialize, Serialize};

use super::rgb::Rgb;

/// D65 reference white.
pub const WHITE_X: f64 = 0.95047;
pub const WHITE_Y: f64 = 1.0;
pub const WHITE_Z: f64 = 1.08883;

/// A CIE 1931 XYZ color relative to D65.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// sRGB <-> XYZ conversions.
pub struct XyzSpace;

impl XyzSpace {
    pub fn clamp_x(value: f64) -> f64 {
        value.clamp(0.0, WHITE_X)
    }

    pub fn clamp_y(value: f64) -> f64 {
        value.clamp(0.0, WHITE_Y)
    }

    pub fn clamp_z(value: f64) -> f64 {
        value.clamp(0.0, WHITE_Z)
    }

    pub fn from_rgb(rgb: &Rgb) -> Xyz {
        let [r, g, b] = rgb.normalized().map(to_linear);
        Xyz {
            x: Self::clamp_x(0.4124564 * r + 0.3575761 * g + 0.1804375 * b),
            y: Self::clamp_y(0.2126729 * r + 0.7151522 * g + 0.0721750 * b),
            z: Self::clamp_z(0.0193339 * r + 0.1191920 * g + 0.9503041 * b),
        }
    }

    /// Convert to 8-bit sRGB, clipping XYZ and the resulting channels to their valid domains.
    pub fn to_rgb(xyz: &Xyz, opacity: f64) -> Rgb {
        let x = Self::clamp_x(xyz.x);
        let y = Self::clamp_y(xyz.y);
        let z = Self::clamp_z(xyz.z);

        let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
        let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
        let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

        let channel = |v: f64| (from_linear(v).clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            opacity,
        }
    }
}

fn to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn from_linear(c: f64) -> f64 {
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}
