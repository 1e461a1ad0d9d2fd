use serde::{Deserialize, Serialize};

use super::rgb::{Rgb, RgbSpace};
use super::{ColorSpace, PackedColor};

const MAX_H: f64 = 360.0;

/// Hue in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
    pub opacity: f64,
}

/// Normalize a hue into `[0, 360)`; non-finite input maps to 0.
pub fn clamp_h(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.rem_euclid(MAX_H)
}

/// Clamp a saturation into `[0, 1]`; non-finite input maps to 0.
pub fn clamp_s(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamp a lightness into `[0, 1]`; non-finite input maps to 0.
pub fn clamp_l(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// The HSL space, packed through 8-bit sRGB.
pub struct HslSpace;

impl HslSpace {
    pub fn to_rgb(color: &Hsl) -> Rgb {
        let h = clamp_h(color.h);
        let s = clamp_s(color.s);
        let l = clamp_l(color.l);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = (1.0 - ((h / 60.0) % 2.0 - 1.0).abs()) * c;
        let m = l - c / 2.0;

        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb {
            r: channel(r),
            g: channel(g),
            b: channel(b),
            opacity: color.opacity,
        }
    }

    pub fn from_rgb(rgb: &Rgb) -> Hsl {
        let [r, g, b] = rgb.normalized();
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        // Channel priority r > g > b when several equal `max`.
        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (((g - b) / delta) % 6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        let l = (max + min) / 2.0;
        let s = if delta == 0.0 {
            0.0
        } else {
            delta / (1.0 - (2.0 * l - 1.0).abs())
        };

        Hsl {
            h: clamp_h(h),
            s: clamp_s(s),
            l: clamp_l(l),
            opacity: rgb.opacity,
        }
    }
}

impl ColorSpace for HslSpace {
    type Color = Hsl;

    fn encode(color: &Hsl) -> PackedColor {
        RgbSpace::encode(&Self::to_rgb(color))
    }

    fn decode(packed: PackedColor) -> Hsl {
        Self::from_rgb(&RgbSpace::decode(packed))
    }
}
