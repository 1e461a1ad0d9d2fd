use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// A predicate over raw pixel colors, applied before clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColorFilter {
    /// Keep pixels whose opacity is at least `threshold`.
    Opacity { threshold: f64 },
    /// Keep pixels whose luma (Rec. 601, in `[0, 1]`) lies in `[min, max]`.
    Luminance { min: f64, max: f64 },
}

impl ColorFilter {
    /// Drops pixels that are more than half transparent.
    pub fn opacity() -> Self {
        ColorFilter::Opacity { threshold: 0.5 }
    }

    pub fn is_allowed(&self, rgb: &Rgb) -> bool {
        match *self {
            ColorFilter::Opacity { threshold } => rgb.opacity >= threshold,
            ColorFilter::Luminance { min, max } => {
                let luma = luma(rgb);
                luma >= min && luma <= max
            }
        }
    }
}

impl Default for ColorFilter {
    fn default() -> Self {
        Self::opacity()
    }
}

fn luma(rgb: &Rgb) -> f64 {
    let [r, g, b] = rgb.normalized();
    0.299 * r + 0.587 * g + 0.114 * b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_rejects_transparent_pixels() {
        let filter = ColorFilter::opacity();
        assert!(filter.is_allowed(&Rgb::from_rgba(10, 20, 30, 255)));
        assert!(filter.is_allowed(&Rgb::from_rgba(10, 20, 30, 128)));
        assert!(!filter.is_allowed(&Rgb::from_rgba(10, 20, 30, 127)));
        assert!(!filter.is_allowed(&Rgb::from_rgba(10, 20, 30, 0)));
    }

    #[test]
    fn luminance_keeps_mid_tones() {
        let filter = ColorFilter::Luminance { min: 0.1, max: 0.9 };
        assert!(!filter.is_allowed(&Rgb::new(0, 0, 0)));
        assert!(!filter.is_allowed(&Rgb::new(255, 255, 255)));
        assert!(filter.is_allowed(&Rgb::new(128, 128, 128)));
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&ColorFilter::opacity()).unwrap();
        assert_eq!(json, r#"{"type":"opacity","threshold":0.5}"#);
        let back: ColorFilter = serde_json::from_str(r#"{"type":"luminance","min":0.2,"max":0.8}"#).unwrap();
        assert_eq!(back, ColorFilter::Luminance { min: 0.2, max: 0.8 });
    }
}
