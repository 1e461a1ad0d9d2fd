use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::swatch::Swatch;

/// Normalized chroma below which a swatch counts as muted.
const MUTED_MAX_CHROMA: f64 = 0.45;
/// Normalized chroma above which a swatch counts as vivid.
const VIVID_MIN_CHROMA: f64 = 0.5;

/// A swatch selection policy: which swatches qualify and how to rank them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Every swatch, equally scored.
    #[default]
    Basic,
    /// Saturated colors, most saturated first.
    Vivid,
    /// Desaturated colors, least saturated first.
    Muted,
    /// Light colors, lightest first.
    Light,
    /// Dark colors, darkest first.
    Dark,
}

impl Theme {
    /// Whether `swatch` qualifies for this theme.
    pub fn filter(&self, swatch: &Swatch) -> bool {
        let color = swatch.color();
        match self {
            Theme::Basic => true,
            Theme::Vivid => normalized_chroma(color) > VIVID_MIN_CHROMA,
            Theme::Muted => normalized_chroma(color) < MUTED_MAX_CHROMA,
            Theme::Light => color.is_light(),
            Theme::Dark => color.is_dark(),
        }
    }

    /// Rank of `swatch` within this theme, in `[0, 1]`; higher is better.
    pub fn score(&self, swatch: &Swatch) -> f64 {
        let color = swatch.color();
        match self {
            Theme::Basic => 1.0,
            Theme::Vivid => normalized_chroma(color),
            Theme::Muted => 1.0 - normalized_chroma(color),
            Theme::Light => color.lightness() / 100.0,
            Theme::Dark => 1.0 - color.lightness() / 100.0,
        }
    }
}

fn normalized_chroma(color: &Color) -> f64 {
    ((color.chroma() - Color::MIN_CHROMA) / (Color::MAX_CHROMA - Color::MIN_CHROMA)).clamp(0.0, 1.0)
}
