//! Ranked swatch collections.
//!
//! ## Ranking
//!
//! [`Palette::find_swatches`] orders swatches by population, largest first (ties keep their
//! extraction order), then walks that order picking swatches that differ from every earlier
//! pick by at least [`MIN_DIFFERENCE`] under the palette's [`DifferenceFormula`]. If too few
//! distinct swatches exist, the skipped ones fill the remaining slots in population order.
//! When the limit covers the whole palette, every swatch is returned.
//! [`Palette::find_default_swatches`] uses [`DEFAULT_LIMIT`].
//!
//! [`Palette::find_swatches_with_theme`] does the same over the swatches a [`Theme`] accepts,
//! ranked by the theme's score.

use crate::color::DifferenceFormula;
use crate::error::{Error, Result};
use crate::extractor::{Extractor, ExtractorOptions, ImageData};
use crate::swatch::Swatch;
use crate::theme::Theme;

/// Difference (in delta-E units) below which two swatches count as near-duplicates.
pub const MIN_DIFFERENCE: f64 = 10.0;

/// Swatch count returned by [`Palette::find_default_swatches`].
pub const DEFAULT_LIMIT: usize = 6;

/// An immutable set of swatches, stored by descending population.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    swatches: Vec<Swatch>,
    formula: DifferenceFormula,
}

impl Palette {
    /// Build a palette ranked with CIE76.
    pub fn new(mut swatches: Vec<Swatch>) -> Self {
        swatches.sort_by(|a, b| b.population().cmp(&a.population()));
        Self {
            swatches,
            formula: DifferenceFormula::default(),
        }
    }

    /// Use `formula` to judge near-duplicate swatches.
    pub fn with_formula(mut self, formula: DifferenceFormula) -> Self {
        self.formula = formula;
        self
    }

    /// Extract swatches from `image` and collect them into a palette.
    pub fn extract(image: &ImageData, options: &ExtractorOptions) -> Result<Self> {
        Extractor::new(options.clone()).extract(image).map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.swatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swatches.is_empty()
    }

    /// All swatches, largest population first.
    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    pub fn formula(&self) -> DifferenceFormula {
        self.formula
    }

    /// The swatch with the largest population.
    pub fn dominant_swatch(&self) -> Result<&Swatch> {
        self.swatches.first().ok_or(Error::EmptyPalette)
    }

    /// Up to `limit` distinct swatches, largest population first.
    pub fn find_swatches(&self, limit: usize) -> Result<Vec<Swatch>> {
        check_limit(limit)?;
        Ok(self.pick_distinct(self.swatches.clone(), limit))
    }

    /// Up to [`DEFAULT_LIMIT`] distinct swatches, largest population first.
    pub fn find_default_swatches(&self) -> Vec<Swatch> {
        self.pick_distinct(self.swatches.clone(), DEFAULT_LIMIT)
    }

    /// Up to `limit` distinct swatches accepted by `theme`, best score first.
    pub fn find_swatches_with_theme(&self, limit: usize, theme: Theme) -> Result<Vec<Swatch>> {
        check_limit(limit)?;
        let mut ranked: Vec<(f64, Swatch)> = self
            .swatches
            .iter()
            .filter(|s| theme.filter(s))
            .map(|s| (theme.score(s), *s))
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(self.pick_distinct(ranked.into_iter().map(|(_, s)| s).collect(), limit))
    }

    /// Greedy near-duplicate suppression over an already ranked list; keeps rank order.
    fn pick_distinct(&self, ranked: Vec<Swatch>, limit: usize) -> Vec<Swatch> {
        if limit >= ranked.len() {
            return ranked;
        }

        let mut picked: Vec<usize> = Vec::with_capacity(limit);
        let mut skipped: Vec<usize> = Vec::new();
        for (i, candidate) in ranked.iter().enumerate() {
            if picked.len() == limit {
                break;
            }
            let distinct = picked.iter().all(|&p| {
                candidate.color().difference_to(ranked[p].color(), self.formula) >= MIN_DIFFERENCE
            });
            if distinct {
                picked.push(i);
            } else {
                skipped.push(i);
            }
        }
        let missing = limit - picked.len();
        picked.extend(skipped.into_iter().take(missing));
        picked.sort_unstable();

        picked.into_iter().map(|i| ranked[i]).collect()
    }
}

fn check_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::InvalidParameter {
            name: "limit",
            message: "must be at least 1",
        });
    }
    Ok(())
}
