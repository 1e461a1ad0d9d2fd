use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};

/// One representative color of an image: the color, how many pixels it stands for,
/// and where in the image one of those pixels sits.
///
/// Deserialization goes through [`Swatch::new`], so a zero population is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SwatchFields", into = "SwatchFields")]
pub struct Swatch {
    color: Color,
    position: (u32, u32),
    population: usize,
}

/// Wire form of [`Swatch`].
#[derive(Serialize, Deserialize)]
struct SwatchFields {
    color: Color,
    position: (u32, u32),
    population: usize,
}

impl TryFrom<SwatchFields> for Swatch {
    type Error = Error;

    fn try_from(fields: SwatchFields) -> Result<Self> {
        Swatch::new(fields.color, fields.position, fields.population)
    }
}

impl From<Swatch> for SwatchFields {
    fn from(swatch: Swatch) -> Self {
        Self {
            color: swatch.color,
            position: swatch.position,
            population: swatch.population,
        }
    }
}

impl Swatch {
    /// Fails if `population` is zero.
    pub fn new(color: Color, position: (u32, u32), population: usize) -> Result<Self> {
        if population == 0 {
            return Err(Error::InvalidParameter {
                name: "population",
                message: "must be at least 1",
            });
        }
        Ok(Self {
            color,
            position,
            population,
        })
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    /// Pixel `(x, y)` in the original image's grid.
    pub fn position(&self) -> (u32, u32) {
        self.position
    }

    pub fn population(&self) -> usize {
        self.population
    }
}
