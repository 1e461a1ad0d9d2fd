//! Perceptual color palettes from raw pixels.
//!
//! `auto_palette` turns an RGBA buffer into a small ranked set of representative colors:
//!
//! - [`color`]: a Lab-backed [`Color`] with RGB, XYZ, HSL conversions and delta-E formulas
//!   (CIE76, CIEDE2000)
//! - [`math`]: fixed-size points, distance metrics, and a KD-tree for neighbor queries
//! - [`cluster`]: DBSCAN, HDBSCAN, and k-means (random or k-means++ seeding)
//! - [`extractor`]: pixels to 5-D points to clusters to [`Swatch`]es
//! - [`Palette`]: population ranking with near-duplicate suppression and [`Theme`] queries
//! - [`worker`]: a tokio service running extractions off the calling thread
//!
//! ```rust
//! use auto_palette::{Dbscan, ExtractorOptions, ImageData, Palette};
//!
//! // 4x4 image: red on the left, blue on the right.
//! let mut data = Vec::new();
//! for _ in 0..4 {
//!     for x in 0..4 {
//!         data.extend_from_slice(if x < 2 { &[255, 0, 0, 255] } else { &[0, 0, 255, 255] });
//!     }
//! }
//! let image = ImageData::new(4, 4, data).unwrap();
//! let options = ExtractorOptions::default().with_algorithm(Dbscan::new(2, 0.3));
//!
//! let palette = Palette::extract(&image, &options).unwrap();
//! assert_eq!(palette.len(), 2);
//! assert_eq!(palette.dominant_swatch().unwrap().population(), 8);
//! ```

#![forbid(unsafe_code)]

pub mod cluster;
pub mod color;
pub mod error;
pub mod extractor;
pub mod math;
pub mod palette;
pub mod swatch;
pub mod theme;
pub mod worker;

pub use cluster::{Algorithm, Clustering, Dbscan, Hdbscan, Init, Kmeans, KmeansFit, Labels, NOISE};
pub use color::{Color, DifferenceFormula};
pub use error::{Error, Result};
pub use extractor::{ColorFilter, Extractor, ExtractorOptions, ImageData};
pub use palette::{Palette, DEFAULT_LIMIT};
pub use swatch::Swatch;
pub use theme::Theme;
pub use worker::PaletteWorker;
