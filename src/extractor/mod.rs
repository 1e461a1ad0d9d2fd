//! Turns pixels into swatches.
//!
//! Every pixel that passes the [`ColorFilter`]s becomes a 5-D point
//!
//! ```text
//! (x / s, y / s, L / 100, a / 128, b / 128)    with s = max(width, height)
//! ```
//!
//! so position and color live on comparable scales. The configured [`Algorithm`] clusters
//! those points under a [`WeightedEuclidean`] metric (the delta-E weight function), and each
//! non-noise cluster is reduced to one [`Swatch`]:
//!
//! - population: the number of points in the cluster;
//! - color: the mean Lab of those points;
//! - position: the pixel whose point lies closest to the cluster mean, mapped onto the
//!   original image's grid.
//!
//! Extraction is all-or-nothing: either every cluster becomes a swatch or an error is returned.

mod filter;

pub use filter::ColorFilter;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::cluster::{Algorithm, Clustering};
use crate::color::{Color, Rgb};
use crate::error::{Error, Result};
use crate::math::{Metric, Point5, WeightedEuclidean};
use crate::swatch::Swatch;

/// A row-major RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    data: Vec<u8>,
    origin: (u32, u32),
}

impl ImageData {
    /// Wrap `data`, which must hold exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(Error::InvalidImage {
                width,
                height,
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
            origin: (width, height),
        })
    }

    /// Record the size of the image this buffer was downscaled from. Swatch positions are
    /// reported on that grid.
    pub fn with_origin(mut self, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameter {
                name: "origin",
                message: "must have a non-zero width and height",
            });
        }
        self.origin = (width, height);
        Ok(self)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    /// Give the buffer back.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn pixels(&self) -> impl Iterator<Item = ((u32, u32), Rgb)> + '_ {
        let width = self.width.max(1);
        self.data.chunks_exact(4).enumerate().map(move |(i, px)| {
            let i = i as u32;
            ((i % width, i / width), Rgb::from_rgba(px[0], px[1], px[2], px[3]))
        })
    }

    /// Map a working-grid position onto the origin grid.
    fn to_origin(&self, (x, y): (u32, u32)) -> (u32, u32) {
        let scale = |v: u32, from: u32, to: u32| -> u32 {
            let scaled = (f64::from(v) * f64::from(to) / f64::from(from.max(1))).round() as u32;
            scaled.min(to.saturating_sub(1))
        };
        (
            scale(x, self.width, self.origin.0),
            scale(y, self.height, self.origin.1),
        )
    }
}

/// How to extract swatches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorOptions {
    pub algorithm: Algorithm,
    /// A pixel is kept only if every filter allows it.
    pub filters: Vec<ColorFilter>,
    /// Weight of the `(x, y)` axes in the default metric.
    pub spatial_weight: f64,
    /// Weight of the `(L, a, b)` axes in the default metric.
    pub color_weight: f64,
}

impl ExtractorOptions {
    pub fn with_algorithm(mut self, algorithm: impl Into<Algorithm>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    pub fn with_filters(mut self, filters: Vec<ColorFilter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_weights(mut self, spatial_weight: f64, color_weight: f64) -> Self {
        self.spatial_weight = spatial_weight;
        self.color_weight = color_weight;
        self
    }
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            filters: vec![ColorFilter::default()],
            spatial_weight: 1.0,
            color_weight: 1.0,
        }
    }
}

/// Clusters image pixels into swatches.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    options: ExtractorOptions,
}

impl Extractor {
    pub fn new(options: ExtractorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// Extract swatches with the weighted metric built from the options.
    pub fn extract(&self, image: &ImageData) -> Result<Vec<Swatch>> {
        let metric = WeightedEuclidean::color_spatial(self.options.spatial_weight, self.options.color_weight)?;
        self.extract_with(image, &metric)
    }

    /// Extract swatches measuring point proximity with `metric`.
    ///
    /// Swatches come back in cluster order, not ranked.
    pub fn extract_with<M: Metric<5>>(&self, image: &ImageData, metric: &M) -> Result<Vec<Swatch>> {
        let (points, positions) = self.collect_points(image)?;
        if points.is_empty() {
            return Err(Error::EmptyInput);
        }

        let labels = self.options.algorithm.fit_predict(&points, metric)?;
        debug!(
            "{}: {} points, {} clusters, {} noise",
            self.options.algorithm.name(),
            points.len(),
            labels.num_clusters(),
            labels.noise_count()
        );

        let mut swatches = Vec::with_capacity(labels.num_clusters());
        for members in labels.clusters().into_iter().filter(|m| !m.is_empty()) {
            swatches.push(reduce(&points, &positions, &members, metric, image)?);
        }
        if swatches.is_empty() {
            return Err(Error::NoClusters);
        }

        info!(
            "extracted {} swatches from {}x{} image",
            swatches.len(),
            image.width(),
            image.height()
        );
        Ok(swatches)
    }

    /// Feature points of the kept pixels, with the pixel position of each point.
    fn collect_points(&self, image: &ImageData) -> Result<(Vec<Point5>, Vec<(u32, u32)>)> {
        let scale = f64::from(image.width().max(image.height()).max(1));
        let mut points = Vec::new();
        let mut positions = Vec::new();

        for (position, rgb) in image.pixels() {
            if !self.options.filters.iter().all(|f| f.is_allowed(&rgb)) {
                continue;
            }
            let lab = Color::from_rgb(&rgb)?.to_lab();
            points.push([
                f64::from(position.0) / scale,
                f64::from(position.1) / scale,
                lab.l / 100.0,
                lab.a / 128.0,
                lab.b / 128.0,
            ]);
            positions.push(position);
        }
        Ok((points, positions))
    }
}

fn reduce<M: Metric<5>>(
    points: &[Point5],
    positions: &[(u32, u32)],
    members: &[usize],
    metric: &M,
    image: &ImageData,
) -> Result<Swatch> {
    let mut mean = [0.0f64; 5];
    for &i in members {
        for (m, x) in mean.iter_mut().zip(&points[i]) {
            *m += x;
        }
    }
    let inv = 1.0 / members.len() as f64;
    for m in mean.iter_mut() {
        *m *= inv;
    }

    let mut closest = members[0];
    let mut best = f64::INFINITY;
    for &i in members {
        let d = metric.eval(&points[i], &mean);
        if d < best {
            best = d;
            closest = i;
        }
    }

    let color = Color::new(mean[2] * 100.0, mean[3] * 128.0, mean[4] * 128.0)?;
    Swatch::new(color, image.to_origin(positions[closest]), members.len())
}
