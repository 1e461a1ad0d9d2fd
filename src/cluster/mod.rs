//! Clustering algorithms for grouping image feature points.
//!
//! Every algorithm consumes a point slice and a [`Metric`], and returns [`Labels`]:
//! one label per point, with [`NOISE`] for points that belong to no cluster.
//!
//! ## Algorithms
//!
//! ### DBSCAN
//!
//! Density-based clustering that can discover non-convex clusters and identify
//! outliers (noise points). DBSCAN does not require specifying the number of
//! clusters in advance, only a neighborhood radius.
//!
//! ### HDBSCAN
//!
//! DBSCAN over every radius at once: builds a density hierarchy and keeps the most
//! stable clusters. Handles clusters of differing density.
//!
//! ### K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Never labels noise. Seeding is pluggable through [`Initializer`].
//!
//! ## Choosing at runtime
//!
//! [`Algorithm`] wraps the three parameter sets in one serializable value, so the
//! extractor stays algorithm-agnostic and a request can name its algorithm in JSON.
//!
//! ## Usage
//!
//! ```rust
//! use auto_palette::cluster::{Algorithm, Clustering, Dbscan, Kmeans};
//! use auto_palette::math::Euclidean;
//!
//! let data = vec![[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]];
//!
//! let labels = Kmeans::new(2).with_seed(7).fit_predict(&data, &Euclidean).unwrap();
//! assert_eq!(labels.get(0), labels.get(1));
//! assert_ne!(labels.get(0), labels.get(2));
//!
//! let algorithm = Algorithm::from(Dbscan::new(2, 0.5));
//! let labels = algorithm.fit_predict(&data, &Euclidean).unwrap();
//! assert_eq!(labels.num_clusters(), 2);
//! ```

mod dbscan;
mod hdbscan;
mod init;
mod kmeans;
mod labels;
mod traits;
mod util;

pub use dbscan::Dbscan;
pub use hdbscan::Hdbscan;
pub use init::{Initializer, KmeansPlusPlus, RandomInitializer};
pub use kmeans::{Init, Kmeans, KmeansFit};
pub use labels::{Labels, NOISE};
pub use traits::Clustering;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::{Metric, Point};

/// One of the clustering algorithms together with its parameters.
///
/// Serializes as `{"algorithm": "dbscan", "params": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", content = "params", rename_all = "lowercase")]
pub enum Algorithm {
    Dbscan(Dbscan),
    Hdbscan(Hdbscan),
    Kmeans(Kmeans),
}

impl Algorithm {
    /// Selector name as used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Dbscan(_) => "dbscan",
            Algorithm::Hdbscan(_) => "hdbscan",
            Algorithm::Kmeans(_) => "kmeans",
        }
    }
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::Dbscan(Dbscan::default())
    }
}

impl From<Dbscan> for Algorithm {
    fn from(value: Dbscan) -> Self {
        Algorithm::Dbscan(value)
    }
}

impl From<Hdbscan> for Algorithm {
    fn from(value: Hdbscan) -> Self {
        Algorithm::Hdbscan(value)
    }
}

impl From<Kmeans> for Algorithm {
    fn from(value: Kmeans) -> Self {
        Algorithm::Kmeans(value)
    }
}

impl Clustering for Algorithm {
    fn fit_predict<const N: usize, M: Metric<N>>(&self, points: &[Point<N>], metric: &M) -> Result<Labels> {
        match self {
            Algorithm::Dbscan(a) => a.fit_predict(points, metric),
            Algorithm::Hdbscan(a) => a.fit_predict(points, metric),
            Algorithm::Kmeans(a) => a.fit_predict(points, metric),
        }
    }

    fn n_clusters(&self) -> usize {
        match self {
            Algorithm::Dbscan(a) => a.n_clusters(),
            Algorithm::Hdbscan(a) => a.n_clusters(),
            Algorithm::Kmeans(a) => a.n_clusters(),
        }
    }
}
