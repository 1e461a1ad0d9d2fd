//! K-means clustering (Lloyd's algorithm).
//!
//! # The Algorithm
//!
//! 1. Seed `k` centroids with an [`Initializer`] (k-means++ by default).
//! 2. Assign every point to its nearest centroid; ties go to the lowest centroid index.
//! 3. Move each centroid to the component-wise mean of its points. A centroid that lost
//!    all of its points stays where it was.
//! 4. Stop once no centroid moves farther than `tolerance`, or after `max_iterations`.
//!
//! If `k` is at least the number of points, every point is its own cluster and no
//! iteration runs.
//!
//! ## Complexity
//!
//! O(n · k · N) per iteration.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use super::init::{Initializer, KmeansPlusPlus, RandomInitializer};
use super::traits::Clustering;
use super::Labels;
use crate::error::{Error, Result};
use crate::math::{ensure_finite, Metric, Point};

/// Centroid seeding strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Init {
    /// Uniform sampling without replacement.
    Random,
    /// D²-weighted sampling.
    #[default]
    KmeansPlusPlus,
}

/// K-means clustering algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kmeans {
    max_colors: usize,
    max_iterations: usize,
    tolerance: f64,
    init: Init,
    /// Fixed seed for reproducible runs; `None` draws from the thread RNG.
    seed: Option<u64>,
}

/// Result of a k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit<const N: usize> {
    /// Final centroids, indexed by label.
    pub centroids: Vec<Point<N>>,
    /// Label per input point.
    pub labels: Labels,
    /// Lloyd iterations performed (0 when every point is its own cluster).
    pub iterations: usize,
}

impl Kmeans {
    /// Create a k-means clusterer producing at most `max_colors` clusters.
    pub fn new(max_colors: usize) -> Self {
        Self {
            max_colors,
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Stop once the largest centroid shift is at most `tolerance`.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn max_colors(&self) -> usize {
        self.max_colors
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn validate(&self) -> Result<()> {
        if self.max_colors == 0 {
            return Err(Error::InvalidParameter {
                name: "max_colors",
                message: "must be at least 1",
            });
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        if !self.tolerance.is_finite() {
            return Err(Error::NonFinite {
                context: "tolerance",
            });
        }
        if self.tolerance < 0.0 {
            return Err(Error::InvalidParameter {
                name: "tolerance",
                message: "must be non-negative",
            });
        }
        Ok(())
    }

    fn rng(&self) -> Box<dyn RngCore> {
        match self.seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(rand::rng()),
        }
    }

    /// Run k-means and return centroids along with labels.
    pub fn fit<const N: usize, M: Metric<N>>(&self, points: &[Point<N>], metric: &M) -> Result<KmeansFit<N>> {
        let n = points.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        self.validate()?;
        ensure_finite(points)?;

        if self.max_colors >= n {
            return Ok(KmeansFit {
                centroids: points.to_vec(),
                labels: Labels::new((0..n).collect()),
                iterations: 0,
            });
        }

        let k = self.max_colors;
        let mut centroids = match self.init {
            Init::Random => RandomInitializer::new(self.rng()).initialize(points, k)?,
            Init::KmeansPlusPlus => KmeansPlusPlus::new(metric, self.rng()).initialize(points, k)?,
        };

        let scale = metric.scale();
        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        for iteration in 1..=self.max_iterations {
            iterations = iteration;
            assign(points, &centroids, metric, &mut labels);

            let mut sums = vec![[0.0f64; N]; k];
            let mut counts = vec![0usize; k];
            for (point, &label) in points.iter().zip(&labels) {
                counts[label] += 1;
                for (s, x) in sums[label].iter_mut().zip(point) {
                    *s += x;
                }
            }

            let mut max_shift = 0.0f64;
            for (j, centroid) in centroids.iter_mut().enumerate() {
                if counts[j] == 0 {
                    warn!("k-means: centroid {} lost all points, keeping its position", j);
                    continue;
                }
                let inv = 1.0 / counts[j] as f64;
                let mut updated = sums[j];
                for x in updated.iter_mut() {
                    *x *= inv;
                }
                let shift = scale.to_linear(metric.eval(centroid, &updated));
                max_shift = max_shift.max(shift);
                *centroid = updated;
            }

            if max_shift <= self.tolerance {
                break;
            }
        }

        // Labels follow the returned centroids.
        assign(points, &centroids, metric, &mut labels);
        debug!("k-means: {} points, k = {}, {} iterations", n, k, iterations);

        Ok(KmeansFit {
            centroids,
            labels: Labels::new(labels),
            iterations,
        })
    }
}

/// Nearest centroid per point, lowest index on ties.
fn assign<const N: usize, M: Metric<N>>(
    points: &[Point<N>],
    centroids: &[Point<N>],
    metric: &M,
    labels: &mut [usize],
) {
    for (point, label) in points.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (j, centroid) in centroids.iter().enumerate() {
            let d = metric.eval(point, centroid);
            if d < best_dist {
                best_dist = d;
                best = j;
            }
        }
        *label = best;
    }
}

impl Default for Kmeans {
    fn default() -> Self {
        Self {
            max_colors: 25,
            max_iterations: 10,
            tolerance: 0.25,
            init: Init::KmeansPlusPlus,
            seed: None,
        }
    }
}

impl Clustering for Kmeans {
    fn fit_predict<const N: usize, M: Metric<N>>(&self, points: &[Point<N>], metric: &M) -> Result<Labels> {
        Ok(self.fit(points, metric)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.max_colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Euclidean, SquaredEuclidean};

    fn two_blobs() -> Vec<[f64; 2]> {
        vec![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.0],
            [10.0, 10.0],
            [10.1, 10.1],
            [10.2, 10.0],
        ]
    }

    #[test]
    fn separates_two_blobs() {
        let data = two_blobs();
        let fit = Kmeans::new(2)
            .with_seed(42)
            .with_tolerance(1e-6)
            .fit(&data, &SquaredEuclidean)
            .unwrap();

        let l = fit.labels.as_slice();
        assert_eq!(l[0], l[1]);
        assert_eq!(l[1], l[2]);
        assert_eq!(l[3], l[4]);
        assert_eq!(l[4], l[5]);
        assert_ne!(l[0], l[3]);

        let c = fit.centroids[l[0]];
        assert!((c[0] - 0.1).abs() < 1e-9);
        assert!((c[1] - 1.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn k_at_least_n_gives_singletons() {
        let data = two_blobs();
        let fit = Kmeans::new(10).fit(&data, &Euclidean).unwrap();
        assert_eq!(fit.iterations, 0);
        assert_eq!(fit.labels.num_clusters(), data.len());
        assert!(fit.labels.clusters().iter().all(|members| members.len() == 1));
        assert_eq!(fit.centroids, data);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let data: Vec<[f64; 2]> = (0..40).map(|i| [(i % 7) as f64, (i / 7) as f64]).collect();
        for init in [Init::Random, Init::KmeansPlusPlus] {
            let a = Kmeans::new(4).with_init(init).with_seed(9).fit(&data, &Euclidean).unwrap();
            let b = Kmeans::new(4).with_init(init).with_seed(9).fit(&data, &Euclidean).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn iterations_are_bounded() {
        let data: Vec<[f64; 2]> = (0..50).map(|i| [(i * 37 % 11) as f64, (i * 13 % 17) as f64]).collect();
        let fit = Kmeans::new(5)
            .with_max_iterations(3)
            .with_tolerance(0.0)
            .with_seed(1)
            .fit(&data, &Euclidean)
            .unwrap();
        assert!(fit.iterations >= 1 && fit.iterations <= 3);
        assert_eq!(fit.labels.len(), 50);
        assert!(fit.labels.iter().all(|l| l < 5));
    }

    #[test]
    fn coincident_points_converge() {
        let data = vec![[2.0, 2.0]; 10];
        let fit = Kmeans::new(3).with_seed(5).fit(&data, &Euclidean).unwrap();
        assert_eq!(fit.iterations, 1);
        // Every point sits on centroid 0; the others keep their (identical) positions.
        assert!(fit.labels.iter().all(|l| l == 0));
        assert!(fit.centroids.iter().all(|c| *c == [2.0, 2.0]));
    }

    #[test]
    fn fit_predict_matches_fit() {
        let data = two_blobs();
        let kmeans = Kmeans::new(2).with_seed(3);
        assert_eq!(
            kmeans.fit_predict(&data, &Euclidean).unwrap(),
            kmeans.fit(&data, &Euclidean).unwrap().labels
        );
        assert_eq!(kmeans.n_clusters(), 2);
    }

    #[test]
    fn rejects_invalid_input() {
        let empty: Vec<[f64; 2]> = vec![];
        assert!(matches!(Kmeans::new(2).fit(&empty, &Euclidean), Err(Error::EmptyInput)));

        let data = two_blobs();
        assert!(Kmeans::new(0).fit(&data, &Euclidean).is_err());
        assert!(Kmeans::new(2).with_max_iterations(0).fit(&data, &Euclidean).is_err());
        assert!(Kmeans::new(2).with_tolerance(-1.0).fit(&data, &Euclidean).is_err());
        assert!(Kmeans::new(2).with_tolerance(f64::NAN).fit(&data, &Euclidean).is_err());

        let bad = vec![[0.0, 0.0], [f64::INFINITY, 1.0], [2.0, 2.0]];
        assert!(matches!(
            Kmeans::new(1).fit(&bad, &Euclidean),
            Err(Error::NonFinite { .. })
        ));
    }

    #[test]
    fn defaults() {
        let kmeans = Kmeans::default();
        assert_eq!(kmeans.max_colors(), 25);
        assert_eq!(kmeans.max_iterations(), 10);
        assert_eq!(kmeans.tolerance(), 0.25);
    }
}
