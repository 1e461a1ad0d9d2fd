//! Centroid seeding for k-means.
//!
//! Both strategies take their random source at construction, so a seeded
//! [`StdRng`](rand::rngs::StdRng) makes a run reproducible.
//!
//! ## K-means++ (Arthur & Vassilvitskii, 2007)
//!
//! The first centroid is uniform. Each later centroid is drawn with probability
//! proportional to `D(x)²`, the squared distance from `x` to its nearest chosen
//! centroid. Spreading the seeds this way gives an O(log k) approximation of the
//! optimal objective before Lloyd iterations even start.

use log::warn;
use rand::Rng;

use crate::error::{Error, Result};
use crate::math::{ensure_finite, Metric, Point};

/// Chooses starting centroids from a point set.
pub trait Initializer<const N: usize> {
    /// Indices of the chosen points, in selection order.
    ///
    /// When `points` has no more than `count` entries every index is returned.
    fn select(&mut self, points: &[Point<N>], count: usize) -> Result<Vec<usize>>;

    /// The chosen points themselves.
    fn initialize(&mut self, points: &[Point<N>], count: usize) -> Result<Vec<Point<N>>> {
        Ok(self
            .select(points, count)?
            .into_iter()
            .map(|i| points[i])
            .collect())
    }
}

fn check_request<const N: usize>(points: &[Point<N>], count: usize) -> Result<()> {
    if count == 0 {
        return Err(Error::InvalidParameter {
            name: "count",
            message: "must be at least 1",
        });
    }
    ensure_finite(points)
}

/// Uniform sampling without replacement.
#[derive(Debug, Clone)]
pub struct RandomInitializer<R> {
    rng: R,
}

impl<R: Rng> RandomInitializer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<const N: usize, R: Rng> Initializer<N> for RandomInitializer<R> {
    fn select(&mut self, points: &[Point<N>], count: usize) -> Result<Vec<usize>> {
        check_request(points, count)?;
        let n = points.len();
        if n <= count {
            return Ok((0..n).collect());
        }
        Ok(rand::seq::index::sample(&mut self.rng, n, count).into_vec())
    }
}

/// D²-weighted seeding.
#[derive(Debug, Clone)]
pub struct KmeansPlusPlus<M, R> {
    metric: M,
    rng: R,
}

impl<M, R: Rng> KmeansPlusPlus<M, R> {
    pub fn new(metric: M, rng: R) -> Self {
        Self { metric, rng }
    }
}

impl<M, R> KmeansPlusPlus<M, R> {
    fn squared<const N: usize>(&self, a: &Point<N>, b: &Point<N>) -> f64
    where
        M: Metric<N>,
    {
        let d = self.metric.scale().to_linear(self.metric.eval(a, b));
        d * d
    }
}

impl<const N: usize, M: Metric<N>, R: Rng> Initializer<N> for KmeansPlusPlus<M, R> {
    fn select(&mut self, points: &[Point<N>], count: usize) -> Result<Vec<usize>> {
        check_request(points, count)?;
        let n = points.len();
        if n <= count {
            return Ok((0..n).collect());
        }

        let mut selected = Vec::with_capacity(count);
        let mut is_selected = vec![false; n];
        let first = self.rng.random_range(0..n);
        selected.push(first);
        is_selected[first] = true;

        // Squared distance from each point to its nearest selected centroid.
        let mut nearest: Vec<f64> = points.iter().map(|p| self.squared(p, &points[first])).collect();

        while selected.len() < count {
            let total: f64 = (0..n).filter(|&i| !is_selected[i]).map(|i| nearest[i]).sum();
            let target = self.rng.random::<f64>() * total;

            let mut cumulative = 0.0;
            let mut pick = None;
            for i in (0..n).filter(|&i| !is_selected[i] && nearest[i] > 0.0) {
                cumulative += nearest[i];
                if cumulative > target {
                    pick = Some(i);
                    break;
                }
            }

            let next = match pick {
                Some(i) => i,
                None => {
                    warn!("k-means++: no weighted pick available, falling back to uniform selection");
                    let remaining: Vec<usize> = (0..n).filter(|&i| !is_selected[i]).collect();
                    remaining[self.rng.random_range(0..remaining.len())]
                }
            };

            selected.push(next);
            is_selected[next] = true;
            for i in 0..n {
                let d = self.squared(&points[i], &points[next]);
                if d < nearest[i] {
                    nearest[i] = d;
                }
            }
        }

        Ok(selected)
    }
}
