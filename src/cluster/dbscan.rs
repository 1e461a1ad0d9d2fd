//! DBSCAN: Density-Based Spatial Clustering of Applications with Noise.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! DBSCAN groups points based on neighborhood density. Unlike k-means, it:
//!
//! - Discovers clusters of arbitrary shape
//! - Automatically determines the number of clusters
//! - Identifies noise points (outliers)
//!
//! ## Core Concepts
//!
//! - **Threshold (ε)**: Maximum distance between two points to be neighbors.
//! - **MinPoints**: Minimum neighbors within ε (the point itself included) for a point
//!   to be "core".
//! - **Border point**: Within ε of a core point but not core itself.
//! - **Noise point**: Neither core nor border.
//!
//! ## Algorithm Steps
//!
//! 1. For each unvisited point P, in ascending index order:
//!    - Find neighbors within ε
//!    - If |neighbors| < MinPoints, mark as noise (may be claimed as a border point later)
//!    - Else P is core: open a new cluster and expand breadth-first from its neighbors
//!
//! 2. Expansion: every reached point joins the cluster; reached core points enqueue their
//!    own neighbors.
//!
//! ## Complexity
//!
//! Neighborhoods come from a KD-tree radius query, so the usual cost is O(n log n)
//! rather than the O(n²) of a linear scan.
//!
//! ## References
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use std::collections::VecDeque;

use log::debug;
use serde::{Deserialize, Serialize};

use super::traits::Clustering;
use super::{Labels, NOISE};
use crate::error::{Error, Result};
use crate::math::{KdTree, Metric, Point};

/// DBSCAN clustering algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dbscan {
    /// Minimum points (including itself) within `threshold` for a core point.
    min_points: usize,
    /// Neighborhood radius, as a linear distance.
    threshold: f64,
}

// Internal label encoding.
// - UNCLASSIFIED: never assigned yet
// - NOISE_LABEL: visited, but not density-reachable from any core point (may be promoted later)
const UNCLASSIFIED: isize = -2;
const NOISE_LABEL: isize = -1;

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `min_points` - Minimum number of points to form a dense region.
    /// * `threshold` - Maximum distance between two points to be neighbors.
    pub fn new(min_points: usize, threshold: f64) -> Self {
        Self {
            min_points,
            threshold,
        }
    }

    /// Set minimum points for core classification.
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Set the neighborhood radius.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn validate(&self) -> Result<()> {
        if self.min_points == 0 {
            return Err(Error::InvalidParameter {
                name: "min_points",
                message: "must be at least 1",
            });
        }
        if !self.threshold.is_finite() {
            return Err(Error::NonFinite {
                context: "threshold",
            });
        }
        if self.threshold <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "threshold",
                message: "must be positive",
            });
        }
        Ok(())
    }

    /// Expand a cluster breadth-first from a core point.
    fn expand_cluster<const N: usize, M: Metric<N>>(
        &self,
        tree: &KdTree<'_, N, M>,
        points: &[Point<N>],
        seeds: Vec<usize>,
        radius: f64,
        labels: &mut [isize],
        visited: &mut [bool],
        cluster_id: isize,
    ) {
        let mut queue: VecDeque<usize> = seeds.into();

        while let Some(index) = queue.pop_front() {
            // A point previously labeled noise can still become a border point, so the label
            // is assigned before the `visited` check.
            if labels[index] == UNCLASSIFIED || labels[index] == NOISE_LABEL {
                labels[index] = cluster_id;
            }

            if visited[index] {
                continue;
            }
            visited[index] = true;

            let neighbors = tree.within(&points[index], radius);
            if neighbors.len() >= self.min_points {
                queue.extend(neighbors.iter().map(|n| n.index).filter(|&i| !visited[i]));
            }
        }
    }
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(9, 0.04)
    }
}

impl Clustering for Dbscan {
    fn fit_predict<const N: usize, M: Metric<N>>(&self, points: &[Point<N>], metric: &M) -> Result<Labels> {
        let n = points.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        self.validate()?;

        let tree = KdTree::build(points, metric)?;
        let radius = metric.scale().from_linear(self.threshold);

        let mut labels = vec![UNCLASSIFIED; n];
        let mut visited = vec![false; n];
        let mut cluster_id: isize = 0;

        for index in 0..n {
            if visited[index] {
                continue;
            }
            visited[index] = true;

            let neighbors = tree.within(&points[index], radius);
            if neighbors.len() < self.min_points {
                labels[index] = NOISE_LABEL;
                continue;
            }

            labels[index] = cluster_id;
            let seeds = neighbors.iter().map(|n| n.index).collect();
            self.expand_cluster(&tree, points, seeds, radius, &mut labels, &mut visited, cluster_id);
            cluster_id += 1;
        }

        let labels = Labels::new(
            labels
                .into_iter()
                .map(|l| if l >= 0 { l as usize } else { NOISE })
                .collect(),
        );
        debug!(
            "dbscan: {} points, {} clusters, {} noise",
            n,
            labels.num_clusters(),
            labels.noise_count()
        );
        Ok(labels)
    }

    /// DBSCAN discovers clusters dynamically, so this returns 0.
    fn n_clusters(&self) -> usize {
        0
    }
}
