//! HDBSCAN: Hierarchical Density-Based Spatial Clustering of Applications with Noise.
//!
//! HDBSCAN (Campello, Moulavi, Sander 2013) extends DBSCAN by removing the global
//! threshold parameter and instead building a hierarchy of density-based clusters.
//! It selects the most stable clusters from the hierarchy automatically.
//!
//! # Algorithm Outline
//!
//! 1. **Core distance**: For each point, the distance to its k-th nearest neighbor
//!    (k = `min_points`, the point itself counted). This estimates local density.
//!    Neighbors come from a KD-tree query.
//!
//! 2. **Mutual reachability distance**: For each pair (i, j):
//!    `mrd(i, j) = max(core[i], core[j], dist(i, j))`.
//!    This smooths out density spikes so sparse regions don't create spurious links.
//!
//! 3. **MST on mutual reachability graph**: Prim's algorithm over the complete graph (O(n^2)).
//!
//! 4. **Condensed cluster tree**: Walk MST edges in ascending distance order, merging
//!    components with a union-find. A component becomes a cluster once it reaches
//!    `min_cluster_size`. Merging two clusters creates their parent; merging a cluster with
//!    a smaller component makes that component's points "fall out" of the cluster.
//!
//! 5. **Stability-based cluster extraction**: With `λ = 1 / distance`, each cluster scores
//!    `Σ_p (λ_p - λ_birth)` over its members. Select the set of non-overlapping clusters
//!    that maximizes total stability.
//!
//! 6. **Noise labeling**: Points not in any selected cluster are labeled as noise.
//!
//! # When to Use
//!
//! - **HDBSCAN vs DBSCAN**: HDBSCAN handles varying-density clusters without requiring
//!   a global threshold. Prefer HDBSCAN when cluster densities differ significantly.
//! - **HDBSCAN vs k-means**: HDBSCAN finds non-convex clusters and identifies noise.
//!   Prefer k-means when clusters are roughly spherical and you know k.
//! - **Complexity**: O(n^2) time for the dense MST, O(n) memory. Suitable for a few
//!   thousand points, which is the scale of a downsampled image. Above tens of thousands
//!   of points, downscale the image first or use DBSCAN, whose radius queries go through
//!   the KD-tree.
//!
//! # References
//!
//! Campello, R. J. G. B., Moulavi, D., Sander, J. (2013). "Density-Based Clustering
//! Based on Hierarchical Density Estimates." PAKDD 2013.

use log::debug;
use serde::{Deserialize, Serialize};

use super::traits::Clustering;
use super::util::{self, UnionFind};
use super::{Labels, NOISE};
use crate::error::{Error, Result};
use crate::math::{KdTree, Metric, Point};

/// HDBSCAN clustering algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hdbscan {
    min_points: usize,
    min_cluster_size: usize,
}

impl Hdbscan {
    /// Create a new HDBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `min_points` - Neighbor count k for the core distance.
    /// * `min_cluster_size` - Minimum points for a cluster to persist.
    pub fn new(min_points: usize, min_cluster_size: usize) -> Self {
        Self {
            min_points,
            min_cluster_size,
        }
    }

    /// Set `min_points` (k for core distance computation).
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Set `min_cluster_size` (minimum points for a cluster to persist).
    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    pub fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    fn validate(&self) -> Result<()> {
        if self.min_points == 0 {
            return Err(Error::InvalidParameter {
                name: "min_points",
                message: "must be at least 1",
            });
        }
        if self.min_cluster_size == 0 {
            return Err(Error::InvalidParameter {
                name: "min_cluster_size",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}

impl Default for Hdbscan {
    fn default() -> Self {
        Self::new(9, 9)
    }
}

impl Clustering for Hdbscan {
    fn fit_predict<const N: usize, M: Metric<N>>(&self, points: &[Point<N>], metric: &M) -> Result<Labels> {
        let n = points.len();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        self.validate()?;

        let tree = KdTree::build(points, metric)?;
        if n == 1 {
            return Ok(Labels::new(vec![NOISE]));
        }

        let core = core_distances(&tree, points, self.min_points);
        let scale = metric.scale();
        let mut mst = util::prim_mst(n, |i, j| {
            let dist = scale.to_linear(metric.eval(&points[i], &points[j]));
            mutual_reachability(dist, core[i], core[j])
        });
        mst.sort_by(|a, b| a.2.total_cmp(&b.2).then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1)));

        let labels = Labels::new(extract_clusters(&mst, n, self.min_cluster_size));
        debug!(
            "hdbscan: {} points, {} clusters, {} noise",
            n,
            labels.num_clusters(),
            labels.noise_count()
        );
        Ok(labels)
    }

    /// HDBSCAN discovers clusters dynamically, so this returns 0.
    fn n_clusters(&self) -> usize {
        0
    }
}

/// Linear distance from each point to its `k`-th nearest neighbor, itself included.
fn core_distances<const N: usize, M: Metric<N>>(
    tree: &KdTree<'_, N, M>,
    points: &[Point<N>],
    k: usize,
) -> Vec<f64> {
    let k = k.min(points.len());
    let scale = tree.metric().scale();
    points
        .iter()
        .map(|p| {
            tree.nearest_k(p, k)
                .last()
                .map_or(0.0, |nb| scale.to_linear(nb.distance))
        })
        .collect()
}

#[inline]
fn mutual_reachability(dist: f64, core_i: f64, core_j: f64) -> f64 {
    dist.max(core_i).max(core_j)
}

#[inline]
fn lambda(dist: f64) -> f64 {
    1.0 / dist.max(f64::EPSILON)
}

/// A node of the condensed tree.
///
/// `lambda_mass` accumulates `size * λ` over everything that left the cluster (points and
/// child clusters), so stability is `lambda_mass - birth * size`.
#[derive(Debug, Clone, Default)]
struct CondensedCluster {
    birth: f64,
    lambda_mass: f64,
    size: usize,
    points: Vec<usize>,
    children: Vec<usize>,
}

impl CondensedCluster {
    fn stability(&self) -> f64 {
        self.lambda_mass - self.birth * self.size as f64
    }

    fn fall_out(&mut self, members: &[usize], lambda: f64) {
        self.points.extend_from_slice(members);
        self.lambda_mass += members.len() as f64 * lambda;
        self.size += members.len();
    }
}

/// Condense the MST (sorted ascending) into a cluster tree and return flat labels.
///
/// Clusters are created bottom-up, so every child has a smaller id than its parent.
fn extract_clusters(mst: &[(usize, usize, f64)], n: usize, min_cluster_size: usize) -> Vec<usize> {
    // A cluster needs a merge to form, so sizes 1 and 2 behave alike.
    let min_size = min_cluster_size.max(2);

    let mut uf = UnionFind::new(n);
    let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    // UF root -> cluster id (None until the component reaches `min_size`).
    let mut comp_cluster: Vec<Option<usize>> = vec![None; n];
    let mut clusters: Vec<CondensedCluster> = Vec::new();

    for &(u, v, dist) in mst {
        let ru = uf.find(u);
        let rv = uf.find(v);
        if ru == rv {
            continue;
        }
        let level = lambda(dist);

        let merged = match (comp_cluster[ru], comp_cluster[rv]) {
            (Some(left), Some(right)) => {
                // Genuine split seen from above: both sides persist as children.
                let size = clusters[left].size + clusters[right].size;
                for child in [left, right] {
                    clusters[child].birth = level;
                }
                let parent = clusters.len();
                clusters.push(CondensedCluster {
                    lambda_mass: size as f64 * level,
                    size,
                    children: vec![left, right],
                    ..Default::default()
                });
                Some(parent)
            }
            (Some(cluster), None) => {
                clusters[cluster].fall_out(&members[rv], level);
                Some(cluster)
            }
            (None, Some(cluster)) => {
                clusters[cluster].fall_out(&members[ru], level);
                Some(cluster)
            }
            (None, None) if members[ru].len() + members[rv].len() >= min_size => {
                let mut cluster = CondensedCluster::default();
                cluster.fall_out(&members[ru], level);
                cluster.fall_out(&members[rv], level);
                clusters.push(cluster);
                Some(clusters.len() - 1)
            }
            (None, None) => None,
        };

        let (root, absorbed) = uf.union_roots(ru, rv);
        let moved = std::mem::take(&mut members[absorbed]);
        members[root].extend(moved);
        comp_cluster[root] = merged;
    }

    if clusters.is_empty() {
        return vec![NOISE; n];
    }

    let selected = select_clusters(&clusters);

    let mut labels = vec![NOISE; n];
    let mut stack = Vec::new();
    for (label, &cluster) in selected.iter().enumerate() {
        stack.push(cluster);
        while let Some(c) = stack.pop() {
            for &p in &clusters[c].points {
                labels[p] = label;
            }
            stack.extend_from_slice(&clusters[c].children);
        }
    }
    labels
}

/// Pick the non-overlapping clusters with maximal total stability, in ascending id order.
fn select_clusters(clusters: &[CondensedCluster]) -> Vec<usize> {
    let m = clusters.len();
    let mut selected = vec![false; m];
    let mut subtree = vec![0.0f64; m];

    // Children precede parents, so ascending order is bottom-up.
    for i in 0..m {
        let stability = clusters[i].stability();
        if clusters[i].children.is_empty() {
            selected[i] = true;
            subtree[i] = stability;
            continue;
        }
        let child_sum: f64 = clusters[i].children.iter().map(|&c| subtree[c]).sum();
        if stability > child_sum {
            selected[i] = true;
            deselect_descendants(clusters, i, &mut selected);
            subtree[i] = stability;
        } else {
            subtree[i] = child_sum;
        }
    }

    (0..m).filter(|&i| selected[i]).collect()
}

fn deselect_descendants(clusters: &[CondensedCluster], node: usize, selected: &mut [bool]) {
    let mut stack: Vec<usize> = clusters[node].children.clone();
    while let Some(c) = stack.pop() {
        selected[c] = false;
        stack.extend_from_slice(&clusters[c].children);
    }
}
