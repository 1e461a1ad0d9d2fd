//! A balanced KD-tree over a borrowed point slice.
//!
//! Each node splits its points at the median along one axis, starting from `depth % N`. The
//! left subtree holds points strictly less than the splitting point along that axis; the right
//! subtree holds points greater or equal. When half or more of a node's points share the
//! smallest value on the axis, that tie group goes left and the split moves to the first
//! larger value, so runs of shared coordinates cannot stack into a chain. An axis on which every
//! point ties is skipped, and points that tie on every axis are kept together in one node.
//!
//! Nodes live in a flat arena and both construction and queries walk it with explicit stacks,
//! so neither depends on tree depth for stack space. Queries descend toward the query first
//! and visit the far subtree only when the metric's axis bound does not rule it out.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{ensure_finite, Metric, Point};
use crate::error::{Error, Result};

/// One tree node. Children are ids into the tree's arena (see [`KdTree::node`]).
///
/// Nodes are only built by [`KdTree::build`], so every index, axis and child id is in range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    index: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
    duplicates: Vec<usize>,
}

impl Node {
    /// Index of the splitting point in the original slice.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn left(&self) -> Option<usize> {
        self.left
    }

    pub fn right(&self) -> Option<usize> {
        self.right
    }

    /// Further points with exactly the coordinates of [`Node::index`].
    pub fn duplicates(&self) -> &[usize] {
        &self.duplicates
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    fn members(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.index).chain(self.duplicates.iter().copied())
    }
}

/// A query hit: point index and its distance (in the metric's scale) to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// KD-tree over `points`, answering queries with `metric`.
#[derive(Debug)]
pub struct KdTree<'a, const N: usize, M> {
    points: &'a [Point<N>],
    metric: M,
    /// Root first.
    nodes: Vec<Node>,
}

impl<'a, const N: usize, M: Metric<N>> KdTree<'a, N, M> {
    /// Build the tree. Fails on zero-dimensional or non-finite points.
    pub fn build(points: &'a [Point<N>], metric: M) -> Result<Self> {
        if N == 0 {
            return Err(Error::InvalidParameter {
                name: "dimension",
                message: "must be at least 1",
            });
        }
        ensure_finite(points)?;

        Ok(Self {
            points,
            metric,
            nodes: build_nodes(points),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Look up a node by the id stored in its parent.
    pub fn node(&self, id: usize) -> Result<&Node> {
        self.nodes.get(id).ok_or(Error::OutOfRange {
            name: "node id",
            value: id,
            bound: self.nodes.len(),
        })
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Look up the point behind an index returned by a query.
    pub fn point(&self, index: usize) -> Result<&Point<N>> {
        self.points.get(index).ok_or(Error::OutOfRange {
            name: "point index",
            value: index,
            bound: self.points.len(),
        })
    }

    /// The closest point to `query`, or `None` for an empty tree.
    pub fn nearest(&self, query: &Point<N>) -> Option<Neighbor> {
        let mut best: Option<Neighbor> = None;
        self.walk(
            query,
            &mut best,
            |best, bound| best.map_or(true, |b| bound < b.distance),
            |best, neighbor| {
                if best.map_or(true, |b| neighbor.distance < b.distance) {
                    *best = Some(neighbor);
                }
            },
        );
        best
    }

    /// Up to `k` closest points, nearest first.
    pub fn nearest_k(&self, query: &Point<N>, k: usize) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k + 1);
        self.walk(
            query,
            &mut heap,
            |heap, bound| heap.len() < k || heap.peek().is_some_and(|worst| bound < worst.distance),
            |heap, candidate| {
                if heap.len() < k {
                    heap.push(candidate);
                } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                    heap.pop();
                    heap.push(candidate);
                }
            },
        );
        heap.into_sorted_vec()
    }

    /// All points whose distance to `query` is at most `radius` (in the metric's scale).
    pub fn within(&self, query: &Point<N>, radius: f64) -> Vec<Neighbor> {
        let mut found: Vec<Neighbor> = Vec::new();
        self.walk(
            query,
            &mut found,
            |_, bound| bound <= radius,
            |found, neighbor| {
                if neighbor.distance <= radius {
                    found.push(neighbor);
                }
            },
        );
        found
    }

    /// Branch-and-bound traversal. `visit(state, bound)` decides whether a subtree whose points
    /// are at least `bound` away is still worth entering; `report` sees every evaluated point.
    fn walk<S>(
        &self,
        query: &Point<N>,
        state: &mut S,
        visit: impl Fn(&S, f64) -> bool,
        report: impl Fn(&mut S, Neighbor),
    ) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack: Vec<(usize, f64)> = vec![(0, 0.0)];
        while let Some((id, bound)) = stack.pop() {
            if !visit(state, bound) {
                continue;
            }
            let node = &self.nodes[id];
            let distance = self.metric.eval(query, &self.points[node.index]);
            for index in node.members() {
                report(state, Neighbor { index, distance });
            }

            let delta = query[node.axis] - self.points[node.index][node.axis];
            let (near, far) = if delta < 0.0 {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };
            // Far side first so the near side is popped next.
            if let Some(far) = far {
                stack.push((far, bound.max(self.metric.axis_bound(node.axis, delta))));
            }
            if let Some(near) = near {
                stack.push((near, bound));
            }
        }
    }
}

/// A slice of the index buffer still waiting for a node.
struct Pending {
    start: usize,
    end: usize,
    axis: usize,
    parent: Option<(usize, bool)>,
}

fn build_nodes<const N: usize>(points: &[Point<N>]) -> Vec<Node> {
    let mut indices: Vec<usize> = (0..points.len()).collect();
    let mut nodes: Vec<Node> = Vec::with_capacity(points.len());
    let mut stack = vec![Pending {
        start: 0,
        end: indices.len(),
        axis: 0,
        parent: None,
    }];

    while let Some(Pending { start, end, axis, parent }) = stack.pop() {
        if start == end {
            continue;
        }
        let slice = &mut indices[start..end];
        let id = nodes.len();

        let node = match split_axis(points, slice, axis) {
            None => Node {
                index: slice[0],
                axis,
                left: None,
                right: None,
                duplicates: slice[1..].to_vec(),
            },
            Some(axis) => {
                let median = split_position(points, slice, axis);
                let next = (axis + 1) % N;
                stack.push(Pending {
                    start,
                    end: start + median,
                    axis: next,
                    parent: Some((id, true)),
                });
                stack.push(Pending {
                    start: start + median + 1,
                    end,
                    axis: next,
                    parent: Some((id, false)),
                });
                Node {
                    index: slice[median],
                    axis,
                    left: None,
                    right: None,
                    duplicates: Vec::new(),
                }
            }
        };
        nodes.push(node);

        if let Some((parent, is_left)) = parent {
            if is_left {
                nodes[parent].left = Some(id);
            } else {
                nodes[parent].right = Some(id);
            }
        }
    }
    nodes
}

/// Sort `slice` along the first axis, from `preferred` on, where its points do not all tie.
/// `None` when the points coincide.
fn split_axis<const N: usize>(points: &[Point<N>], slice: &mut [usize], preferred: usize) -> Option<usize> {
    (0..N).map(|step| (preferred + step) % N).find(|&axis| {
        slice.sort_unstable_by(|&a, &b| points[a][axis].total_cmp(&points[b][axis]).then(a.cmp(&b)));
        let first = points[slice[0]][axis];
        let last = points[slice[slice.len() - 1]][axis];
        first.total_cmp(&last) != Ordering::Equal
    })
}

/// Position of the splitting point in a slice sorted along `axis` whose values are not all
/// equal. Everything before it is strictly less along `axis`.
fn split_position<const N: usize>(points: &[Point<N>], slice: &[usize], axis: usize) -> usize {
    let value = |i: usize| points[slice[i]][axis];
    let mut median = slice.len() / 2;
    let split_value = value(median);
    while median > 0 && value(median - 1).total_cmp(&split_value) == Ordering::Equal {
        median -= 1;
    }
    if median == 0 {
        // The median ties with the minimum: split at the first larger value instead.
        let min = value(0);
        median = (1..slice.len())
            .find(|&i| value(i).total_cmp(&min) == Ordering::Greater)
            .unwrap_or(0);
    }
    median
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Euclidean, SquaredEuclidean};

    type Tree<'a> = KdTree<'a, 2, Euclidean>;

    /// Every point index in the subtree under `id`.
    fn collect(tree: &Tree<'_>, id: Option<usize>) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = id.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = tree.node(id).unwrap();
            out.push(node.index());
            out.extend_from_slice(node.duplicates());
            stack.extend(node.left().into_iter().chain(node.right()));
        }
        out
    }

    fn check_partition(points: &[[f64; 2]], tree: &Tree<'_>) {
        for id in 0..tree.nodes.len() {
            let node = tree.node(id).unwrap();
            let split = points[node.index()][node.axis()];
            for i in collect(tree, node.left()) {
                assert!(points[i][node.axis()] < split);
            }
            for i in collect(tree, node.right()) {
                assert!(points[i][node.axis()] >= split);
            }
            for &i in node.duplicates() {
                assert_eq!(points[i], points[node.index()]);
            }
        }
    }

    /// Length of the longest root-to-leaf path.
    fn depth(tree: &Tree<'_>) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(usize, usize)> = if tree.is_empty() { Vec::new() } else { vec![(0, 1)] };
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            let node = tree.node(id).unwrap();
            for child in node.left().into_iter().chain(node.right()) {
                stack.push((child, level + 1));
            }
        }
        deepest
    }

    fn brute_force_nearest(points: &[[f64; 2]], query: &[f64; 2]) -> f64 {
        points
            .iter()
            .map(|p| Euclidean.eval(query, p))
            .fold(f64::INFINITY, f64::min)
    }

    fn grid() -> Vec<[f64; 2]> {
        let mut points = Vec::new();
        for i in 0..7 {
            for j in 0..5 {
                points.push([i as f64 * 1.5, (j * j) as f64 * 0.7]);
            }
        }
        points
    }

    #[test]
    fn node_accessors() {
        let points = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let tree = KdTree::build(&points, Euclidean).unwrap();
        let root = tree.root().unwrap();

        assert_eq!(root.index(), 1);
        assert_eq!(root.axis(), 0);
        assert!(!root.is_leaf());
        let left = tree.node(root.left().unwrap()).unwrap();
        let right = tree.node(root.right().unwrap()).unwrap();
        assert_eq!((left.index(), right.index()), (0, 2));
        assert!(left.is_leaf() && right.is_leaf());
        assert!(matches!(tree.node(3), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn build_holds_each_index_once() {
        let mut points = grid();
        points.extend([[3.0, 2.8], [3.0, 2.8], [3.0, 2.8]]);
        let tree = KdTree::build(&points, Euclidean).unwrap();

        let mut seen = collect(&tree, Some(0));
        seen.sort_unstable();
        assert_eq!(seen, (0..points.len()).collect::<Vec<_>>());
    }

    #[test]
    fn build_partitions_strictly() {
        let mut points = grid();
        points.extend([[3.0, 2.8], [3.0, 2.8], [3.0, 0.0]]);
        let tree = KdTree::build(&points, Euclidean).unwrap();
        check_partition(&points, &tree);
    }

    #[test]
    fn coincident_points_share_one_node() {
        let points = vec![[0.5, 0.5]; 40_000];
        let tree = KdTree::build(&points, Euclidean).unwrap();
        assert_eq!(depth(&tree), 1);
        assert_eq!(tree.root().unwrap().duplicates().len(), 39_999);

        let hit = tree.nearest(&[0.0, 0.0]).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(tree.nearest_k(&[0.5, 0.5], 9).len(), 9);
        assert_eq!(tree.within(&[0.5, 0.5], 0.0).len(), 40_000);
        assert!(tree.within(&[0.0, 0.0], 0.5).is_empty());
    }

    #[test]
    fn heavy_ties_stay_shallow() {
        // Most points share a coordinate with the minimum on both axes.
        let mut points = vec![[0.0, 0.0]; 30_000];
        points.extend((0..10_000).map(|i| [0.0, (i % 7) as f64]));
        points.extend((0..10_000).map(|i| [(i % 5) as f64, 1.0]));
        let tree = KdTree::build(&points, Euclidean).unwrap();

        assert!(depth(&tree) < 64, "depth {}", depth(&tree));
        check_partition(&points, &tree);
        let mut seen = collect(&tree, Some(0));
        seen.sort_unstable();
        assert_eq!(seen.len(), points.len());
        seen.dedup();
        assert_eq!(seen.len(), points.len());

        let query = [0.0, 0.0];
        let expected = points.iter().filter(|p| Euclidean.eval(&query, p) <= 1.0).count();
        assert_eq!(tree.within(&query, 1.0).len(), expected);
        assert_eq!(tree.nearest(&[4.2, 1.1]).unwrap().distance, Euclidean.eval(&[4.2, 1.1], &[4.0, 1.0]));
    }

    #[test]
    fn empty_tree() {
        let points: Vec<[f64; 2]> = Vec::new();
        let tree = KdTree::build(&points, Euclidean).unwrap();
        assert!(tree.is_empty());
        assert!(tree.nearest(&[0.0, 0.0]).is_none());
        assert!(tree.within(&[0.0, 0.0], 10.0).is_empty());
    }

    #[test]
    fn rejects_non_finite_points() {
        let points = vec![[0.0, 0.0], [f64::NAN, 1.0]];
        assert!(matches!(
            KdTree::build(&points, Euclidean),
            Err(Error::NonFinite { .. })
        ));
    }

    #[test]
    fn point_lookup_is_range_checked() {
        let points = vec![[0.0, 0.0]];
        let tree = KdTree::build(&points, Euclidean).unwrap();
        assert!(tree.point(0).is_ok());
        assert!(matches!(tree.point(1), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn nearest_matches_brute_force() {
        let points = grid();
        let tree = KdTree::build(&points, Euclidean).unwrap();
        for query in [[0.1, 0.1], [4.4, 3.0], [20.0, -5.0], [7.5, 11.2], [2.25, 1.4]] {
            let hit = tree.nearest(&query).unwrap();
            assert!((hit.distance - brute_force_nearest(&points, &query)).abs() < 1e-12);
        }
    }

    #[test]
    fn nearest_with_shared_coordinates() {
        let points = vec![[1.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 1.0], [1.0, 1.0]];
        let tree = KdTree::build(&points, SquaredEuclidean).unwrap();
        let hit = tree.nearest(&[1.0, 1.0]).unwrap();
        assert_eq!(hit.distance, 0.0);
        assert_eq!(points[hit.index], [1.0, 1.0]);
    }

    #[test]
    fn nearest_k_is_sorted() {
        let points = grid();
        let tree = KdTree::build(&points, Euclidean).unwrap();
        let query = [4.0, 2.0];
        let hits = tree.nearest_k(&query, 4);
        assert_eq!(hits.len(), 4);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

        let mut brute: Vec<f64> = points.iter().map(|p| Euclidean.eval(&query, p)).collect();
        brute.sort_by(f64::total_cmp);
        for (hit, expected) in hits.iter().zip(brute) {
            assert!((hit.distance - expected).abs() < 1e-12);
        }

        assert_eq!(tree.nearest_k(&query, 100).len(), points.len());
        assert!(tree.nearest_k(&query, 0).is_empty());
    }

    #[test]
    fn within_matches_brute_force() {
        let points = grid();
        let tree = KdTree::build(&points, Euclidean).unwrap();
        let query = [4.5, 2.8];
        let radius = 2.0;

        let mut hits: Vec<usize> = tree.within(&query, radius).iter().map(|n| n.index).collect();
        hits.sort_unstable();
        let expected: Vec<usize> = (0..points.len())
            .filter(|&i| Euclidean.eval(&query, &points[i]) <= radius)
            .collect();
        assert_eq!(hits, expected);
    }

    #[test]
    fn within_uses_metric_scale() {
        let points = vec![[0.0, 0.0], [3.0, 0.0], [0.0, 4.0]];
        let tree = KdTree::build(&points, SquaredEuclidean).unwrap();
        assert_eq!(tree.within(&[0.0, 0.0], 9.0).len(), 2);
        assert_eq!(tree.within(&[0.0, 0.0], 16.0).len(), 3);
    }
}
