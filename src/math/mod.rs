//! Points, distance functions, and the KD-tree spatial index.

mod distance;
pub mod kdtree;

pub use distance::{Distance, Euclidean, Metric, Scale, SquaredEuclidean, WeightedEuclidean};
pub(crate) use distance::is_finite;
pub use kdtree::{KdTree, Neighbor, Node};

/// A fixed-length numeric vector. Points have no identity beyond their index.
pub type Point<const N: usize> = [f64; N];

/// Pure spatial point.
pub type Point2 = Point<2>;

/// Image feature point: `(x, y, L, a, b)`.
pub type Point5 = Point<5>;

/// Validate that every component of every point is finite.
pub(crate) fn ensure_finite<const N: usize>(points: &[Point<N>]) -> crate::Result<()> {
    if points.iter().all(|p| is_finite(p)) {
        Ok(())
    } else {
        Err(crate::Error::NonFinite {
            context: "point components",
        })
    }
}
