use super::Labels;
use crate::error::Result;
use crate::math::{Metric, Point};

/// Common interface for hard clustering algorithms (one label per point).
pub trait Clustering {
    /// Fit the model (if needed) and return one cluster label per input point,
    /// measuring proximity with `metric`.
    fn fit_predict<const N: usize, M: Metric<N>>(&self, points: &[Point<N>], metric: &M) -> Result<Labels>;

    /// The configured number of clusters (if applicable).
    ///
    /// For algorithms that discover the number of clusters dynamically (e.g. DBSCAN),
    /// this returns 0.
    fn n_clusters(&self) -> usize;
}
