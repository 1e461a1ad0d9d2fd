/// Label reserved for points that belong to no cluster.
pub const NOISE: usize = usize::MAX;

/// The immutable outcome of one clustering run: one label per input point.
///
/// Cluster ids are dense in `0..num_clusters()`; noise points carry [`NOISE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    labels: Vec<usize>,
    num_clusters: usize,
}

impl Labels {
    pub(crate) fn new(labels: Vec<usize>) -> Self {
        let num_clusters = labels
            .iter()
            .filter(|&&l| l != NOISE)
            .max()
            .map_or(0, |&max| max + 1);
        Self {
            labels,
            num_clusters,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of the point at `index`.
    pub fn get(&self, index: usize) -> Option<usize> {
        self.labels.get(index).copied()
    }

    pub fn is_noise(&self, index: usize) -> bool {
        self.get(index) == Some(NOISE)
    }

    /// Number of label ids in use (highest label + 1).
    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == NOISE).count()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels.iter().copied()
    }

    /// Member indices per cluster id. Ids with no members yield an empty list.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut clusters = vec![Vec::new(); self.num_clusters];
        for (index, &label) in self.labels.iter().enumerate() {
            if label != NOISE {
                clusters[label].push(index);
            }
        }
        clusters
    }

    /// Labels with noise as `None`.
    pub fn to_options(&self) -> Vec<Option<usize>> {
        self.labels
            .iter()
            .map(|&l| if l == NOISE { None } else { Some(l) })
            .collect()
    }
}
