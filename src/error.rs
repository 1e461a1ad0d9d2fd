use thiserror::Error;

/// Errors returned by the colorimetry, clustering, and extraction layers of this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of items in the dataset.
        n_items: usize,
    },

    /// A numeric component was NaN or infinite.
    #[error("non-finite value in {context}")]
    NonFinite {
        /// Where the value was found.
        context: &'static str,
    },

    /// A value could not be parsed as a color.
    #[error("value is not parsable to a color: {0:?}")]
    InvalidColor(String),

    /// Pixel buffer does not match its declared dimensions.
    #[error("invalid image: {width}x{height} requires {expected} bytes, found {found}")]
    InvalidImage {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Expected buffer length (`width * height * 4`).
        expected: usize,
        /// Actual buffer length.
        found: usize,
    },

    /// An index or axis lies outside the structure it refers to.
    #[error("{name} {value} is out of range (must be < {bound})")]
    OutOfRange {
        /// What was indexed.
        name: &'static str,
        /// The offending value.
        value: usize,
        /// Exclusive upper bound.
        bound: usize,
    },

    /// The palette holds no swatches.
    #[error("palette is empty")]
    EmptyPalette,

    /// Clustering labelled every point as noise.
    #[error("clustering produced no clusters")]
    NoClusters,

    /// The background worker failed or went away.
    #[error("worker error: {0}")]
    Worker(String),
}

impl Error {
    /// True for errors caused by caller-supplied values rather than by the data or the pipeline.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput
                | Error::InvalidParameter { .. }
                | Error::InvalidClusterCount { .. }
                | Error::NonFinite { .. }
                | Error::InvalidColor(_)
                | Error::InvalidImage { .. }
        )
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
