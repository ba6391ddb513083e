use std::collections::TryReserveError;

use thiserror::Error;

/// Errors returned by the quantizer.
///
/// Variants fall into two families: bad input parameters (see
/// [`QuantizeError::is_invalid_input`]) and internal resource exhaustion
/// (see [`QuantizeError::is_resource_exhaustion`]). After any error the
/// caller's pixel buffer must be treated as unspecified.
#[derive(Debug, Error)]
pub enum QuantizeError {
    #[error("cluster count must be at least 1")]
    ZeroClusters,

    #[error("cluster count {k} exceeds the number of pixels ({pixels})")]
    TooManyClusters { k: usize, pixels: usize },

    #[error("cluster count {k} exceeds the number of distinct colors in the input ({distinct})")]
    NotEnoughColors { k: usize, distinct: usize },

    #[error("pixel buffer length {len} is not a multiple of 3")]
    InvalidBufferLength { len: usize },

    #[error("initial centroids must be pairwise distinct (centroid {index} repeats an earlier one)")]
    DuplicateCentroid { index: usize },

    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        name: &'static str,
        message: &'static str,
    },

    #[error("failed to allocate {what} ({len} entries)")]
    Allocation {
        what: &'static str,
        len: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("failed to build worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl QuantizeError {
    /// True when the call was rejected because of its arguments.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            QuantizeError::ZeroClusters
                | QuantizeError::TooManyClusters { .. }
                | QuantizeError::NotEnoughColors { .. }
                | QuantizeError::InvalidBufferLength { .. }
                | QuantizeError::DuplicateCentroid { .. }
                | QuantizeError::InvalidParameter { .. }
        )
    }

    /// True when the call failed because memory or threads could not be obtained.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            QuantizeError::Allocation { .. } | QuantizeError::ThreadPool(_)
        )
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, QuantizeError>;

/// Allocates an empty vector able to hold `len` items, reporting failure
/// instead of aborting the process.
pub(crate) fn try_vec_with_capacity<T>(what: &'static str, len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|source| QuantizeError::Allocation { what, len, source })?;
    Ok(v)
}
