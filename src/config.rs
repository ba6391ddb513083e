use crate::error::{QuantizeError, Result};

pub const DEFAULT_CLUSTERS: usize = 256;
pub const DEFAULT_MAX_ROUNDS: usize = 20;
/// Smallest per-channel centroid movement that counts as a change.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Knobs for one quantization call.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeConfig {
    /// Number of clusters, i.e. the upper bound on output colors.
    pub k: usize,
    pub max_rounds: usize,
    pub tolerance: f64,
    /// Seed for centroid initialization. `None` draws a time-based seed at
    /// the entry point.
    pub seed: Option<u64>,
    /// Size of a dedicated worker pool. `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_CLUSTERS,
            max_rounds: DEFAULT_MAX_ROUNDS,
            tolerance: DEFAULT_TOLERANCE,
            seed: None,
            threads: None,
        }
    }
}

impl QuantizeConfig {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Checks the parameters that do not depend on the input pixels.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(QuantizeError::ZeroClusters);
        }
        if self.max_rounds == 0 {
            return Err(QuantizeError::InvalidParameter {
                name: "max_rounds",
                message: "must be at least 1",
            });
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(QuantizeError::InvalidParameter {
                name: "tolerance",
                message: "must be a non-negative number",
            });
        }
        if self.threads == Some(0) {
            return Err(QuantizeError::InvalidParameter {
                name: "threads",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}
