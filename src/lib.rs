//! Color quantization of packed RGB pixels with parallel k-means.
//!
//! [`quantize_in_place`] is the core entry point: it takes a caller-owned
//! `R, G, B, R, G, B, ...` byte buffer and rewrites it so that it holds at
//! most `k` distinct colors. File decoding and encoding live in
//! [`image_io`] and are optional collaborators.

pub mod config;
pub mod error;
pub mod image_io;
pub mod kmeans;
pub mod rng;
pub mod vector;

pub use config::QuantizeConfig;
pub use error::{QuantizeError, Result};
pub use image_io::{quantize_file, quantize_image_bytes};
pub use kmeans::{Clustering, KMeans, RoundStats, RunReport};
pub use vector::{ColorVector, pack, unpack};

/// What a quantization call produced besides the rewritten pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantization {
    /// Final centroids as bytes, in cluster order. Several entries may share
    /// a byte value once truncated.
    pub palette: Vec<[u8; 3]>,
    pub report: RunReport,
    /// Seed that drove centroid initialization; pass it back through
    /// [`QuantizeConfig::with_seed`] to reproduce the run.
    pub seed: u64,
}

impl Quantization {
    pub fn palette_hex(&self) -> Vec<String> {
        self.palette
            .iter()
            .map(|c| format!("{:02X}{:02X}{:02X}", c[0], c[1], c[2]))
            .collect()
    }

    /// Number of different byte values in the palette. Can be below `k` when
    /// centroids truncate to the same bytes.
    pub fn distinct_colors(&self) -> usize {
        self.palette
            .iter()
            .collect::<std::collections::HashSet<_>>()
            .len()
    }
}

/// Quantizes `pixels` in place to at most `config.k` colors.
///
/// `pixels` must hold whole RGB triples. The buffer is borrowed mutably for
/// the whole call, so it can't be quantized by two callers at once. On error
/// the buffer contents are unspecified.
pub fn quantize_in_place(pixels: &mut [u8], config: &QuantizeConfig) -> Result<Quantization> {
    config.validate()?;
    if !pixels.len().is_multiple_of(3) {
        return Err(QuantizeError::InvalidBufferLength { len: pixels.len() });
    }
    let pixel_count = pixels.len() / 3;
    if config.k > pixel_count {
        return Err(QuantizeError::TooManyClusters {
            k: config.k,
            pixels: pixel_count,
        });
    }

    let seed = config.seed.unwrap_or_else(rng::time_seed);
    tracing::debug!(k = config.k, pixels = pixel_count, seed, "quantizing");

    with_workers(config.threads, || {
        let mut vectors = vector::try_unpack(pixels)?;
        let clustering = KMeans::from_config(config).run(&mut vectors, seed)?;
        vector::pack(&vectors, pixels);

        Ok(Quantization {
            palette: clustering.centroids.iter().map(|c| c.to_bytes()).collect(),
            report: clustering.report,
            seed,
        })
    })
}

/// Runs `op` on a dedicated pool of `threads` workers, or on rayon's global
/// pool when no size is given.
fn with_workers<T, F>(threads: Option<usize>, op: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send,
    T: Send,
{
    match threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(op)
        }
        None => op(),
    }
}
