use std::collections::HashSet;

use rand::Rng;

use crate::error::{QuantizeError, Result, try_vec_with_capacity};
use crate::vector::ColorVector;

fn try_key_set(len: usize) -> Result<HashSet<[u64; 3]>> {
    let mut set = HashSet::new();
    set.try_reserve(len)
        .map_err(|source| QuantizeError::Allocation {
            what: "distinct color set",
            len,
            source,
        })?;
    Ok(set)
}

/// Counts distinct colors in `vectors`, stopping as soon as `limit` are seen.
pub fn distinct_colors(vectors: &[ColorVector], limit: usize) -> Result<usize> {
    let mut seen = try_key_set(limit.min(vectors.len()))?;
    for v in vectors {
        if seen.len() >= limit {
            break;
        }
        seen.insert(v.key());
    }
    Ok(seen.len())
}

/// Picks `k` pairwise distinct centroids by drawing input vectors uniformly
/// at random and rejecting values already chosen.
///
/// Fails up front when the input holds fewer than `k` distinct colors, so the
/// rejection loop always has a value left to find.
pub fn sample_centroids(
    vectors: &[ColorVector],
    k: usize,
    rng: &mut impl Rng,
) -> Result<Vec<ColorVector>> {
    if k == 0 {
        return Err(QuantizeError::ZeroClusters);
    }
    if k > vectors.len() {
        return Err(QuantizeError::TooManyClusters {
            k,
            pixels: vectors.len(),
        });
    }
    let distinct = distinct_colors(vectors, k)?;
    if distinct < k {
        return Err(QuantizeError::NotEnoughColors { k, distinct });
    }

    let mut centroids = try_vec_with_capacity("centroids", k)?;
    let mut chosen = try_key_set(k)?;
    let mut draws = 0usize;
    while centroids.len() < k {
        let candidate = vectors[rng.random_range(0..vectors.len())];
        draws += 1;
        if chosen.insert(candidate.key()) {
            centroids.push(candidate);
        }
    }
    tracing::trace!(k, draws, "sampled initial centroids");

    Ok(centroids)
}

/// Checks caller-provided starting centroids.
pub fn validate_centroids(vectors: &[ColorVector], centroids: &[ColorVector]) -> Result<()> {
    if centroids.is_empty() {
        return Err(QuantizeError::ZeroClusters);
    }
    if centroids.len() > vectors.len() {
        return Err(QuantizeError::TooManyClusters {
            k: centroids.len(),
            pixels: vectors.len(),
        });
    }
    if !centroids.iter().all(ColorVector::is_finite) {
        return Err(QuantizeError::InvalidParameter {
            name: "centroids",
            message: "channels must be finite",
        });
    }
    let mut seen = try_key_set(centroids.len())?;
    for (index, c) in centroids.iter().enumerate() {
        if !seen.insert(c.key()) {
            return Err(QuantizeError::DuplicateCentroid { index });
        }
    }
    Ok(())
}
