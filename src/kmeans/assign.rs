use rayon::prelude::*;

use super::CHUNK_LEN;
use crate::error::{Result, try_vec_with_capacity};
use crate::vector::ColorVector;

/// Outcome of one assignment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssignStats {
    /// Vectors whose cluster index differs from the previous pass.
    pub changes: usize,
    /// Sum of squared distances from each vector to its chosen centroid.
    pub inertia: f64,
}

impl AssignStats {
    fn merge(self, other: AssignStats) -> AssignStats {
        AssignStats {
            changes: self.changes + other.changes,
            inertia: self.inertia + other.inertia,
        }
    }
}

/// Index and squared distance of the centroid closest to `v`. Ties go to the
/// lowest index.
#[inline]
pub fn nearest(v: &ColorVector, centroids: &[ColorVector]) -> (usize, f64) {
    let mut min_idx = 0;
    let mut min = v.distance_squared(&centroids[0]);
    for (j, c) in centroids.iter().enumerate().skip(1) {
        let d = v.distance_squared(c);
        if d < min {
            min = d;
            min_idx = j;
        }
    }
    (min_idx, min)
}

fn assign_chunk(
    vectors: &[ColorVector],
    centroids: &[ColorVector],
    assignments: &mut [usize],
) -> AssignStats {
    let mut stats = AssignStats::default();
    for (slot, v) in assignments.iter_mut().zip(vectors) {
        let (idx, d) = nearest(v, centroids);
        if *slot != idx {
            *slot = idx;
            stats.changes += 1;
        }
        stats.inertia += d;
    }
    stats
}

/// Points every vector at its nearest centroid.
///
/// Chunks are handed out through rayon's work stealing; each worker writes
/// only its own slice of `assignments`. Per-chunk stats are summed in chunk
/// order, so the result does not depend on the number of workers.
///
/// # Panics
///
/// Panics if `vectors` and `assignments` differ in length or if `centroids`
/// is empty.
pub fn assign_points(
    vectors: &[ColorVector],
    centroids: &[ColorVector],
    assignments: &mut [usize],
) -> Result<AssignStats> {
    assert_eq!(vectors.len(), assignments.len());
    assert!(!centroids.is_empty());

    let n_chunks = vectors.len().div_ceil(CHUNK_LEN);
    let mut partials: Vec<AssignStats> =
        try_vec_with_capacity("assignment partials", n_chunks)?;
    partials.par_extend(
        assignments
            .par_chunks_mut(CHUNK_LEN)
            .zip(vectors.par_chunks(CHUNK_LEN))
            .map(|(slots, chunk)| assign_chunk(chunk, centroids, slots)),
    );

    Ok(partials
        .into_iter()
        .fold(AssignStats::default(), AssignStats::merge))
}
