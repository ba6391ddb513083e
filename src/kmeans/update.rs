use rayon::prelude::*;

use super::CHUNK_LEN;
use crate::error::{Result, try_vec_with_capacity};
use crate::vector::ColorVector;

/// Per-cluster channel sums and member counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    sums: Vec<ColorVector>,
    counts: Vec<usize>,
}

impl Accumulator {
    /// Zeroed accumulator for `k` clusters. Fails instead of aborting when
    /// the memory is not available.
    pub fn try_new(k: usize) -> Result<Self> {
        let mut sums = try_vec_with_capacity("centroid sums", k)?;
        sums.resize(k, ColorVector::default());
        let mut counts = try_vec_with_capacity("cluster counts", k)?;
        counts.resize(k, 0);
        Ok(Self { sums, counts })
    }

    fn add_all(&mut self, vectors: &[ColorVector], assignments: &[usize]) {
        for (v, &c) in vectors.iter().zip(assignments) {
            let sum = &mut self.sums[c];
            sum.r += v.r;
            sum.g += v.g;
            sum.b += v.b;
            self.counts[c] += 1;
        }
    }

    fn merge(&mut self, other: &Accumulator) {
        for (sum, o) in self.sums.iter_mut().zip(&other.sums) {
            sum.r += o.r;
            sum.g += o.g;
            sum.b += o.b;
        }
        for (count, o) in self.counts.iter_mut().zip(&other.counts) {
            *count += o;
        }
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Mean of cluster `i`, or `None` when it has no members.
    pub fn mean(&self, i: usize) -> Option<ColorVector> {
        let n = self.counts[i];
        if n == 0 {
            return None;
        }
        let s = self.sums[i];
        let n = n as f64;
        Some(ColorVector::new(s.r / n, s.g / n, s.b / n))
    }
}

/// Sums every cluster's members.
///
/// Each chunk of vectors is folded into its own private accumulator, then the
/// partial accumulators are merged in chunk order. No accumulator is shared
/// between workers.
///
/// # Panics
///
/// Panics if `vectors` and `assignments` differ in length, or if an
/// assignment is not below `k`.
pub fn accumulate(
    vectors: &[ColorVector],
    assignments: &[usize],
    k: usize,
) -> Result<Accumulator> {
    assert_eq!(vectors.len(), assignments.len());

    let n_chunks = vectors.len().div_ceil(CHUNK_LEN);
    let mut partials: Vec<Result<Accumulator>> =
        try_vec_with_capacity("partial accumulators", n_chunks)?;
    partials.par_extend(
        vectors
            .par_chunks(CHUNK_LEN)
            .zip(assignments.par_chunks(CHUNK_LEN))
            .map(|(chunk, labels)| {
                Accumulator::try_new(k).map(|mut acc| {
                    acc.add_all(chunk, labels);
                    acc
                })
            }),
    );

    let mut total = Accumulator::try_new(k)?;
    for partial in partials {
        total.merge(&partial?);
    }
    Ok(total)
}

#[inline]
fn moved(old: &ColorVector, new: &ColorVector, tolerance: f64) -> bool {
    (new.r - old.r).abs() > tolerance
        || (new.g - old.g).abs() > tolerance
        || (new.b - old.b).abs() > tolerance
}

/// Moves each centroid to the mean of its members and returns how many moved.
///
/// Empty clusters keep their centroid. A centroid is only replaced when its
/// mean differs by more than `tolerance` in some channel.
///
/// # Panics
///
/// Same conditions as [`accumulate`], with `k = centroids.len()`.
pub fn update_centroids(
    vectors: &[ColorVector],
    assignments: &[usize],
    centroids: &mut [ColorVector],
    tolerance: f64,
) -> Result<usize> {
    let acc = accumulate(vectors, assignments, centroids.len())?;

    let changed: usize = centroids
        .par_iter_mut()
        .enumerate()
        .map(|(i, centroid)| match acc.mean(i) {
            Some(mean) if moved(centroid, &mean, tolerance) => {
                *centroid = mean;
                1
            }
            _ => 0,
        })
        .sum();

    Ok(changed)
}
