//! Lloyd-style k-means over RGB color vectors.
//!
//! A run moves through three states: initial centroids are sampled (or
//! supplied), then rounds of assignment and update alternate until a round
//! changes nothing or the round cap is reached, and finally every vector is
//! collapsed onto its centroid. Hitting the cap is not an error; the current
//! clustering is returned either way.

use crate::config::{DEFAULT_MAX_ROUNDS, DEFAULT_TOLERANCE, QuantizeConfig};
use crate::error::{QuantizeError, Result, try_vec_with_capacity};
use crate::rng;
use crate::vector::ColorVector;

pub mod assign;
pub mod init;
pub mod update;

pub use assign::{AssignStats, assign_points};
pub use update::update_centroids;

/// Assignment value before the first round.
pub const UNASSIGNED: usize = usize::MAX;

/// Vectors per work item in the parallel steps.
pub(crate) const CHUNK_LEN: usize = 4096;

/// Counters for one assignment + update round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundStats {
    pub assignment_changes: usize,
    pub centroid_changes: usize,
    /// Sum of squared distances to the assigned centroids, measured right
    /// after this round's assignment step.
    pub inertia: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub rounds: Vec<RoundStats>,
    /// False when the loop stopped on the round cap.
    pub converged: bool,
}

impl RunReport {
    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }
}

/// Final state of a run.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub centroids: Vec<ColorVector>,
    pub assignments: Vec<usize>,
    pub report: RunReport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    k: usize,
    max_rounds: usize,
    tolerance: f64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_rounds: DEFAULT_MAX_ROUNDS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn from_config(config: &QuantizeConfig) -> Self {
        Self {
            k: config.k,
            max_rounds: config.max_rounds,
            tolerance: config.tolerance,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Samples `k` distinct starting centroids with `seed` and iterates.
    /// `vectors` is left untouched.
    pub fn fit(&self, vectors: &[ColorVector], seed: u64) -> Result<Clustering> {
        let mut rng = rng::from_seed(seed);
        let centroids = init::sample_centroids(vectors, self.k, &mut rng)?;
        self.iterate(vectors, centroids)
    }

    /// Iterates from caller-provided centroids. Their count overrides `k`.
    pub fn fit_from(
        &self,
        vectors: &[ColorVector],
        centroids: Vec<ColorVector>,
    ) -> Result<Clustering> {
        init::validate_centroids(vectors, &centroids)?;
        self.iterate(vectors, centroids)
    }

    /// [`KMeans::fit`] followed by [`collapse`]: on success every vector holds
    /// its centroid's value.
    pub fn run(&self, vectors: &mut [ColorVector], seed: u64) -> Result<Clustering> {
        let clustering = self.fit(vectors, seed)?;
        collapse(vectors, &clustering.centroids, &clustering.assignments);
        Ok(clustering)
    }

    /// [`KMeans::fit_from`] followed by [`collapse`].
    pub fn run_from(
        &self,
        vectors: &mut [ColorVector],
        centroids: Vec<ColorVector>,
    ) -> Result<Clustering> {
        let clustering = self.fit_from(vectors, centroids)?;
        collapse(vectors, &clustering.centroids, &clustering.assignments);
        Ok(clustering)
    }

    fn iterate(
        &self,
        vectors: &[ColorVector],
        mut centroids: Vec<ColorVector>,
    ) -> Result<Clustering> {
        // Collapse needs at least one assignment pass.
        if self.max_rounds == 0 {
            return Err(QuantizeError::InvalidParameter {
                name: "max_rounds",
                message: "must be at least 1",
            });
        }
        let mut assignments = try_vec_with_capacity("cluster assignments", vectors.len())?;
        assignments.resize(vectors.len(), UNASSIGNED);
        let mut report = RunReport::default();

        for round in 0..self.max_rounds {
            let assigned = assign_points(vectors, &centroids, &mut assignments)?;
            let centroid_changes =
                update_centroids(vectors, &assignments, &mut centroids, self.tolerance)?;

            tracing::debug!(
                round,
                assignment_changes = assigned.changes,
                centroid_changes,
                inertia = assigned.inertia,
                "k-means round"
            );
            report.rounds.push(RoundStats {
                assignment_changes: assigned.changes,
                centroid_changes,
                inertia: assigned.inertia,
            });

            if assigned.changes == 0 && centroid_changes == 0 {
                report.converged = true;
                break;
            }
        }

        tracing::info!(
            k = centroids.len(),
            vectors = vectors.len(),
            rounds = report.round_count(),
            converged = report.converged,
            "k-means finished"
        );

        Ok(Clustering {
            centroids,
            assignments,
            report,
        })
    }
}

/// Overwrites every vector with the centroid it is assigned to.
pub fn collapse(vectors: &mut [ColorVector], centroids: &[ColorVector], assignments: &[usize]) {
    for (v, &c) in vectors.iter_mut().zip(assignments) {
        *v = centroids[c];
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn cv(r: f64, g: f64, b: f64) -> ColorVector {
        ColorVector::new(r, g, b)
    }

    fn gradient(n: usize) -> Vec<ColorVector> {
        (0..n)
            .map(|i| {
                let i = i as f64;
                cv(i % 256.0, (i * 7.0) % 256.0, (i * 13.0) % 256.0)
            })
            .collect()
    }

    fn distinct(vectors: &[ColorVector]) -> usize {
        vectors.iter().map(ColorVector::key).collect::<HashSet<_>>().len()
    }

    #[test]
    fn two_cluster_scenario() {
        let mut v = vec![
            cv(0.0, 0.0, 0.0),
            cv(1.0, 1.0, 1.0),
            cv(254.0, 254.0, 254.0),
            cv(255.0, 255.0, 255.0),
        ];
        let initial = vec![cv(0.0, 0.0, 0.0), cv(255.0, 255.0, 255.0)];

        let clustering = KMeans::new(2).run_from(&mut v, initial).unwrap();

        assert!(clustering.report.converged);
        assert!(clustering.report.round_count() <= 2);
        assert_eq!(clustering.assignments, vec![0, 0, 1, 1]);
        assert_eq!(
            clustering.centroids,
            vec![cv(0.5, 0.5, 0.5), cv(254.5, 254.5, 254.5)]
        );
        assert_eq!(
            v,
            vec![
                cv(0.5, 0.5, 0.5),
                cv(0.5, 0.5, 0.5),
                cv(254.5, 254.5, 254.5),
                cv(254.5, 254.5, 254.5),
            ]
        );
    }

    #[test]
    fn first_round_counts_every_vector_as_changed() {
        let v = gradient(100);
        let clustering = KMeans::new(4).fit(&v, 1).unwrap();
        assert_eq!(clustering.report.rounds[0].assignment_changes, 100);
    }

    #[test]
    fn never_exceeds_round_cap() {
        let v = gradient(20_000);
        let clustering = KMeans::new(64).fit(&v, 3).unwrap();
        assert!(clustering.report.round_count() <= 20);

        let capped = KMeans::new(64).with_max_rounds(2).fit(&v, 3).unwrap();
        assert_eq!(capped.report.round_count(), 2);
        assert!(!capped.report.converged);
    }

    #[test]
    fn stops_after_a_quiet_round() {
        let v = gradient(5000);
        let clustering = KMeans::new(8).with_max_rounds(1000).fit(&v, 11).unwrap();
        let rounds = &clustering.report.rounds;

        let quiet: Vec<usize> = rounds
            .iter()
            .enumerate()
            .filter(|(_, r)| r.assignment_changes == 0 && r.centroid_changes == 0)
            .map(|(i, _)| i)
            .collect();
        if clustering.report.converged {
            assert_eq!(quiet, vec![rounds.len() - 1]);
        } else {
            assert!(quiet.is_empty());
        }
    }

    #[test]
    fn objective_never_increases() {
        let v = gradient(3000);
        let clustering = KMeans::new(6).fit(&v, 2024).unwrap();
        for pair in clustering.report.rounds.windows(2) {
            let (before, after) = (pair[0].inertia, pair[1].inertia);
            assert!(
                after <= before + before.abs() * 1e-12,
                "inertia went up: {before} -> {after}"
            );
        }
    }

    #[test]
    fn output_has_at_most_k_colors() {
        let mut v = gradient(4000);
        let k = 12;
        let clustering = KMeans::new(k).run(&mut v, 5).unwrap();
        assert!(distinct(&v) <= k);
        assert_eq!(clustering.centroids.len(), k);
        assert!(clustering.assignments.iter().all(|&a| a < k));
    }

    #[test]
    fn collapse_is_idempotent() {
        let mut v = gradient(2000);
        let clustering = KMeans::new(10).run(&mut v, 77).unwrap();
        let once = v.clone();

        let mut assignments = clustering.assignments.clone();
        let stats = assign_points(&v, &clustering.centroids, &mut assignments).unwrap();
        assert_eq!(stats.changes, 0);
        assert_eq!(assignments, clustering.assignments);

        collapse(&mut v, &clustering.centroids, &assignments);
        assert_eq!(v, once);
    }

    #[test]
    fn empty_cluster_survives_a_run() {
        let v = vec![cv(0.0, 0.0, 0.0), cv(2.0, 2.0, 2.0)];
        // The second centroid is farther from both inputs than the first.
        let far = cv(200.0, 100.0, 50.0);
        let clustering = KMeans::new(2)
            .fit_from(&v, vec![cv(1.0, 1.0, 1.0), far])
            .unwrap();
        assert_eq!(clustering.assignments, vec![0, 0]);
        assert_eq!(clustering.centroids[1], far);
        assert!(clustering.centroids.iter().all(|c| !c.r.is_nan()));
    }

    #[test]
    fn same_seed_same_clustering() {
        let v = gradient(3000);
        let a = KMeans::new(5).fit(&v, 99).unwrap();
        let b = KMeans::new(5).fit(&v, 99).unwrap();
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.report, b.report);
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let mut v = vec![cv(0.0, 0.0, 0.0), cv(9.0, 9.0, 9.0)];
        let err = KMeans::new(2).with_max_rounds(0).run(&mut v, 1).unwrap_err();
        assert!(matches!(
            err,
            QuantizeError::InvalidParameter { name: "max_rounds", .. }
        ));
        assert!(err.is_invalid_input());
        assert_eq!(v, vec![cv(0.0, 0.0, 0.0), cv(9.0, 9.0, 9.0)]);

        let initial = vec![cv(0.0, 0.0, 0.0), cv(9.0, 9.0, 9.0)];
        assert!(KMeans::new(2).with_max_rounds(0).run_from(&mut v, initial).is_err());
    }

    #[test]
    fn k_equal_to_pixel_count_keeps_every_color() {
        let mut v = vec![cv(1.0, 2.0, 3.0), cv(4.0, 5.0, 6.0), cv(7.0, 8.0, 9.0)];
        let original = v.clone();
        KMeans::new(3).run(&mut v, 0).unwrap();
        assert_eq!(v, original);
    }
}
