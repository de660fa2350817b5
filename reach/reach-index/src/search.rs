//! Query trait and result types shared by the pose and translation indices.

use reach_types::{Pose, ReachError, ReachResult};

/// A neighbor found by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index into the original `ReachabilityStats` sequence.
    pub index: usize,
    /// Squared distance in the index's (weighted) metric.
    pub distance_sq: f64,
}

/// Result of a radius-limited k-nearest query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadiusNeighbors {
    /// Up to `k` neighbors inside the ball, nearest first.
    pub neighbors: Vec<Neighbor>,
    /// Number of distinct records inside the ball (may exceed `k`).
    pub in_ball: usize,
}

/// Nearest-neighbor queries over recorded feasible poses.
///
/// Every returned [`Neighbor::index`] lies in `[0, len())`. Search is exact;
/// `epsilon` is the permitted relative approximation error and an exact
/// answer satisfies any `epsilon >= 0`.
pub trait PoseSearch: Send + Sync {
    /// Number of indexed records.
    fn len(&self) -> usize;

    /// Returns `true` if no records are indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` nearest records to each query, nearest first.
    ///
    /// # Errors
    ///
    /// [`ReachError::InvalidQuery`] for `k == 0` or an invalid `epsilon`,
    /// [`ReachError::NoData`] for an empty index.
    fn k_nearest(
        &self,
        queries: &[Pose],
        k: usize,
        epsilon: f64,
    ) -> ReachResult<Vec<Vec<Neighbor>>>;

    /// Up to `k` nearest records within `radius_sq` (squared distance) of the
    /// query, plus the number of records inside the ball.
    ///
    /// # Errors
    ///
    /// [`ReachError::InvalidQuery`] for `k == 0`, an invalid `epsilon`, or a
    /// negative radius; [`ReachError::NoData`] for an empty index.
    fn k_nearest_radius(
        &self,
        query: &Pose,
        radius_sq: f64,
        k: usize,
        epsilon: f64,
    ) -> ReachResult<RadiusNeighbors>;

    /// [`PoseSearch::k_nearest_radius`] over a batch of queries.
    ///
    /// Queries run in parallel when the `parallel` feature is enabled.
    ///
    /// # Errors
    ///
    /// Same as [`PoseSearch::k_nearest_radius`].
    fn k_nearest_radius_batch(
        &self,
        queries: &[Pose],
        radius_sq: f64,
        k: usize,
        epsilon: f64,
    ) -> ReachResult<Vec<RadiusNeighbors>> {
        validate_radius_query(self.len(), radius_sq, k, epsilon)?;

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            queries
                .par_iter()
                .map(|query| self.k_nearest_radius(query, radius_sq, k, epsilon))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            queries
                .iter()
                .map(|query| self.k_nearest_radius(query, radius_sq, k, epsilon))
                .collect()
        }
    }
}

/// Checks the parameters shared by all k-nearest queries.
pub(crate) fn validate_query(len: usize, k: usize, epsilon: f64) -> ReachResult<()> {
    if len == 0 {
        return Err(ReachError::NoData);
    }
    if k == 0 {
        return Err(ReachError::invalid_query("k must be at least 1"));
    }
    if !(epsilon >= 0.0 && epsilon.is_finite()) {
        return Err(ReachError::invalid_query(format!(
            "epsilon must be finite and non-negative, got {epsilon}"
        )));
    }
    Ok(())
}

/// Checks the parameters of a radius query.
pub(crate) fn validate_radius_query(
    len: usize,
    radius_sq: f64,
    k: usize,
    epsilon: f64,
) -> ReachResult<()> {
    validate_query(len, k, epsilon)?;
    if radius_sq.is_nan() || radius_sq < 0.0 {
        return Err(ReachError::invalid_query(format!(
            "radius_sq must be non-negative, got {radius_sq}"
        )));
    }
    Ok(())
}

/// Folds raw tree hits (sorted nearest first) into neighbors over the
/// original records.
///
/// Hits at `index >= num_records` come from the negated-quaternion half of
/// a doubled dataset and are shifted back. A record reached twice keeps its
/// first, nearer hit. Returns at most `limit` neighbors and the number of
/// distinct records seen.
pub(crate) fn fold_hits(
    hits: impl IntoIterator<Item = (usize, f64)>,
    num_records: usize,
    limit: usize,
) -> (Vec<Neighbor>, usize) {
    let mut seen = vec![false; num_records];
    let mut neighbors = Vec::with_capacity(limit.min(num_records));
    let mut distinct = 0;

    for (raw, distance_sq) in hits {
        let index = if raw >= num_records { raw - num_records } else { raw };
        let Some(flag) = seen.get_mut(index) else {
            continue;
        };
        if *flag {
            continue;
        }
        *flag = true;
        distinct += 1;
        if neighbors.len() < limit {
            neighbors.push(Neighbor { index, distance_sq });
        }
    }

    (neighbors, distinct)
}
