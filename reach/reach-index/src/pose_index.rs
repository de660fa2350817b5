//! Weighted 6D pose index with quaternion double-cover handling.
//!
//! Poses are embedded in R⁷ as `[qw, qx, qy, qz, w*tx, w*ty, w*tz]`, where
//! `w` is the translation weight. Scaling translation up makes a positional
//! error count `w` times more than the same chordal error in the quaternion.
//!
//! A Euclidean index would see `q` and `-q` as antipodal even though they
//! are the same rotation, so every record is stored twice: once as-is and
//! once with its quaternion negated. A query then lands near whichever copy
//! matches its sign, and hits in the second half are mapped back onto the
//! original record.
//!
//! Weighting convention: translations are multiplied by `w` when building
//! and when querying, never divided. Queries are embedded into a local
//! array, so caller poses are never modified.

use std::fmt;

use reach_types::{POSE_DIM, Pose, ReachError, ReachResult, ReachabilityStats};
use tracing::debug;

use crate::search::{
    Neighbor, PoseSearch, RadiusNeighbors, fold_hits, validate_query, validate_radius_query,
};
use crate::tree::PointTree;

/// Embeds a pose as `[q, w * t]`.
fn embed(pose: &Pose, translation_weight: f64) -> [f64; POSE_DIM] {
    let mut values = pose.to_array();
    for value in &mut values[4..] {
        *value *= translation_weight;
    }
    values
}

/// Squared distance between two poses in the weighted metric, taking the
/// nearer of `q` and `-q` for the second pose.
///
/// This is exactly the distance [`PoseIndex`] reports.
///
/// # Example
///
/// ```
/// use reach_index::weighted_distance_sq;
/// use reach_types::Pose;
/// use nalgebra::Point3;
///
/// let a = Pose::identity();
/// let b = Pose::from_position(Point3::new(0.1, 0.0, 0.0));
/// assert!((weighted_distance_sq(&a, &b, 5.0) - 0.25).abs() < 1e-12);
/// assert!(weighted_distance_sq(&a, &a.with_negated_quaternion(), 5.0) < 1e-24);
/// ```
#[must_use]
pub fn weighted_distance_sq(a: &Pose, b: &Pose, translation_weight: f64) -> f64 {
    let ea = embed(a, translation_weight);
    let eb = embed(b, translation_weight);

    let translation: f64 = (4..POSE_DIM).map(|i| (ea[i] - eb[i]).powi(2)).sum();
    let same: f64 = (0..4).map(|i| (ea[i] - eb[i]).powi(2)).sum();
    let flipped: f64 = (0..4).map(|i| (ea[i] + eb[i]).powi(2)).sum();
    translation + same.min(flipped)
}

/// Nearest-neighbor index over full poses (position and orientation).
///
/// # Example
///
/// ```
/// use reach_index::{PoseIndex, PoseSearch};
/// use reach_types::Pose;
/// use nalgebra::{Point3, UnitQuaternion};
///
/// let poses = [
///     Pose::from_position(Point3::new(0.0, 0.0, 0.0)),
///     Pose::from_position_rotation(
///         Point3::new(0.2, 0.0, 0.0),
///         UnitQuaternion::from_euler_angles(0.0, 0.0, 1.0),
///     ),
/// ];
/// let index = PoseIndex::from_poses(&poses, 5.0).unwrap();
///
/// // The negated quaternion finds the same record at zero distance
/// let found = index.k_nearest(&[poses[1].with_negated_quaternion()], 1, 0.0).unwrap();
/// assert_eq!(found[0][0].index, 1);
/// assert!(found[0][0].distance_sq < 1e-12);
/// ```
pub struct PoseIndex {
    tree: PointTree<POSE_DIM>,
    num_poses: usize,
    translation_weight: f64,
}

impl PoseIndex {
    /// Builds the index over every pose in `stats`.
    ///
    /// # Errors
    ///
    /// [`ReachError::NoData`] if `stats` is empty;
    /// [`ReachError::InvalidConfig`] if the weight is not positive and finite.
    pub fn build(stats: &ReachabilityStats, translation_weight: f64) -> ReachResult<Self> {
        Self::from_embedded(
            stats.poses().map(|p| embed(p, translation_weight)).collect(),
            translation_weight,
        )
    }

    /// Builds the index over a slice of poses.
    ///
    /// # Errors
    ///
    /// Same as [`PoseIndex::build`].
    pub fn from_poses(poses: &[Pose], translation_weight: f64) -> ReachResult<Self> {
        Self::from_embedded(
            poses.iter().map(|p| embed(p, translation_weight)).collect(),
            translation_weight,
        )
    }

    fn from_embedded(
        mut entries: Vec<[f64; POSE_DIM]>,
        translation_weight: f64,
    ) -> ReachResult<Self> {
        if !(translation_weight > 0.0 && translation_weight.is_finite()) {
            return Err(ReachError::invalid_config(format!(
                "translation_weight must be positive, got {translation_weight}"
            )));
        }
        let num_poses = entries.len();

        entries.extend_from_within(..);
        for twin in &mut entries[num_poses..] {
            for value in &mut twin[..4] {
                *value = -*value;
            }
        }

        let tree = PointTree::new(&entries).ok_or(ReachError::NoData)?;
        debug!(
            records = num_poses,
            points = tree.num_points(),
            translation_weight,
            "Built weighted pose index"
        );

        Ok(Self {
            tree,
            num_poses,
            translation_weight,
        })
    }

    /// Multiplier applied to translation components.
    #[must_use]
    pub const fn translation_weight(&self) -> f64 {
        self.translation_weight
    }

    fn nearest(&self, query: &Pose, k: usize) -> Vec<Neighbor> {
        let embedded = embed(query, self.translation_weight);
        // Each record occupies two entries, so 2k entries always cover k records
        let hits = self.tree.nearest(&embedded, k.saturating_mul(2));
        fold_hits(hits, self.num_poses, k).0
    }
}

impl PoseSearch for PoseIndex {
    fn len(&self) -> usize {
        self.num_poses
    }

    fn k_nearest(
        &self,
        queries: &[Pose],
        k: usize,
        epsilon: f64,
    ) -> ReachResult<Vec<Vec<Neighbor>>> {
        validate_query(self.num_poses, k, epsilon)?;

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            Ok(queries.par_iter().map(|q| self.nearest(q, k)).collect())
        }

        #[cfg(not(feature = "parallel"))]
        {
            Ok(queries.iter().map(|q| self.nearest(q, k)).collect())
        }
    }

    fn k_nearest_radius(
        &self,
        query: &Pose,
        radius_sq: f64,
        k: usize,
        epsilon: f64,
    ) -> ReachResult<RadiusNeighbors> {
        validate_radius_query(self.num_poses, radius_sq, k, epsilon)?;

        let embedded = embed(query, self.translation_weight);
        let hits = self.tree.within(&embedded, radius_sq);
        let (neighbors, in_ball) = fold_hits(hits, self.num_poses, k);

        Ok(RadiusNeighbors { neighbors, in_ball })
    }
}

impl fmt::Debug for PoseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoseIndex")
            .field("num_poses", &self.num_poses)
            .field("translation_weight", &self.translation_weight)
            .finish_non_exhaustive()
    }
}
