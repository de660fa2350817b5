//! Position-only index for translation-only reachability maps.

use std::fmt;

use reach_types::{Pose, ReachError, ReachResult, ReachabilityStats};
use tracing::debug;

use crate::search::{
    Neighbor, PoseSearch, RadiusNeighbors, fold_hits, validate_query, validate_radius_query,
};
use crate::tree::PointTree;

/// Nearest-neighbor index over record positions, ignoring orientation.
///
/// Distances are plain squared Euclidean distances in meters². Records that
/// share a position (every rotation sampled at one voxel) are stored as one
/// point and come back together, in record order.
pub struct TranslationIndex {
    tree: PointTree<3>,
    num_points: usize,
}

impl TranslationIndex {
    /// Builds the index over the positions of every pose in `stats`.
    ///
    /// # Errors
    ///
    /// [`ReachError::NoData`] if `stats` is empty.
    pub fn build(stats: &ReachabilityStats) -> ReachResult<Self> {
        Self::from_entries(stats.poses().map(position_of).collect())
    }

    /// Builds the index over the positions of a slice of poses.
    ///
    /// # Errors
    ///
    /// [`ReachError::NoData`] if `poses` is empty.
    pub fn from_poses(poses: &[Pose]) -> ReachResult<Self> {
        Self::from_entries(poses.iter().map(position_of).collect())
    }

    fn from_entries(entries: Vec<[f64; 3]>) -> ReachResult<Self> {
        let tree = PointTree::new(&entries).ok_or(ReachError::NoData)?;
        debug!(
            records = entries.len(),
            positions = tree.num_points(),
            "Built translation index"
        );
        Ok(Self {
            tree,
            num_points: entries.len(),
        })
    }

    fn nearest(&self, query: &Pose, k: usize) -> Vec<Neighbor> {
        let hits = self.tree.nearest(&position_of(query), k);
        fold_hits(hits, self.num_points, k).0
    }
}

fn position_of(pose: &Pose) -> [f64; 3] {
    [pose.position.x, pose.position.y, pose.position.z]
}

impl PoseSearch for TranslationIndex {
    fn len(&self) -> usize {
        self.num_points
    }

    fn k_nearest(
        &self,
        queries: &[Pose],
        k: usize,
        epsilon: f64,
    ) -> ReachResult<Vec<Vec<Neighbor>>> {
        validate_query(self.num_points, k, epsilon)?;

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
        validate_radius_query(self.num_points, radius_sq, k, epsilon)?;

        let hits = self.tree.within(&position_of(query), radius_sq);
        let (neighbors, in_ball) = fold_hits(hits, self.num_points, k);

        Ok(RadiusNeighbors { neighbors, in_ball })
    }
}

impl fmt::Debug for TranslationIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationIndex")
            .field("num_points", &self.num_points)
            .finish_non_exhaustive()
    }
}
