//! Folds per-voxel outcomes into density and reachability fields.

use reach_types::{ReachError, ReachResult, ReachabilityStats, VoxelField};

use crate::evaluate::VoxelOutcome;

/// Fields and records produced by aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMaps {
    /// Feasible poses in voxel order, then rotation order.
    pub stats: ReachabilityStats,
    /// Solutions per rotation at each voxel, clamped to `[0, 1]`.
    pub density: VoxelField,
    /// Fraction of rotations reached at each voxel.
    pub reachability: VoxelField,
}

/// Accumulates [`VoxelOutcome`]s in voxel order.
///
/// Each voxel is written by exactly one outcome; voxels never added (those
/// outside the sampling ball) stay zero.
#[derive(Debug, Clone)]
pub struct DensityAggregator {
    maps: AggregatedMaps,
    num_rotations: f64,
}

impl DensityAggregator {
    /// Creates an aggregator for a cube of `side` voxels per axis.
    ///
    /// # Errors
    ///
    /// Returns [`ReachError::InvalidConfig`] if `num_rotations` is zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(side: usize, num_rotations: usize) -> ReachResult<Self> {
        if num_rotations == 0 {
            return Err(ReachError::invalid_config("at least one rotation is required"));
        }
        Ok(Self {
            maps: AggregatedMaps {
                stats: ReachabilityStats::new(),
                density: VoxelField::zeros(side),
                reachability: VoxelField::zeros(side),
            },
            num_rotations: num_rotations as f64,
        })
    }

    /// Writes one voxel's density and reachability and appends its records.
    ///
    /// # Errors
    ///
    /// Returns [`ReachError::InvalidConfig`] if the outcome's flat index lies
    /// outside the field.
    #[allow(clippy::cast_precision_loss)]
    pub fn add(&mut self, outcome: VoxelOutcome) -> ReachResult<()> {
        let flat = outcome.flat_index;
        let len = self.maps.density.len();
        let (Some(density), Some(reachability)) = (
            self.maps.density.values_mut().get_mut(flat),
            self.maps.reachability.values_mut().get_mut(flat),
        ) else {
            return Err(ReachError::invalid_config(format!(
                "voxel {flat} is outside a field of {len} voxels"
            )));
        };

        *density = (outcome.solutions as f64 / self.num_rotations).min(1.0);
        *reachability = outcome.rotations_reached as f64 / self.num_rotations;
        self.maps.stats.extend(outcome.records);
        Ok(())
    }

    /// Returns the finished maps.
    #[must_use]
    pub fn finish(self) -> AggregatedMaps {
        self.maps
    }
}
