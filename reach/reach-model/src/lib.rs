//! Kinematic reachability maps.
//!
//! A reachability map records, for every voxel of a ball around a
//! manipulator's first arm joint and every sampled orientation, whether the
//! end effector can reach that pose:
//!
//! - **Density**: IK solutions per sampled rotation, clamped to `[0, 1]`
//! - **Reachability**: fraction of sampled rotations with any solution
//! - **Stats**: every feasible pose with its solution count
//!
//! # Pipeline
//!
//! 1. [`ChainGeometry`] derives the lattice center and arm length from a
//!    [`KinematicChain`]
//! 2. `reach-sample` produces the lattice and the rotation set
//! 3. [`PoseEvaluator`] asks an [`IkOracle`] about each pose of a voxel
//! 4. [`DensityAggregator`] folds voxel outcomes into fields and stats
//!
//! [`generate`] runs this on one thread; [`generate_parallel`] spreads voxels
//! over rayon's pool. [`ReachabilityModel`] wraps the result with point
//! lookups, lazily built neighbor indices, and persistence through a
//! [`ModelStore`] such as [`JsonFileStore`].
//!
//! # Frames
//!
//! Poses in the stats are in the manipulator base frame. The IK oracle is
//! called with the same pose composed with the base transform, and always
//! without environment collision checks.
//!
//! # Feature Flags
//!
//! - `parallel` (default): Enables [`generate_parallel`] and parallel index queries

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod aggregate;
mod cancel;
mod chain;
mod evaluate;
mod generate;
mod model;
mod oracle;
mod store;

pub use aggregate::{AggregatedMaps, DensityAggregator};
pub use cancel::CancelToken;
pub use chain::{ChainGeometry, KinematicChain};
pub use evaluate::{PoseEvaluator, SolutionMode, VoxelOutcome};
#[cfg(feature = "parallel")]
pub use generate::generate_parallel;
pub use generate::{GeneratedMap, GenerationSummary, generate};
pub use model::ReachabilityModel;
pub use oracle::{IkOracle, JointSolution};
pub use store::{CacheKey, JsonFileStore, ModelStore, RECORD_VERSION, ReachabilityRecord};

// Re-export the query surface so callers need only this crate
pub use reach_index::{Neighbor, PoseSearch, RadiusNeighbors};
pub use reach_types::{
    GridIndex, Pose, PoseRecord, PoseScale, ReachError, ReachResult, ReachabilityConfig,
    ReachabilityStats, VoxelField,
};
