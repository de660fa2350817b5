//! Core types for kinematic reachability maps.
//!
//! This crate provides the data model shared by the reachability crates:
//!
//! - [`Pose`] - End-effector position plus unit-quaternion orientation
//! - [`PoseRecord`] / [`ReachabilityStats`] - Feasible poses and their IK solution counts
//! - [`VoxelField`] - Dense cubic scalar grid (density and reachability maps)
//! - [`PoseScale`] / [`GridIndex`] - World point to grid index mapping
//! - [`ReachabilityConfig`] - Sampling resolutions and evaluation mode
//! - [`ReachError`] - Errors shared across sampling, indexing, and generation
//!
//! # Layer 0 Crate
//!
//! Pure data with no IK, sampling, or search behavior. Sampling lives in
//! `reach-sample`, nearest-neighbor search in `reach-index`, and the
//! generation pipeline in `reach-model`.
//!
//! # Quaternion Double Cover
//!
//! `q` and `-q` describe the same rotation. [`quat_distance`] folds the two
//! together, so it is the metric to use when comparing orientations.
//!
//! # Example
//!
//! ```
//! use reach_types::{GridIndex, PoseScale, VoxelField};
//! use nalgebra::Point3;
//!
//! // A 5x5x5 grid with 0.05 spacing centered on the origin
//! let scale = PoseScale::from_delta(0.05, 2);
//! let mut field = VoxelField::zeros(5);
//!
//! let center = scale.point_to_index(&Point3::origin());
//! assert_eq!(center, GridIndex::new(2, 2, 2));
//!
//! field.set(center, 1.0).unwrap();
//! assert_eq!(field.get(center), Some(1.0));
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization/deserialization for all types

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod config;
mod error;
mod grid;
mod pose;
mod record;

pub use config::{
    DEFAULT_QUAT_DELTA, DEFAULT_TRANSLATION_WEIGHT, DEFAULT_XYZ_DELTA, ReachabilityConfig,
};
pub use error::{ReachError, ReachResult};
pub use grid::{GridIndex, PoseScale, VoxelField};
pub use pose::{POSE_DIM, Pose, quat_distance};
pub use record::{PoseRecord, ReachabilityStats};

// Re-export nalgebra types for convenience
pub use nalgebra::{Isometry3, Point3, UnitQuaternion};
