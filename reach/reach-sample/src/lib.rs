//! Deterministic sampling for reachability maps.
//!
//! Two samplers feed the generation pipeline:
//!
//! - [`sample_rotations`] / [`sample_so3`]: near-uniform orientations over
//!   SO(3) at a target angular spacing, plus the spacing actually achieved
//!   ([`realized_quat_delta`])
//! - [`sample_volume`]: every lattice point of the cube around the origin,
//!   with the subset strictly inside the sampling ball
//!
//! Neither sampler is stochastic: repeated calls with the same arguments
//! produce identical output, which keeps generated maps reproducible.
//!
//! # Example
//!
//! ```
//! use reach_sample::{sample_rotations, sample_volume};
//!
//! let volume = sample_volume(0.2, 0.05).unwrap();
//! let rotations = sample_rotations(0.5, false).unwrap();
//!
//! let poses_to_evaluate = volume.inside().len() * rotations.len();
//! assert!(poses_to_evaluate > 0);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod so3;
mod volume;

pub use so3::{MAX_ROTATIONS, RotationSamples, realized_quat_delta, sample_rotations, sample_so3};
pub use volume::{MAX_GRID_POINTS, VolumeSamples, sample_volume};
