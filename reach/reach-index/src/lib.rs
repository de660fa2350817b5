//! Nearest-neighbor search over recorded feasible poses.
//!
//! Two indices share the [`PoseSearch`] query interface:
//!
//! - [`PoseIndex`] - 6D index over position and orientation, with translation
//!   weighting and quaternion double-cover handling
//! - [`TranslationIndex`] - 3D index over positions only
//!
//! Both are immutable k-d trees (`kiddo`) built once from
//! [`ReachabilityStats`](reach_types::ReachabilityStats). Repeated points
//! are stored once and coordinates are decorrelated before the build, so the
//! regular lattice and rotation grids of a generated map index cleanly.
//! [`LazyIndex`] defers the build until the first query.
//!
//! # Pose Metric
//!
//! A pose is embedded as `[qw, qx, qy, qz, w*tx, w*ty, w*tz]` and compared by
//! squared Euclidean distance, folding `q` and `-q` together. See
//! [`weighted_distance_sq`].
//!
//! # Example
//!
//! ```
//! use reach_index::{PoseIndex, PoseSearch};
//! use reach_types::{Pose, PoseRecord, ReachabilityStats};
//! use nalgebra::Point3;
//!
//! let stats: ReachabilityStats = (0..10)
//!     .map(|i| {
//!         let x = f64::from(i) * 0.05;
//!         PoseRecord::new(Pose::from_position(Point3::new(x, 0.0, 0.0)), 1)
//!     })
//!     .collect();
//!
//! let index = PoseIndex::build(&stats, 5.0).unwrap();
//! let query = Pose::from_position(Point3::new(0.21, 0.0, 0.0));
//! let found = index.k_nearest(&[query], 2, 0.0).unwrap();
//!
//! assert_eq!(found[0][0].index, 4);
//! assert_eq!(found[0][1].index, 5);
//! ```
//!
//! # Feature Flags
//!
//! - `parallel` (default): Answers batched queries across CPU cores with `rayon`

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod lazy;
mod pose_index;
mod search;
mod translation_index;
mod tree;

pub use lazy::LazyIndex;
pub use pose_index::{PoseIndex, weighted_distance_sq};
pub use search::{Neighbor, PoseSearch, RadiusNeighbors};
pub use translation_index::TranslationIndex;
