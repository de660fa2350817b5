//! Near-uniform deterministic sampling of the rotation group.
//!
//! Rotations are generated on a Hopf-fibration grid: S² base directions from
//! a Fibonacci sphere, each lifted along a uniformly sampled S¹ fibre. The
//! grid density is chosen so neighboring quaternions sit roughly
//! `quat_delta` apart under [`quat_distance`].
//!
//! Each rotation appears exactly once. Quaternion signs are not folded into
//! a hemisphere; the fibre angle `psi` covers `[0, 2*pi)`, which reaches
//! every rotation through one of its two quaternions.

use std::f64::consts::{PI, TAU};

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::{Quaternion, UnitQuaternion};
use reach_types::{ReachError, ReachResult, quat_distance};
use tracing::debug;

/// Upper bound on the number of generated rotations.
pub const MAX_ROTATIONS: usize = 4_000_000;

/// Sampled rotations together with the spacing actually achieved.
#[derive(Debug, Clone)]
pub struct RotationSamples {
    rotations: Vec<UnitQuaternion<f64>>,
    realized_delta: f64,
}

impl RotationSamples {
    /// The identity rotation alone, used for translation-only maps.
    #[must_use]
    pub fn identity_only() -> Self {
        Self {
            rotations: vec![UnitQuaternion::identity()],
            realized_delta: 0.0,
        }
    }

    /// Sampled rotations.
    #[must_use]
    pub fn rotations(&self) -> &[UnitQuaternion<f64>] {
        &self.rotations
    }

    /// Number of sampled rotations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    /// Returns `true` if there are no rotations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    /// Mean nearest-neighbor distance between the samples.
    ///
    /// Zero for translation-only sampling.
    #[must_use]
    pub const fn realized_delta(&self) -> f64 {
        self.realized_delta
    }
}

/// Samples rotations for a generation run.
///
/// With `translation_only` the result is the single identity rotation and a
/// realized delta of zero; otherwise see [`sample_so3`] and
/// [`realized_quat_delta`].
///
/// # Errors
///
/// Returns [`ReachError::InvalidConfig`] if `quat_delta` is not positive and
/// finite, or asks for more than [`MAX_ROTATIONS`] samples.
///
/// # Example
///
/// ```
/// use reach_sample::sample_rotations;
///
/// let samples = sample_rotations(0.5, false).unwrap();
/// assert!(samples.len() > 1);
/// assert!(samples.realized_delta() > 0.0);
///
/// let identity = sample_rotations(0.5, true).unwrap();
/// assert_eq!(identity.len(), 1);
/// assert_eq!(identity.realized_delta(), 0.0);
/// ```
pub fn sample_rotations(quat_delta: f64, translation_only: bool) -> ReachResult<RotationSamples> {
    if translation_only {
        return Ok(RotationSamples::identity_only());
    }
    let rotations = sample_so3(quat_delta)?;
    let realized_delta = realized_quat_delta(&rotations);
    debug!(
        requested = quat_delta,
        realized = realized_delta,
        count = rotations.len(),
        "Sampled SO(3)"
    );
    Ok(RotationSamples {
        rotations,
        realized_delta,
    })
}

/// Generates unit quaternions covering SO(3) at roughly `quat_delta` spacing.
///
/// Uses `ceil(pi / quat_delta^2)` Fibonacci-sphere directions times
/// `ceil(pi / quat_delta)` fibre angles.
///
/// # Errors
///
/// Returns [`ReachError::InvalidConfig`] if `quat_delta` is not positive and
/// finite, or the grid would exceed [`MAX_ROTATIONS`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[allow(clippy::cast_precision_loss)]
pub fn sample_so3(quat_delta: f64) -> ReachResult<Vec<UnitQuaternion<f64>>> {
    if !(quat_delta > 0.0 && quat_delta.is_finite()) {
        return Err(ReachError::invalid_config(format!(
            "quat_delta must be positive, got {quat_delta}"
        )));
    }

    let sphere_count = (PI / (quat_delta * quat_delta)).ceil().max(1.0);
    let circle_count = (PI / quat_delta).ceil().max(1.0);
    if sphere_count * circle_count > MAX_ROTATIONS as f64 {
        return Err(ReachError::invalid_config(format!(
            "quat_delta {quat_delta} needs more than {MAX_ROTATIONS} rotations"
        )));
    }
    let sphere_count = sphere_count as usize;
    let circle_count = circle_count as usize;

    let golden_ratio = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let psi_step = TAU / circle_count as f64;
    let mut rotations = Vec::with_capacity(sphere_count * circle_count);

    for i in 0..sphere_count {
        let theta = (1.0 - 2.0 * (i as f64 + 0.5) / sphere_count as f64).acos();
        let phi = TAU * (i as f64) / golden_ratio;
        let (sin_half, cos_half) = (theta * 0.5).sin_cos();

        for j in 0..circle_count {
            let psi = psi_step * j as f64;
            let half_psi = psi * 0.5;
            let q = Quaternion::new(
                cos_half * half_psi.cos(),
                cos_half * half_psi.sin(),
                sin_half * (phi + half_psi).cos(),
                sin_half * (phi + half_psi).sin(),
            );
            rotations.push(UnitQuaternion::new_normalize(q));
        }
    }

    Ok(rotations)
}

/// Mean distance from each rotation to its nearest other rotation.
///
/// Distances use the sign-invariant [`quat_distance`]; the zero
/// self-distance is excluded. Returns `0.0` for fewer than two rotations.
///
/// Neighbors are found in a k-d tree over both signs of every quaternion, so
/// large grids are measured in `O(n log n)`.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn realized_quat_delta(rotations: &[UnitQuaternion<f64>]) -> f64 {
    let n = rotations.len();
    if n < 2 {
        return 0.0;
    }

    // Grid quaternions share component values, which the tree build cannot
    // split on. A fixed left rotation keeps distances and mixes components.
    let tilt = UnitQuaternion::from_euler_angles(0.3, 0.7, 1.1);
    let mut entries: Vec<[f64; 4]> = rotations
        .iter()
        .map(|q| {
            let c = (tilt * q).coords;
            [c.w, c.x, c.y, c.z]
        })
        .collect();
    entries.extend_from_within(..);
    for twin in &mut entries[n..] {
        for value in twin.iter_mut() {
            *value = -*value;
        }
    }
    let tree: ImmutableKdTree<f64, 4> = ImmutableKdTree::new_from_slice(&entries);

    // The closest entry is the rotation itself; the next two include the
    // nearest other rotation under one of its signs
    let total: f64 = entries[..n]
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            tree.nearest_n::<SquaredEuclidean>(entry, 3)
                .into_iter()
                .map(|hit| hit.item as usize)
                .filter(|&item| item != i && item != i + n)
                .map(|item| quat_distance(&rotations[i], &rotations[item % n]))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();

    total / n as f64
}
