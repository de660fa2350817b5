//! Uniform volumetric sampling of a ball on a cubic lattice.

use nalgebra::Point3;
use reach_types::{GridIndex, PoseScale, ReachError, ReachResult, VoxelField};

/// Upper bound on the number of lattice points in a sampled cube.
pub const MAX_GRID_POINTS: usize = 1 << 30;

/// Lattice points of a cube centered at the origin, and the subset inside
/// the sampling ball.
///
/// The cube spans `[-nsteps * delta, nsteps * delta]` on each axis with
/// `nsteps = floor(max_radius / delta)`, so its side is `2 * nsteps + 1`.
/// Points are stored flat in x-major order, matching [`VoxelField`].
#[derive(Debug, Clone)]
pub struct VolumeSamples {
    points: Vec<Point3<f64>>,
    inside: Vec<usize>,
    side: usize,
    scale: PoseScale,
    max_radius: f64,
}

impl VolumeSamples {
    /// Every lattice point, flat in x-major order.
    #[must_use]
    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Flat indices of points strictly inside the sampling ball.
    #[must_use]
    pub fn inside(&self) -> &[usize] {
        &self.inside
    }

    /// Iterator over `(flat index, point)` for points inside the ball.
    pub fn inside_points(&self) -> impl ExactSizeIterator<Item = (usize, Point3<f64>)> + '_ {
        self.inside.iter().map(|&flat| (flat, self.points[flat]))
    }

    /// Side length of the cube in lattice points.
    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Grid shape as `[side, side, side]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 3] {
        [self.side, self.side, self.side]
    }

    /// Point/index scale of the lattice.
    #[must_use]
    pub const fn scale(&self) -> PoseScale {
        self.scale
    }

    /// Radius of the sampling ball.
    #[must_use]
    pub const fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// An all-zero field with this lattice's shape.
    #[must_use]
    pub fn empty_field(&self) -> VoxelField {
        VoxelField::zeros(self.side)
    }

    /// Grid index of a flat lattice offset.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn grid_index(&self, flat: usize) -> GridIndex {
        let side = self.side;
        GridIndex::new(
            (flat / (side * side)) as i64,
            ((flat / side) % side) as i64,
            (flat % side) as i64,
        )
    }
}

/// Samples the cube around the origin at spacing `delta` and marks the
/// points whose norm is strictly below `max_radius`.
///
/// Deterministic and exhaustive: O(side³) points.
///
/// # Errors
///
/// Returns [`ReachError::InvalidConfig`] if either argument is not positive
/// and finite, or the cube would exceed [`MAX_GRID_POINTS`].
///
/// # Example
///
/// ```
/// use reach_sample::sample_volume;
/// use nalgebra::Point3;
///
/// let samples = sample_volume(0.1, 0.05).unwrap();
/// assert_eq!(samples.side(), 5);
///
/// let center = samples.scale().point_to_index(&Point3::origin());
/// assert_eq!(samples.scale().index_to_point(center), Point3::origin());
/// ```
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn sample_volume(max_radius: f64, delta: f64) -> ReachResult<VolumeSamples> {
    if !(max_radius > 0.0 && max_radius.is_finite()) {
        return Err(ReachError::invalid_config(format!(
            "max_radius must be positive, got {max_radius}"
        )));
    }
    if !(delta > 0.0 && delta.is_finite()) {
        return Err(ReachError::invalid_config(format!(
            "delta must be positive, got {delta}"
        )));
    }

    let steps = (max_radius / delta).floor();
    let side_f = 2.0 * steps + 1.0;
    if side_f * side_f * side_f > MAX_GRID_POINTS as f64 {
        return Err(ReachError::invalid_config(format!(
            "radius {max_radius} at spacing {delta} exceeds {MAX_GRID_POINTS} grid points"
        )));
    }
    let nsteps = steps as usize;
    let side = 2 * nsteps + 1;
    let coord = |i: usize| (i as f64 - nsteps as f64) * delta;

    let radius_sq = max_radius * max_radius;
    let mut points = Vec::with_capacity(side * side * side);
    let mut inside = Vec::new();

    for i in 0..side {
        for j in 0..side {
            for k in 0..side {
                let point = Point3::new(coord(i), coord(j), coord(k));
                if point.coords.norm_squared() < radius_sq {
                    inside.push(points.len());
                }
                points.push(point);
            }
        }
    }

    Ok(VolumeSamples {
        points,
        inside,
        side,
        scale: PoseScale::from_delta(delta, nsteps),
        max_radius,
    })
}
