//! Dense voxel fields and the point/index scale that addresses them.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{ReachError, ReachResult};

/// A discrete 3D index into a [`VoxelField`].
///
/// Signed, so that points outside the sampled cube still map to an index
/// which [`VoxelField::get`] then rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridIndex {
    /// X index.
    pub i: i64,
    /// Y index.
    pub j: i64,
    /// Z index.
    pub k: i64,
}

impl GridIndex {
    /// Creates a new grid index.
    #[must_use]
    pub const fn new(i: i64, j: i64, k: i64) -> Self {
        Self { i, j, k }
    }

    /// Returns the index as an array.
    #[must_use]
    pub const fn as_array(self) -> [i64; 3] {
        [self.i, self.j, self.k]
    }
}

/// Affine mapping between world coordinates and grid indices.
///
/// `index = round(point * scale) + offset` and
/// `point = (index - offset) / scale`, with `scale = 1 / delta` and
/// `offset = nsteps`. Fixed once a model is generated.
///
/// # Example
///
/// ```
/// use reach_types::{GridIndex, PoseScale};
/// use nalgebra::Point3;
///
/// let scale = PoseScale::from_delta(0.05, 2);
/// assert_eq!(scale.point_to_index(&Point3::origin()), GridIndex::new(2, 2, 2));
/// assert_eq!(scale.index_to_point(GridIndex::new(2, 2, 2)), Point3::origin());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseScale {
    /// Multiplier from world units to grid steps (`1 / delta`).
    pub scale: f64,
    /// Index of the world origin along every axis (`nsteps`).
    pub offset: f64,
}

impl PoseScale {
    /// Creates the scale for a grid of spacing `delta` and `nsteps` cells on
    /// each side of the origin.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_delta(delta: f64, nsteps: usize) -> Self {
        Self {
            scale: 1.0 / delta,
            offset: nsteps as f64,
        }
    }

    /// Grid spacing in world units.
    #[must_use]
    pub fn delta(&self) -> f64 {
        1.0 / self.scale
    }

    /// Maps a world point to the nearest grid index.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn point_to_index(&self, point: &Point3<f64>) -> GridIndex {
        let map = |v: f64| ((v * self.scale).round() + self.offset) as i64;
        GridIndex::new(map(point.x), map(point.y), map(point.z))
    }

    /// Maps a grid index back to its world point.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn index_to_point(&self, index: GridIndex) -> Point3<f64> {
        let unmap = |v: i64| (v as f64 - self.offset) / self.scale;
        Point3::new(unmap(index.i), unmap(index.j), unmap(index.k))
    }
}

/// A dense cubic grid of scalar values.
///
/// Values are stored in x-major order:
/// `flat = (i * side + j) * side + k`.
///
/// # Example
///
/// ```
/// use reach_types::{GridIndex, VoxelField};
///
/// let mut field = VoxelField::zeros(5);
/// assert_eq!(field.len(), 125);
///
/// field.set(GridIndex::new(2, 2, 2), 0.75).unwrap();
/// assert_eq!(field.get(GridIndex::new(2, 2, 2)), Some(0.75));
/// assert_eq!(field.get(GridIndex::new(5, 0, 0)), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VoxelField {
    side: usize,
    values: Vec<f64>,
}

impl VoxelField {
    /// Creates a field of the given side length with every value zero.
    #[must_use]
    pub fn zeros(side: usize) -> Self {
        Self {
            side,
            values: vec![0.0; side * side * side],
        }
    }

    /// Creates a field from flat x-major values.
    ///
    /// # Errors
    ///
    /// Returns [`ReachError::InvalidConfig`] if `values.len()` is not `side³`.
    pub fn from_values(side: usize, values: Vec<f64>) -> ReachResult<Self> {
        if values.len() != side * side * side {
            return Err(ReachError::invalid_config(format!(
                "field of side {side} needs {} values, got {}",
                side * side * side,
                values.len()
            )));
        }
        Ok(Self { side, values })
    }

    /// Side length along each axis.
    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Shape as `[side, side, side]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 3] {
        [self.side, self.side, self.side]
    }

    /// Total number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the field holds no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat offset of an index, or `None` if it lies outside the cube.
    #[must_use]
    pub fn flat_index(&self, index: GridIndex) -> Option<usize> {
        let side = self.side;
        let axis = |v: i64| usize::try_from(v).ok().filter(|&v| v < side);
        let (i, j, k) = (axis(index.i)?, axis(index.j)?, axis(index.k)?);
        Some((i * side + j) * side + k)
    }

    /// Inverse of [`VoxelField::flat_index`].
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn grid_index(&self, flat: usize) -> Option<GridIndex> {
        if flat >= self.values.len() {
            return None;
        }
        let side = self.side;
        Some(GridIndex::new(
            (flat / (side * side)) as i64,
            ((flat / side) % side) as i64,
            (flat % side) as i64,
        ))
    }

    /// Value at an index, or `None` outside the cube.
    #[must_use]
    pub fn get(&self, index: GridIndex) -> Option<f64> {
        self.flat_index(index).map(|flat| self.values[flat])
    }

    /// Sets the value at an index.
    ///
    /// # Errors
    ///
    /// Returns [`ReachError::InvalidQuery`] if the index lies outside the cube.
    pub fn set(&mut self, index: GridIndex, value: f64) -> ReachResult<()> {
        let flat = self
            .flat_index(index)
            .ok_or_else(|| ReachError::invalid_query(format!("{index:?} is outside the field")))?;
        self.values[flat] = value;
        Ok(())
    }

    /// Flat values in x-major order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable flat values in x-major order.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Largest value in the field (`0.0` for an all-zero or empty field).
    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Number of voxels with a strictly positive value.
    #[must_use]
    pub fn count_nonzero(&self) -> usize {
        self.values.iter().filter(|&&v| v > 0.0).count()
    }
}
