//! End-effector poses and the sign-invariant rotation metric.

use nalgebra::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of scalar components in a flattened pose.
pub const POSE_DIM: usize = 7;

/// Position and orientation of the end effector.
///
/// The quaternion `q` and its negation `-q` describe the same rotation;
/// [`Pose::rotation_distance`] treats them as identical.
///
/// Flattened poses ([`Pose::to_array`]) use the order
/// `[qw, qx, qy, qz, tx, ty, tz]`.
///
/// # Example
///
/// ```
/// use reach_types::Pose;
/// use nalgebra::{Point3, UnitQuaternion};
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// assert_eq!(pose.to_array(), [1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Translation component.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Create a pose from an isometry.
    #[must_use]
    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        Self {
            position: Point3::from(iso.translation.vector),
            rotation: iso.rotation,
        }
    }

    /// Convert to an isometry (the homogeneous-transform view of the pose).
    #[must_use]
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.rotation)
    }

    /// Build a pose from `[qw, qx, qy, qz, tx, ty, tz]`.
    ///
    /// The quaternion part is normalized. Returns `None` if it has (near)
    /// zero norm or any value is not finite.
    #[must_use]
    pub fn from_array(values: [f64; POSE_DIM]) -> Option<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let quaternion = Quaternion::new(values[0], values[1], values[2], values[3]);
        let rotation = UnitQuaternion::try_new(quaternion, 1e-12)?;
        Some(Self {
            position: Point3::new(values[4], values[5], values[6]),
            rotation,
        })
    }

    /// Flatten to `[qw, qx, qy, qz, tx, ty, tz]`.
    #[must_use]
    pub fn to_array(&self) -> [f64; POSE_DIM] {
        let q = self.rotation.quaternion();
        [
            q.w,
            q.i,
            q.j,
            q.k,
            self.position.x,
            self.position.y,
            self.position.z,
        ]
    }

    /// The same pose with its quaternion negated.
    ///
    /// Represents the identical rigid transform.
    #[must_use]
    pub fn with_negated_quaternion(&self) -> Self {
        Self {
            position: self.position,
            rotation: UnitQuaternion::new_unchecked(-self.rotation.into_inner()),
        }
    }

    /// Transform a point from local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Compute the inverse pose.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            position: Point3::from(-(inv_rotation * self.position.coords)),
            rotation: inv_rotation,
        }
    }

    /// Compose two poses: self * other.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            position: self.transform_point(&other.position),
            rotation: self.rotation * other.rotation,
        }
    }

    /// Sign-invariant angular distance between the two orientations.
    ///
    /// See [`quat_distance`].
    #[must_use]
    pub fn rotation_distance(&self, other: &Self) -> f64 {
        quat_distance(&self.rotation, &other.rotation)
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

/// Angular distance between two unit quaternions on S³, folded over the
/// double cover: `acos(min(1, |q1 . q2|))`.
///
/// Zero for `q` and `-q`; at most `pi / 2`.
///
/// # Example
///
/// ```
/// use reach_types::quat_distance;
/// use nalgebra::{Unit, UnitQuaternion};
///
/// let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 1.1);
/// let neg = Unit::new_unchecked(-q.into_inner());
/// assert!(quat_distance(&q, &neg) < 1e-7);
/// ```
#[must_use]
pub fn quat_distance(a: &UnitQuaternion<f64>, b: &UnitQuaternion<f64>) -> f64 {
    a.coords.dot(&b.coords).abs().min(1.0).acos()
}
