//! Kinematic chain interface and the geometry generation derives from it.

use nalgebra::{Isometry3, Point3};
use reach_types::{ReachError, ReachResult};

/// Read-only view of a manipulator's kinematic structure.
///
/// All transforms and anchors are in the robot frame with the robot placed
/// at the identity.
pub trait KinematicChain {
    /// Anchors of the arm joints, ordered from base to tip.
    fn arm_joint_anchors(&self) -> Vec<Point3<f64>>;

    /// Pose of the manipulator base link.
    fn base_transform(&self) -> Isometry3<f64>;

    /// Pose of the end effector in the current configuration.
    fn end_effector_transform(&self) -> Isometry3<f64>;

    /// Hash of the robot's kinematic structure; changes invalidate stored maps.
    fn structure_hash(&self) -> String;

    /// Name of the manipulator being mapped.
    fn manipulator_name(&self) -> String;
}

/// Placement of the sampling lattice relative to a kinematic chain.
///
/// # Example
///
/// ```
/// use reach_model::{ChainGeometry, KinematicChain};
/// use nalgebra::{Isometry3, Point3};
///
/// struct TwoLink;
///
/// impl KinematicChain for TwoLink {
///     fn arm_joint_anchors(&self) -> Vec<Point3<f64>> {
///         vec![Point3::new(0.0, 0.0, 0.2), Point3::new(0.0, 0.0, 0.5)]
///     }
///     fn base_transform(&self) -> Isometry3<f64> {
///         Isometry3::translation(0.0, 0.0, 0.1)
///     }
///     fn end_effector_transform(&self) -> Isometry3<f64> {
///         Isometry3::translation(0.4, 0.0, 0.5)
///     }
///     fn structure_hash(&self) -> String {
///         "abc".into()
///     }
///     fn manipulator_name(&self) -> String {
///         "arm".into()
///     }
/// }
///
/// let geometry = ChainGeometry::from_chain(&TwoLink).unwrap();
/// assert!((geometry.arm_length() - 0.7).abs() < 1e-12);
/// assert!((geometry.base_anchor() - Point3::new(0.0, 0.0, 0.1)).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainGeometry {
    base: Isometry3<f64>,
    base_anchor: Point3<f64>,
    arm_length: f64,
}

impl ChainGeometry {
    /// Derives the lattice placement from a chain.
    ///
    /// The arm length sums the distances from the end effector back through
    /// each joint anchor to the first arm joint. The base anchor is the
    /// first arm joint's anchor expressed in the base frame.
    ///
    /// # Errors
    ///
    /// Returns [`ReachError::DegenerateChain`] if the chain has no arm joints,
    /// its arm has zero (or non-finite) length, or the end effector sits on
    /// the first arm joint.
    pub fn from_chain<C: KinematicChain + ?Sized>(chain: &C) -> ReachResult<Self> {
        let anchors = chain.arm_joint_anchors();
        let Some(first) = anchors.first() else {
            return Err(ReachError::degenerate_chain(format!(
                "manipulator '{}' has no arm joints",
                chain.manipulator_name()
            )));
        };

        let end_effector = Point3::from(chain.end_effector_transform().translation.vector);
        let mut tip = end_effector;
        let mut arm_length = 0.0;
        for anchor in anchors.iter().rev() {
            arm_length += (tip - anchor).norm();
            tip = *anchor;
        }
        if !(arm_length > 0.0 && arm_length.is_finite()) {
            return Err(ReachError::degenerate_chain(format!(
                "manipulator '{}' has arm length {arm_length}",
                chain.manipulator_name()
            )));
        }

        // An arm that folds back onto its first joint reaches nothing
        let span = (end_effector - first).norm();
        if !(span > 0.0) {
            return Err(ReachError::degenerate_chain(format!(
                "manipulator '{}' has its end effector at the first arm joint",
                chain.manipulator_name()
            )));
        }

        let base = chain.base_transform();
        Ok(Self {
            base,
            base_anchor: base.inverse_transform_point(first),
            arm_length,
        })
    }

    /// Base link pose in the robot frame.
    #[must_use]
    pub const fn base(&self) -> &Isometry3<f64> {
        &self.base
    }

    /// First arm joint anchor in the base frame; the lattice is centered here.
    #[must_use]
    pub const fn base_anchor(&self) -> Point3<f64> {
        self.base_anchor
    }

    /// Summed anchor-to-anchor length of the arm.
    #[must_use]
    pub const fn arm_length(&self) -> f64 {
        self.arm_length
    }

    /// Sampling radius: the configured one, or arm length plus one lattice step.
    #[must_use]
    pub fn sampling_radius(&self, configured: Option<f64>, xyz_delta: f64) -> f64 {
        configured.unwrap_or(self.arm_length + xyz_delta)
    }
}
