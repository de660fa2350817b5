//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use reach_model::{CancelToken, IkOracle, JointSolution, KinematicChain, ReachabilityConfig};

/// Shoulder of [`ShellArm`] in the robot frame.
pub const SHOULDER: Point3<f64> = Point3::new(0.3, 0.0, 0.2);

/// Two-segment arm mounted on a base that is shifted and turned about z.
#[derive(Debug, Clone)]
pub struct ShellArm {
    pub hash: String,
    pub anchors: Vec<Point3<f64>>,
}

impl Default for ShellArm {
    fn default() -> Self {
        Self {
            hash: "5he11".to_string(),
            anchors: vec![SHOULDER, Point3::new(0.3, 0.0, 0.32)],
        }
    }
}

impl KinematicChain for ShellArm {
    fn arm_joint_anchors(&self) -> Vec<Point3<f64>> {
        self.anchors.clone()
    }

    fn base_transform(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(0.3, 0.0, 0.05),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2),
        )
    }

    fn end_effector_transform(&self) -> Isometry3<f64> {
        Isometry3::translation(0.3, 0.0, 0.44)
    }

    fn structure_hash(&self) -> String {
        self.hash.clone()
    }

    fn manipulator_name(&self) -> String {
        "shell".to_string()
    }
}

/// Reaches a spherical shell around [`SHOULDER`]. Targets whose z axis
/// points up get two elbow solutions, others one.
#[derive(Debug, Default)]
pub struct ShellOracle {
    pub calls: usize,
}

impl ShellOracle {
    pub const INNER: f64 = 0.04;
    pub const OUTER: f64 = 0.125;
}

impl IkOracle for ShellOracle {
    fn find_all_solutions(
        &mut self,
        target: &Isometry3<f64>,
        check_environment_collisions: bool,
    ) -> Vec<JointSolution> {
        assert!(!check_environment_collisions);
        self.calls += 1;

        let distance = (Point3::from(target.translation.vector) - SHOULDER).norm();
        if !(Self::INNER..Self::OUTER).contains(&distance) {
            return Vec::new();
        }
        let up = target.rotation * Vector3::z();
        if up.z >= 0.0 {
            vec![vec![distance, 1.0], vec![distance, -1.0]]
        } else {
            vec![vec![distance, 0.0]]
        }
    }
}

/// Never finds a solution.
#[derive(Debug, Default)]
pub struct NeverOracle;

impl IkOracle for NeverOracle {
    fn find_all_solutions(&mut self, _: &Isometry3<f64>, _: bool) -> Vec<JointSolution> {
        Vec::new()
    }
}

/// Cancels a token after a number of calls, shared across clones.
#[derive(Debug, Clone)]
pub struct CancellingOracle {
    pub token: CancelToken,
    pub calls: Arc<AtomicUsize>,
    pub limit: usize,
}

impl IkOracle for CancellingOracle {
    fn find_all_solutions(&mut self, _: &Isometry3<f64>, _: bool) -> Vec<JointSolution> {
        if self.calls.fetch_add(1, Ordering::Relaxed) + 1 >= self.limit {
            self.token.cancel();
        }
        vec![vec![0.0]]
    }
}

/// Coarse settings that keep test runs small.
pub fn coarse_config() -> ReachabilityConfig {
    ReachabilityConfig::new()
        .with_max_radius(0.15)
        .with_xyz_delta(0.03)
        .with_quat_delta(1.0)
}

/// Default rotation grid (91 rotations) over the 26 lattice points around
/// the shoulder that fall inside the shell.
pub fn default_rotation_config() -> ReachabilityConfig {
    ReachabilityConfig::new()
        .with_max_radius(0.1)
        .with_xyz_delta(0.05)
}
