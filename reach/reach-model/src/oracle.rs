//! Inverse-kinematics oracle interface.

use nalgebra::Isometry3;

/// Joint values of one IK solution.
pub type JointSolution = Vec<f64>;

/// Inverse-kinematics solver queried during generation.
///
/// Methods take `&mut self` so solvers may keep scratch state between calls.
/// Parallel generation builds a separate oracle for each rayon job, so an
/// oracle never needs to be shared.
///
/// Generation always passes `check_environment_collisions = false`: the map
/// describes the arm's own workspace, not a particular scene.
///
/// # Example
///
/// ```
/// use reach_model::{IkOracle, JointSolution};
/// use nalgebra::Isometry3;
///
/// /// Reaches any target within 0.5 of the origin, with two elbow solutions.
/// struct Sphere;
///
/// impl IkOracle for Sphere {
///     fn find_all_solutions(&mut self, target: &Isometry3<f64>, _: bool) -> Vec<JointSolution> {
///         if target.translation.vector.norm() < 0.5 {
///             vec![vec![0.0, 1.0], vec![0.0, -1.0]]
///         } else {
///             Vec::new()
///         }
///     }
/// }
///
/// let mut oracle = Sphere;
/// assert_eq!(oracle.find_all_solutions(&Isometry3::identity(), false).len(), 2);
/// assert!(oracle.find_first_solution(&Isometry3::translation(1.0, 0.0, 0.0), false).is_none());
/// ```
pub trait IkOracle {
    /// Every joint configuration placing the end effector at `target`.
    ///
    /// An empty vector means the pose is unreachable; that is not an error.
    fn find_all_solutions(
        &mut self,
        target: &Isometry3<f64>,
        check_environment_collisions: bool,
    ) -> Vec<JointSolution>;

    /// Any one joint configuration placing the end effector at `target`.
    ///
    /// Defaults to the first of [`IkOracle::find_all_solutions`]; solvers with
    /// a cheaper single-solution path should override it.
    fn find_first_solution(
        &mut self,
        target: &Isometry3<f64>,
        check_environment_collisions: bool,
    ) -> Option<JointSolution> {
        self.find_all_solutions(target, check_environment_collisions)
            .into_iter()
            .next()
    }
}

impl<O: IkOracle + ?Sized> IkOracle for &mut O {
    fn find_all_solutions(
        &mut self,
        target: &Isometry3<f64>,
        check_environment_collisions: bool,
    ) -> Vec<JointSolution> {
        (**self).find_all_solutions(target, check_environment_collisions)
    }

    fn find_first_solution(
        &mut self,
        target: &Isometry3<f64>,
        check_environment_collisions: bool,
    ) -> Option<JointSolution> {
        (**self).find_first_solution(target, check_environment_collisions)
    }
}
