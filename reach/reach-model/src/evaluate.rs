//! Per-voxel pose evaluation against an IK oracle.

use nalgebra::{Isometry3, Point3, UnitQuaternion};
use reach_types::{Pose, PoseRecord};

use crate::chain::ChainGeometry;
use crate::oracle::IkOracle;

/// How feasibility is counted for each pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionMode {
    /// Count every IK solution; density reflects redundancy.
    AllSolutions,
    /// Stop at the first solution; each reachable pose counts once.
    FirstSolution,
}

impl SolutionMode {
    /// Mode selected by the `use_free_space` option.
    #[must_use]
    pub const fn from_free_space(use_free_space: bool) -> Self {
        if use_free_space {
            Self::AllSolutions
        } else {
            Self::FirstSolution
        }
    }
}

/// Everything learned about one voxel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoxelOutcome {
    /// Flat x-major index of the voxel in the output fields.
    pub flat_index: usize,
    /// Total IK solutions over all rotations.
    pub solutions: u64,
    /// Number of rotations with at least one solution.
    pub rotations_reached: usize,
    /// Feasible poses in rotation order, in the base frame.
    pub records: Vec<PoseRecord>,
}

/// Evaluates every sampled rotation at a voxel.
///
/// Holds only shared, read-only state, so one evaluator serves every worker.
#[derive(Debug, Clone, Copy)]
pub struct PoseEvaluator<'a> {
    base: Isometry3<f64>,
    base_anchor: Point3<f64>,
    rotations: &'a [UnitQuaternion<f64>],
    mode: SolutionMode,
}

impl<'a> PoseEvaluator<'a> {
    /// Creates an evaluator for a chain's geometry and a rotation set.
    #[must_use]
    pub fn new(
        geometry: &ChainGeometry,
        rotations: &'a [UnitQuaternion<f64>],
        mode: SolutionMode,
    ) -> Self {
        Self {
            base: *geometry.base(),
            base_anchor: geometry.base_anchor(),
            rotations,
            mode,
        }
    }

    /// Number of rotations tried per voxel.
    #[must_use]
    pub const fn num_rotations(&self) -> usize {
        self.rotations.len()
    }

    /// Queries the oracle for every rotation at lattice point `point`.
    ///
    /// The pose is `point` shifted onto the base anchor, in the base frame;
    /// the oracle sees it composed with the base transform.
    pub fn evaluate_voxel<O: IkOracle + ?Sized>(
        &self,
        oracle: &mut O,
        flat_index: usize,
        point: Point3<f64>,
    ) -> VoxelOutcome {
        let position = point + self.base_anchor.coords;
        let mut outcome = VoxelOutcome {
            flat_index,
            ..VoxelOutcome::default()
        };

        for rotation in self.rotations {
            let pose = Pose::from_position_rotation(position, *rotation);
            let target = self.base * pose.to_isometry();

            let count = match self.mode {
                SolutionMode::AllSolutions => oracle.find_all_solutions(&target, false).len(),
                SolutionMode::FirstSolution => {
                    usize::from(oracle.find_first_solution(&target, false).is_some())
                }
            };
            if count > 0 {
                outcome.solutions += count as u64;
                outcome.rotations_reached += 1;
                let num_solutions = u32::try_from(count).unwrap_or(u32::MAX);
                outcome.records.push(PoseRecord::new(pose, num_solutions));
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::tests::FixedChain;
    use crate::oracle::JointSolution;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    /// Three solutions for targets with non-negative x, none otherwise.
    /// Remembers every target it saw.
    #[derive(Default)]
    struct HalfSpace {
        targets: Vec<Isometry3<f64>>,
        collision_checks: usize,
    }

    impl IkOracle for HalfSpace {
        fn find_all_solutions(
            &mut self,
            target: &Isometry3<f64>,
            check_environment_collisions: bool,
        ) -> Vec<JointSolution> {
            self.targets.push(*target);
            if check_environment_collisions {
                self.collision_checks += 1;
            }
            if target.translation.vector.x >= 0.0 {
                vec![vec![0.0]; 3]
            } else {
                Vec::new()
            }
        }
    }

    fn rotations() -> Vec<UnitQuaternion<f64>> {
        vec![
            UnitQuaternion::identity(),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.0),
        ]
    }

    #[test]
    fn test_all_solutions_counts_every_solution() {
        let geometry = ChainGeometry::from_chain(&FixedChain::planar()).unwrap();
        let rotations = rotations();
        let evaluator = PoseEvaluator::new(&geometry, &rotations, SolutionMode::AllSolutions);
        let mut oracle = HalfSpace::default();

        let outcome = evaluator.evaluate_voxel(&mut oracle, 7, Point3::new(0.1, 0.0, 0.0));
        assert_eq!(outcome.flat_index, 7);
        assert_eq!(outcome.solutions, 6);
        assert_eq!(outcome.rotations_reached, 2);
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records.iter().all(|r| r.num_solutions == 3));
        assert_eq!(oracle.collision_checks, 0);
    }

    #[test]
    fn test_first_solution_counts_once() {
        let geometry = ChainGeometry::from_chain(&FixedChain::planar()).unwrap();
        let rotations = rotations();
        let evaluator = PoseEvaluator::new(&geometry, &rotations, SolutionMode::FirstSolution);
        let mut oracle = HalfSpace::default();

        let outcome = evaluator.evaluate_voxel(&mut oracle, 0, Point3::new(0.1, 0.0, 0.0));
        assert_eq!(outcome.solutions, 2);
        assert!(outcome.records.iter().all(|r| r.num_solutions == 1));
    }

    #[test]
    fn test_unreachable_voxel_is_empty() {
        let geometry = ChainGeometry::from_chain(&FixedChain::planar()).unwrap();
        let rotations = rotations();
        let evaluator = PoseEvaluator::new(&geometry, &rotations, SolutionMode::AllSolutions);
        let mut oracle = HalfSpace::default();

        let outcome = evaluator.evaluate_voxel(&mut oracle, 3, Point3::new(-0.2, 0.0, 0.0));
        assert_eq!(outcome.solutions, 0);
        assert_eq!(outcome.rotations_reached, 0);
        assert!(outcome.records.is_empty());
        assert_eq!(oracle.targets.len(), 2);
    }

    #[test]
    fn test_records_in_base_frame_targets_in_robot_frame() {
        let mut chain = FixedChain::planar();
        chain.base = Isometry3::translation(0.5, 0.0, 0.0);
        chain.anchors = vec![Point3::new(0.5, 0.0, 0.1), Point3::new(0.5, 0.0, 0.25)];
        chain.end_effector = Isometry3::translation(0.5, 0.0, 0.4);
        let geometry = ChainGeometry::from_chain(&chain).unwrap();
        let rotations = [UnitQuaternion::identity()];
        let evaluator = PoseEvaluator::new(&geometry, &rotations, SolutionMode::AllSolutions);
        let mut oracle = HalfSpace::default();

        let outcome = evaluator.evaluate_voxel(&mut oracle, 0, Point3::new(0.0, 0.2, 0.0));

        // Record: lattice point plus base anchor (0, 0, 0.1)
        let recorded = outcome.records[0].pose.position;
        assert_relative_eq!(recorded.coords, Vector3::new(0.0, 0.2, 0.1), epsilon = 1e-12);
        // Oracle target: the same pose moved by the base transform
        assert_relative_eq!(
            oracle.targets[0].translation.vector,
            Vector3::new(0.5, 0.2, 0.1),
            epsilon = 1e-12
        );
    }
}
