//! End-to-end generation tests against analytic IK oracles.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use approx::assert_relative_eq;
use common::{CancellingOracle, NeverOracle, ShellArm, ShellOracle, coarse_config};
use nalgebra::Point3;
use reach_model::{
    CancelToken, ReachError, ReachabilityModel, SolutionMode, VoxelField, generate,
};

fn for_each_voxel(field: &VoxelField, mut f: impl FnMut(usize, f64)) {
    for (flat, &value) in field.values().iter().enumerate() {
        f(flat, value);
    }
}

#[test]
fn always_failing_oracle_yields_empty_map() {
    let arm = ShellArm::default();
    let mut model = ReachabilityModel::new(&arm, coarse_config());
    let summary = model
        .generate(&arm, &mut NeverOracle, &CancelToken::new())
        .unwrap();

    assert!(summary.voxels > 0);
    assert_eq!(summary.records, 0);
    assert!(model.has());
    assert!(model.stats().is_empty());
    assert_eq!(model.density().count_nonzero(), 0);
    assert_eq!(model.reachability().count_nonzero(), 0);
    assert_eq!(model.max_reachability(), 0.0);
    assert!(matches!(model.nearest_neighbors(false), Err(ReachError::NoData)));
    assert!(matches!(model.nearest_neighbors(true), Err(ReachError::NoData)));
}

#[test]
fn density_and_reachability_stay_in_bounds() {
    let map = generate(
        &ShellArm::default(),
        &mut ShellOracle::default(),
        &coarse_config(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(map.density.shape(), map.reachability.shape());
    for_each_voxel(&map.density, |flat, density| {
        let reachability = map.reachability.values()[flat];
        assert!((0.0..=1.0).contains(&density), "density {density} at {flat}");
        assert!((0.0..=1.0).contains(&reachability), "reachability {reachability} at {flat}");
        assert_eq!(density == 0.0, reachability == 0.0, "voxel {flat}");
    });
    assert!(map.reachability.count_nonzero() > 0);
    assert!(map.reachability.count_nonzero() < map.summary.voxels);

    // Corners of the cube lie outside the sampled ball
    for_each_voxel(&map.density, |flat, density| {
        let index = map.density.grid_index(flat).unwrap();
        let point = map.scale.index_to_point(index);
        if point.coords.norm() >= map.summary.max_radius {
            assert_eq!(density, 0.0);
            assert_eq!(map.reachability.values()[flat], 0.0);
        }
    });
}

#[test]
fn shell_shape_is_recovered() {
    let arm = ShellArm::default();
    let mut model = ReachabilityModel::new(&arm, coarse_config());
    model
        .generate(&arm, &mut ShellOracle::default(), &CancelToken::new())
        .unwrap();
    let anchor = model.base_anchor();
    assert_relative_eq!(anchor.coords, Point3::new(0.0, 0.0, 0.15).coords, epsilon = 1e-12);

    // Inside the shell every rotation reaches; at the anchor and outside none do
    let in_shell = anchor + nalgebra::Vector3::new(0.06, 0.0, 0.03);
    assert_eq!(model.reachability_at(&in_shell), Some(1.0));
    assert_eq!(model.density_at(&in_shell), Some(1.0));
    assert_eq!(model.reachability_at(&anchor), Some(0.0));
    let beyond = anchor + nalgebra::Vector3::new(0.09, 0.09, 0.0);
    assert_eq!(model.reachability_at(&beyond), Some(0.0));

    // Every record lies in the shell around the anchor
    for pose in model.stats().poses() {
        let distance = (pose.position - anchor).norm();
        assert!(
            (ShellOracle::INNER..ShellOracle::OUTER).contains(&distance),
            "record at distance {distance}"
        );
    }
}

#[test]
fn records_follow_voxel_then_rotation_order() {
    let map = generate(
        &ShellArm::default(),
        &mut ShellOracle::default(),
        &coarse_config(),
        &CancelToken::new(),
    )
    .unwrap();

    let flat_of = |position: &Point3<f64>| {
        let local = Point3::from(position - map.base_anchor);
        map.density.flat_index(map.scale.point_to_index(&local)).unwrap()
    };
    let flats: Vec<usize> = map.stats.poses().map(|p| flat_of(&p.position)).collect();
    assert!(flats.windows(2).all(|w| w[0] <= w[1]));

    // Solution counts per voxel reproduce the density field
    let mut per_voxel: HashMap<usize, u64> = HashMap::new();
    for (record, &flat) in map.stats.records().iter().zip(&flats) {
        *per_voxel.entry(flat).or_default() += u64::from(record.num_solutions);
    }
    let rotations = map.summary.rotations as f64;
    for (flat, solutions) in per_voxel {
        let expected = (solutions as f64 / rotations).min(1.0);
        assert_relative_eq!(map.density.values()[flat], expected, epsilon = 1e-12);
    }
}

#[test]
fn first_solution_mode_makes_density_equal_reachability() {
    let config = coarse_config().with_free_space(false);
    let map = generate(
        &ShellArm::default(),
        &mut ShellOracle::default(),
        &config,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(map.summary.mode, SolutionMode::FirstSolution);
    assert_eq!(map.density, map.reachability);
    assert!(map.stats.records().iter().all(|r| r.num_solutions == 1));
}

#[test]
fn translation_only_uses_identity_rotation() {
    let config = coarse_config().with_translation_only(true);
    let map = generate(
        &ShellArm::default(),
        &mut ShellOracle::default(),
        &config,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(map.summary.rotations, 1);
    assert_eq!(map.quat_delta, 0.0);
    assert_eq!(map.stats.len(), map.reachability.count_nonzero());
    assert!(map.stats.poses().all(|p| p.rotation == nalgebra::UnitQuaternion::identity()));
}

#[test]
fn degenerate_chain_is_rejected() {
    let arm = ShellArm {
        anchors: Vec::new(),
        ..ShellArm::default()
    };
    let mut oracle = ShellOracle::default();
    let result = generate(&arm, &mut oracle, &coarse_config(), &CancelToken::new());

    assert!(matches!(result, Err(ReachError::DegenerateChain(_))));
    assert_eq!(oracle.calls, 0);
}

#[test]
fn cancellation_stops_generation() {
    let token = CancelToken::new();
    let mut oracle = CancellingOracle {
        token: token.clone(),
        calls: Arc::new(AtomicUsize::new(0)),
        limit: 50,
    };
    let result = generate(&ShellArm::default(), &mut oracle, &coarse_config(), &token);

    assert!(matches!(result, Err(ReachError::Cancelled)));
    assert!(result.is_err_and(|e| e.is_cancelled()));
}

#[test]
fn generated_records_round_trip_through_index() {
    let arm = ShellArm::default();
    let mut model = ReachabilityModel::new(&arm, coarse_config());
    model
        .generate(&arm, &mut ShellOracle::default(), &CancelToken::new())
        .unwrap();

    let poses: Vec<_> = model.stats().poses().step_by(17).copied().collect();
    let expected: Vec<usize> = (0..model.stats().len()).step_by(17).collect();
    let index = model.nearest_neighbors(false).unwrap();
    let found = index.k_nearest(&poses, 1, 0.0).unwrap();
    for (neighbors, &i) in found.iter().zip(&expected) {
        assert_eq!(neighbors[0].index, i);
        assert!(neighbors[0].distance_sq < 1e-12);
    }

    // Flipping every query quaternion changes nothing
    let flipped: Vec<_> = poses.iter().map(|p| p.with_negated_quaternion()).collect();
    let again = index.k_nearest(&flipped, 1, 0.0).unwrap();
    for (a, b) in found.iter().zip(&again) {
        assert_eq!(a[0].index, b[0].index);
    }
}

#[cfg(feature = "parallel")]
mod parallel {
    use super::*;
    use reach_model::generate_parallel;

    #[test]
    fn parallel_matches_sequential() {
        let arm = ShellArm::default();
        let config = coarse_config();
        let sequential = generate(
            &arm,
            &mut ShellOracle::default(),
            &config,
            &CancelToken::new(),
        )
        .unwrap();
        let parallel =
            generate_parallel(&arm, ShellOracle::default, &config, &CancelToken::new()).unwrap();

        assert_eq!(parallel.stats, sequential.stats);
        assert_eq!(parallel.density, sequential.density);
        assert_eq!(parallel.reachability, sequential.reachability);
        assert_eq!(parallel.scale, sequential.scale);
        assert_eq!(parallel.summary.records, sequential.summary.records);
    }

    #[test]
    fn parallel_cancellation() {
        let token = CancelToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let make_oracle = || CancellingOracle {
            token: token.clone(),
            calls: Arc::clone(&calls),
            limit: 50,
        };
        let result = generate_parallel(&ShellArm::default(), make_oracle, &coarse_config(), &token);
        assert!(matches!(result, Err(ReachError::Cancelled)));
    }

    #[test]
    fn parallel_model_generation() {
        let arm = ShellArm::default();
        let mut model = ReachabilityModel::new(&arm, coarse_config());
        let summary = model
            .generate_parallel(&arm, ShellOracle::default, &CancelToken::new())
            .unwrap();
        assert_eq!(summary.records, model.stats().len());
        assert!(model.max_reachability() > 0.0);
    }
}
