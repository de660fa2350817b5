//! Benchmarks for reachability index build and query throughput.
//!
//! Run with: `cargo bench -p reach-index`
//!
//! Datasets are built from the same lattice and rotation samplers the
//! generator uses, so sizes track realistic maps.

#![allow(
    missing_docs,
    clippy::unwrap_used,
    clippy::cast_precision_loss,
    clippy::ignored_unit_patterns
)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use reach_index::{PoseIndex, PoseSearch, TranslationIndex};
use reach_sample::{sample_so3, sample_volume};
use reach_types::Pose;

/// Every inside lattice point paired with every sampled rotation.
fn dataset(radius: f64, xyz_delta: f64, quat_delta: f64) -> Vec<Pose> {
    let volume = sample_volume(radius, xyz_delta).unwrap();
    let rotations = sample_so3(quat_delta).unwrap();
    volume
        .inside_points()
        .flat_map(|(_, point)| {
            rotations
                .iter()
                .map(move |rotation| Pose::from_position_rotation(point, *rotation))
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_index_build");

    for &radius in &[0.1, 0.2, 0.3] {
        let poses = dataset(radius, 0.05, 0.5);
        group.throughput(Throughput::Elements(poses.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(poses.len()), &poses, |b, poses| {
            b.iter(|| PoseIndex::from_poses(black_box(poses), 5.0).unwrap());
        });
    }

    group.finish();
}

fn bench_k_nearest(c: &mut Criterion) {
    let poses = dataset(0.3, 0.05, 0.5);
    let index = PoseIndex::from_poses(&poses, 5.0).unwrap();
    let translation = TranslationIndex::from_poses(&poses).unwrap();
    let queries: Vec<Pose> = poses.iter().step_by(7).copied().collect();

    let mut group = c.benchmark_group("k_nearest");
    group.throughput(Throughput::Elements(queries.len() as u64));

    for &k in &[1_usize, 8, 32] {
        group.bench_with_input(BenchmarkId::new("pose", k), &k, |b, &k| {
            b.iter(|| index.k_nearest(black_box(&queries), k, 0.0).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("translation", k), &k, |b, &k| {
            b.iter(|| translation.k_nearest(black_box(&queries), k, 0.0).unwrap());
        });
    }

    group.finish();
}

fn bench_radius(c: &mut Criterion) {
    let poses = dataset(0.3, 0.05, 0.5);
    let index = PoseIndex::from_poses(&poses, 5.0).unwrap();
    let queries: Vec<Pose> = poses.iter().step_by(31).copied().collect();

    c.bench_function("k_nearest_radius_batch", |b| {
        b.iter(|| {
            index
                .k_nearest_radius_batch(black_box(&queries), 0.1, 16, 0.0)
                .unwrap()
        });
    });
}

criterion_group!(benches, bench_build, bench_k_nearest, bench_radius);
criterion_main!(benches);
