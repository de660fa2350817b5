//! The generation pipeline: sample, evaluate, aggregate.
//!
//! Generation samples the lattice ball around the first arm joint and the
//! rotation set, asks the IK oracle about every (voxel, rotation) pose, and
//! folds the answers into density and reachability fields.
//!
//! # Parallelism
//!
//! Voxels are independent. [`generate_parallel`] spreads them over rayon's
//! pool, building a fresh oracle from a factory for each rayon job, and then
//! aggregates in voxel order, so its output is identical to [`generate`].

use std::time::{Duration, Instant};

use nalgebra::Point3;
use reach_sample::{RotationSamples, VolumeSamples, sample_rotations, sample_volume};
use reach_types::{
    PoseScale, ReachError, ReachResult, ReachabilityConfig, ReachabilityStats, VoxelField,
};
use tracing::{debug, info};

use crate::aggregate::{AggregatedMaps, DensityAggregator};
use crate::cancel::CancelToken;
use crate::chain::{ChainGeometry, KinematicChain};
use crate::evaluate::{PoseEvaluator, SolutionMode};
use crate::oracle::IkOracle;

/// Voxels between progress log lines.
const PROGRESS_INTERVAL: usize = 1000;

/// What a generation run covered and how long it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSummary {
    /// Radius of the sampled ball.
    pub max_radius: f64,
    /// Voxels inside the ball that were evaluated.
    pub voxels: usize,
    /// Rotations tried per voxel.
    pub rotations: usize,
    /// Feasible poses recorded.
    pub records: usize,
    /// Whether every solution or only the first was counted.
    pub mode: SolutionMode,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

/// Output of a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedMap {
    /// Feasible poses in the manipulator base frame.
    pub stats: ReachabilityStats,
    /// Clamped solutions-per-rotation at each voxel.
    pub density: VoxelField,
    /// Fraction of rotations reached at each voxel.
    pub reachability: VoxelField,
    /// Lattice point/index mapping (relative to `base_anchor`).
    pub scale: PoseScale,
    /// First arm joint anchor in the base frame; the lattice center.
    pub base_anchor: Point3<f64>,
    /// Lattice spacing.
    pub xyz_delta: f64,
    /// Realized rotation spacing (zero for translation-only maps).
    pub quat_delta: f64,
    /// Run statistics.
    pub summary: GenerationSummary,
}

/// Everything fixed before the first oracle call.
struct GenerationPlan {
    geometry: ChainGeometry,
    volume: VolumeSamples,
    rotations: RotationSamples,
    mode: SolutionMode,
    xyz_delta: f64,
}

impl GenerationPlan {
    fn prepare<C: KinematicChain + ?Sized>(
        chain: &C,
        config: &ReachabilityConfig,
    ) -> ReachResult<Self> {
        let issues = config.validate();
        if !issues.is_empty() {
            return Err(ReachError::invalid_config(issues.join("; ")));
        }

        let geometry = ChainGeometry::from_chain(chain)?;
        let max_radius = geometry.sampling_radius(config.max_radius(), config.xyz_delta());
        let volume = sample_volume(max_radius, config.xyz_delta())?;
        let rotations = sample_rotations(config.quat_delta(), config.translation_only())?;
        let mode = SolutionMode::from_free_space(config.use_free_space());

        info!(
            manipulator = %chain.manipulator_name(),
            radius = max_radius,
            arm_length = geometry.arm_length(),
            voxels = volume.inside().len(),
            rotations = rotations.len(),
            quat_delta = rotations.realized_delta(),
            free_space = config.use_free_space(),
            "Starting reachability generation"
        );

        Ok(Self {
            geometry,
            volume,
            rotations,
            mode,
            xyz_delta: config.xyz_delta(),
        })
    }

    fn evaluator(&self) -> PoseEvaluator<'_> {
        PoseEvaluator::new(&self.geometry, self.rotations.rotations(), self.mode)
    }

    fn aggregator(&self) -> ReachResult<DensityAggregator> {
        DensityAggregator::new(self.volume.side(), self.rotations.len())
    }

    fn finish(self, maps: AggregatedMaps, started: Instant) -> GeneratedMap {
        let summary = GenerationSummary {
            max_radius: self.volume.max_radius(),
            voxels: self.volume.inside().len(),
            rotations: self.rotations.len(),
            records: maps.stats.len(),
            mode: self.mode,
            elapsed: started.elapsed(),
        };
        info!(
            records = summary.records,
            reachable_voxels = maps.reachability.count_nonzero(),
            elapsed_s = summary.elapsed.as_secs_f64(),
            "Reachability generation finished"
        );

        GeneratedMap {
            stats: maps.stats,
            density: maps.density,
            reachability: maps.reachability,
            scale: self.volume.scale(),
            base_anchor: self.geometry.base_anchor(),
            xyz_delta: self.xyz_delta,
            quat_delta: self.rotations.realized_delta(),
            summary,
        }
    }
}

fn report_progress(done: usize, total: usize) {
    if done % PROGRESS_INTERVAL == 0 {
        debug!(done, total, "Reachability progress");
    }
}

/// Generates a reachability map on the calling thread.
///
/// # Errors
///
/// - [`ReachError::InvalidConfig`] if `config` fails validation
/// - [`ReachError::DegenerateChain`] if the chain has no usable arm
/// - [`ReachError::Cancelled`] if `cancel` fires before the last voxel
pub fn generate<C, O>(
    chain: &C,
    oracle: &mut O,
    config: &ReachabilityConfig,
    cancel: &CancelToken,
) -> ReachResult<GeneratedMap>
where
    C: KinematicChain + ?Sized,
    O: IkOracle + ?Sized,
{
    let started = Instant::now();
    let plan = GenerationPlan::prepare(chain, config)?;
    let evaluator = plan.evaluator();
    let mut aggregator = plan.aggregator()?;
    let total = plan.volume.inside().len();

    for (done, (flat, point)) in plan.volume.inside_points().enumerate() {
        if cancel.is_cancelled() {
            info!(done, total, "Reachability generation cancelled");
            return Err(ReachError::Cancelled);
        }
        aggregator.add(evaluator.evaluate_voxel(oracle, flat, point))?;
        report_progress(done, total);
    }

    Ok(plan.finish(aggregator.finish(), started))
}

/// Generates a reachability map across rayon's thread pool.
///
/// Each rayon job builds its own oracle with `make_oracle`; an oracle is
/// never shared between threads, but the number of calls depends on how
/// rayon splits the voxels and can exceed the thread count. Construction
/// should be cheap and the oracle must not rely on seeing every voxel.
/// Results are aggregated in voxel order, so the output matches
/// [`generate`] for a deterministic oracle.
///
/// # Errors
///
/// Same as [`generate`].
#[cfg(feature = "parallel")]
pub fn generate_parallel<C, O, F>(
    chain: &C,
    make_oracle: F,
    config: &ReachabilityConfig,
    cancel: &CancelToken,
) -> ReachResult<GeneratedMap>
where
    C: KinematicChain + ?Sized,
    O: IkOracle,
    F: Fn() -> O + Sync + Send,
{
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let started = Instant::now();
    let plan = GenerationPlan::prepare(chain, config)?;
    let evaluator = plan.evaluator();
    let mut aggregator = plan.aggregator()?;

    let inside: Vec<(usize, Point3<f64>)> = plan.volume.inside_points().collect();
    let total = inside.len();
    let done = AtomicUsize::new(0);

    let outcomes: Option<Vec<_>> = inside
        .par_iter()
        .map_init(&make_oracle, |oracle, &(flat, point)| {
            if cancel.is_cancelled() {
                return None;
            }
            let outcome = evaluator.evaluate_voxel(oracle, flat, point);
            report_progress(done.fetch_add(1, Ordering::Relaxed), total);
            Some(outcome)
        })
        .collect();

    let Some(outcomes) = outcomes else {
        info!(
            done = done.load(Ordering::Relaxed),
            total, "Reachability generation cancelled"
        );
        return Err(ReachError::Cancelled);
    };
    for outcome in outcomes {
        aggregator.add(outcome)?;
    }

    Ok(plan.finish(aggregator.finish(), started))
}
