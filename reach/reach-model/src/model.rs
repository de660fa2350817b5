//! The reachability model: generated maps plus their lazily built indices.

use nalgebra::Point3;
use reach_index::{LazyIndex, PoseIndex, PoseSearch, TranslationIndex};
use reach_types::{
    PoseScale, ReachError, ReachResult, ReachabilityConfig, ReachabilityStats, VoxelField,
};
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::chain::KinematicChain;
use crate::generate::{GeneratedMap, GenerationSummary, generate};
use crate::oracle::IkOracle;
use crate::store::{CacheKey, ModelStore, RECORD_VERSION, ReachabilityRecord};

/// Kinematic reachability of one manipulator.
///
/// Holds the feasible-pose records, the density and reachability fields, and
/// the indices built over the records on first query. Records are replaced
/// only by generating or loading, and either one drops the indices.
///
/// # Example
///
/// ```
/// use reach_model::{CancelToken, IkOracle, JointSolution, KinematicChain, ReachabilityModel};
/// use reach_types::ReachabilityConfig;
/// use nalgebra::{Isometry3, Point3};
///
/// struct Arm;
///
/// impl KinematicChain for Arm {
///     fn arm_joint_anchors(&self) -> Vec<Point3<f64>> {
///         vec![Point3::origin()]
///     }
///     fn base_transform(&self) -> Isometry3<f64> {
///         Isometry3::identity()
///     }
///     fn end_effector_transform(&self) -> Isometry3<f64> {
///         Isometry3::translation(0.2, 0.0, 0.0)
///     }
///     fn structure_hash(&self) -> String {
///         "0a1b".into()
///     }
///     fn manipulator_name(&self) -> String {
///         "arm".into()
///     }
/// }
///
/// /// Reaches everything within 0.15 of the shoulder.
/// struct Reach;
///
/// impl IkOracle for Reach {
///     fn find_all_solutions(&mut self, target: &Isometry3<f64>, _: bool) -> Vec<JointSolution> {
///         if target.translation.vector.norm() < 0.15 { vec![vec![0.0]] } else { Vec::new() }
///     }
/// }
///
/// let config = ReachabilityConfig::new()
///     .with_xyz_delta(0.05)
///     .with_translation_only(true);
/// let mut model = ReachabilityModel::new(&Arm, config);
/// assert!(!model.has());
///
/// model.generate(&Arm, &mut Reach, &CancelToken::new()).unwrap();
/// assert!(model.has());
/// assert_eq!(model.reachability_at(&Point3::origin()), Some(1.0));
/// assert_eq!(model.reachability_at(&Point3::new(0.2, 0.0, 0.0)), Some(0.0));
/// ```
#[derive(Debug)]
pub struct ReachabilityModel {
    key: CacheKey,
    config: ReachabilityConfig,
    stats: ReachabilityStats,
    density: VoxelField,
    reachability: VoxelField,
    scale: PoseScale,
    base_anchor: Point3<f64>,
    xyz_delta: f64,
    quat_delta: f64,
    pose_index: LazyIndex<PoseIndex>,
    translation_index: LazyIndex<TranslationIndex>,
}

impl ReachabilityModel {
    /// Creates an empty model for a chain.
    #[must_use]
    pub fn new<C: KinematicChain + ?Sized>(chain: &C, config: ReachabilityConfig) -> Self {
        Self {
            key: CacheKey::for_chain(chain),
            config,
            stats: ReachabilityStats::new(),
            density: VoxelField::zeros(0),
            reachability: VoxelField::zeros(0),
            scale: PoseScale::from_delta(config.xyz_delta(), 0),
            base_anchor: Point3::origin(),
            xyz_delta: config.xyz_delta(),
            quat_delta: 0.0,
            pose_index: LazyIndex::new(),
            translation_index: LazyIndex::new(),
        }
    }

    /// Returns `true` once a map has been generated or loaded.
    #[must_use]
    pub fn has(&self) -> bool {
        !self.density.is_empty()
    }

    /// Key under which the model is stored.
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Generation settings.
    #[must_use]
    pub const fn config(&self) -> &ReachabilityConfig {
        &self.config
    }

    /// Feasible poses, in the manipulator base frame.
    #[must_use]
    pub const fn stats(&self) -> &ReachabilityStats {
        &self.stats
    }

    /// Density field.
    #[must_use]
    pub const fn density(&self) -> &VoxelField {
        &self.density
    }

    /// Reachability field.
    #[must_use]
    pub const fn reachability(&self) -> &VoxelField {
        &self.reachability
    }

    /// Lattice point/index mapping, relative to [`Self::base_anchor`].
    #[must_use]
    pub const fn scale(&self) -> PoseScale {
        self.scale
    }

    /// Lattice center (first arm joint) in the base frame.
    #[must_use]
    pub const fn base_anchor(&self) -> Point3<f64> {
        self.base_anchor
    }

    /// Lattice spacing of the current map.
    #[must_use]
    pub const fn xyz_delta(&self) -> f64 {
        self.xyz_delta
    }

    /// Realized rotation spacing of the current map.
    #[must_use]
    pub const fn quat_delta(&self) -> f64 {
        self.quat_delta
    }

    /// Density at a base-frame point, or `None` outside the sampled cube.
    #[must_use]
    pub fn density_at(&self, point: &Point3<f64>) -> Option<f64> {
        self.density.get(self.grid_index_of(point))
    }

    /// Reachability at a base-frame point, or `None` outside the sampled cube.
    #[must_use]
    pub fn reachability_at(&self, point: &Point3<f64>) -> Option<f64> {
        self.reachability.get(self.grid_index_of(point))
    }

    /// Highest reachability in the map, zero when empty.
    #[must_use]
    pub fn max_reachability(&self) -> f64 {
        self.reachability.max_value()
    }

    fn grid_index_of(&self, point: &Point3<f64>) -> reach_types::GridIndex {
        let local = Point3::from(point - self.base_anchor);
        self.scale.point_to_index(&local)
    }

    /// Generates the map on the calling thread, replacing the current one.
    ///
    /// # Errors
    ///
    /// See [`generate`](crate::generate()).
    pub fn generate<C, O>(
        &mut self,
        chain: &C,
        oracle: &mut O,
        cancel: &CancelToken,
    ) -> ReachResult<GenerationSummary>
    where
        C: KinematicChain + ?Sized,
        O: IkOracle + ?Sized,
    {
        let map = generate(chain, oracle, &self.config, cancel)?;
        Ok(self.install(map))
    }

    /// Generates the map across rayon's pool, replacing the current one.
    ///
    /// # Errors
    ///
    /// See [`generate_parallel`](crate::generate_parallel).
    #[cfg(feature = "parallel")]
    pub fn generate_parallel<C, O, F>(
        &mut self,
        chain: &C,
        make_oracle: F,
        cancel: &CancelToken,
    ) -> ReachResult<GenerationSummary>
    where
        C: KinematicChain + ?Sized,
        O: IkOracle,
        F: Fn() -> O + Sync + Send,
    {
        let map = crate::generate::generate_parallel(chain, make_oracle, &self.config, cancel)?;
        Ok(self.install(map))
    }

    fn install(&mut self, map: GeneratedMap) -> GenerationSummary {
        self.stats = map.stats;
        self.density = map.density;
        self.reachability = map.reachability;
        self.scale = map.scale;
        self.base_anchor = map.base_anchor;
        self.xyz_delta = map.xyz_delta;
        self.quat_delta = map.quat_delta;
        self.invalidate_indices();
        map.summary
    }

    /// Snapshot of the map for persistence.
    #[must_use]
    pub fn to_record(&self) -> ReachabilityRecord {
        ReachabilityRecord {
            version: RECORD_VERSION,
            stats: self.stats.clone(),
            density: self.density.clone(),
            reachability: self.reachability.clone(),
            scale: self.scale,
            base_anchor: self.base_anchor,
            xyz_delta: self.xyz_delta,
            quat_delta: self.quat_delta,
        }
    }

    /// Replaces the map with a stored one. Returns `false` if the store has
    /// no usable record, leaving the model unchanged.
    pub fn load<S: ModelStore + ?Sized>(&mut self, store: &S) -> bool {
        let Some(record) = store.load(&self.key) else {
            return false;
        };
        info!(key = %self.key, records = record.stats.len(), "Loaded reachability map");

        self.stats = record.stats;
        self.density = record.density;
        self.reachability = record.reachability;
        self.scale = record.scale;
        self.base_anchor = record.base_anchor;
        self.xyz_delta = record.xyz_delta;
        self.quat_delta = record.quat_delta;
        self.invalidate_indices();
        true
    }

    /// Writes the map to a store.
    ///
    /// # Errors
    ///
    /// [`ReachError::NoData`] if nothing has been generated or loaded, or
    /// the store's own error.
    pub fn save<S: ModelStore + ?Sized>(&self, store: &S) -> ReachResult<()> {
        if !self.has() {
            return Err(ReachError::NoData);
        }
        store.save(&self.key, &self.to_record())
    }

    /// Loads the stored map, or generates and saves one on a miss.
    ///
    /// Returns `true` if the map came from the store.
    ///
    /// # Errors
    ///
    /// Generation or save failures.
    pub fn load_or_generate<C, O, S>(
        &mut self,
        chain: &C,
        oracle: &mut O,
        store: &S,
        cancel: &CancelToken,
    ) -> ReachResult<bool>
    where
        C: KinematicChain + ?Sized,
        O: IkOracle + ?Sized,
        S: ModelStore + ?Sized,
    {
        if self.load(store) {
            return Ok(true);
        }
        info!(key = %self.key, "No stored reachability map, generating");
        self.generate(chain, oracle, cancel)?;
        self.save(store)?;
        Ok(false)
    }

    /// The index for neighbor queries, built on first use.
    ///
    /// `translation_only` selects the 3D position index; otherwise the
    /// weighted 6D pose index is used.
    ///
    /// # Errors
    ///
    /// [`ReachError::NoData`] if the model has no feasible poses.
    pub fn nearest_neighbors(&mut self, translation_only: bool) -> ReachResult<&dyn PoseSearch> {
        let stats = &self.stats;
        let index: &dyn PoseSearch = if translation_only {
            self.translation_index
                .get_or_try_build(|| TranslationIndex::build(stats))?
        } else {
            let weight = self.config.translation_weight();
            self.pose_index
                .get_or_try_build(|| PoseIndex::build(stats, weight))?
        };
        Ok(index)
    }

    /// Drops both indices; the next query rebuilds them.
    pub fn invalidate_indices(&mut self) {
        if self.pose_index.is_built() || self.translation_index.is_built() {
            debug!(key = %self.key, "Dropping reachability indices");
        }
        self.pose_index.invalidate();
        self.translation_index.invalidate();
    }

    /// Rebuilds both indices immediately.
    ///
    /// # Errors
    ///
    /// [`ReachError::NoData`] if the model has no feasible poses.
    pub fn rebuild_indices(&mut self) -> ReachResult<()> {
        self.invalidate_indices();
        self.nearest_neighbors(true)?;
        self.nearest_neighbors(false)?;
        Ok(())
    }
}
