//! Persistence of generated maps.
//!
//! A [`ModelStore`] keeps one [`ReachabilityRecord`] per [`CacheKey`]. The key
//! embeds the robot's structure hash, so editing the robot orphans old maps
//! instead of silently reusing them. A record whose version differs from
//! [`RECORD_VERSION`] is treated as missing.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nalgebra::Point3;
use reach_types::{PoseScale, ReachError, ReachResult, ReachabilityStats, VoxelField};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chain::KinematicChain;

/// Version written into every record; bump when the layout changes.
pub const RECORD_VERSION: u32 = 1;

/// Everything needed to restore a generated map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachabilityRecord {
    /// Layout version, compared against [`RECORD_VERSION`] on load.
    pub version: u32,
    /// Feasible poses in the manipulator base frame.
    pub stats: ReachabilityStats,
    /// Density field.
    pub density: VoxelField,
    /// Reachability field.
    pub reachability: VoxelField,
    /// Lattice point/index mapping.
    pub scale: PoseScale,
    /// Lattice center in the base frame.
    pub base_anchor: Point3<f64>,
    /// Lattice spacing.
    pub xyz_delta: f64,
    /// Realized rotation spacing.
    pub quat_delta: f64,
}

impl ReachabilityRecord {
    /// Returns `true` if both fields are well formed and share one shape.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let side = self.density.side();
        let grid_ok = is_cube(&self.density)
            && is_cube(&self.reachability)
            && self.reachability.side() == side
            && side % 2 == 1;

        #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
        let scale_ok = grid_ok
            && self.scale.offset == ((side - 1) / 2) as f64
            && self.scale.scale > 0.0
            && self.scale.scale.is_finite()
            && self.xyz_delta > 0.0
            && (self.scale.delta() - self.xyz_delta).abs() <= 1e-9 * self.xyz_delta;

        scale_ok
            && self.quat_delta >= 0.0
            && self.quat_delta.is_finite()
            && self.base_anchor.coords.iter().all(|v| v.is_finite())
            && in_unit_range(&self.density)
            && in_unit_range(&self.reachability)
            && self.stats.poses().all(|pose| {
                (pose.rotation.coords.norm() - 1.0).abs() < 1e-9
                    && pose.position.coords.iter().all(|v| v.is_finite())
            })
    }
}

fn is_cube(field: &VoxelField) -> bool {
    let side = field.side();
    side.checked_mul(side).and_then(|sq| sq.checked_mul(side)) == Some(field.values().len())
}

fn in_unit_range(field: &VoxelField) -> bool {
    field.values().iter().all(|v| (0.0..=1.0).contains(v))
}

/// Identifier of a stored map: `reachability.<structure hash>.<manipulator>`.
///
/// Both components are percent-encoded: every byte outside `[A-Za-z0-9_-]`
/// becomes `%XX`. The key is always usable as a file name, and distinct
/// `(hash, manipulator)` pairs never share a key.
///
/// # Example
///
/// ```
/// use reach_model::CacheKey;
///
/// let key = CacheKey::new("9f2c", "left arm/tool");
/// assert_eq!(key.as_str(), "reachability.9f2c.left%20arm%2Ftool");
/// assert_ne!(key, CacheKey::new("9f2c", "left_arm_tool"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds a key from a structure hash and manipulator name.
    #[must_use]
    pub fn new(structure_hash: &str, manipulator: &str) -> Self {
        let mut key = String::from("reachability.");
        encode_component(&mut key, structure_hash);
        key.push('.');
        encode_component(&mut key, manipulator);
        Self(key)
    }

    /// Builds the key for a chain.
    #[must_use]
    pub fn for_chain<C: KinematicChain + ?Sized>(chain: &C) -> Self {
        Self::new(&chain.structure_hash(), &chain.manipulator_name())
    }

    /// The key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage backend for generated maps.
pub trait ModelStore {
    /// Loads the record for `key`.
    ///
    /// Returns `None` if it is missing, unreadable, or of another version;
    /// failures are logged rather than returned.
    fn load(&self, key: &CacheKey) -> Option<ReachabilityRecord>;

    /// Stores `record` under `key`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Backend-specific I/O or encoding failures.
    fn save(&self, key: &CacheKey, record: &ReachabilityRecord) -> ReachResult<()>;
}

/// Stores each record as `<key>.json` in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the records.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path used for `key`.
    #[must_use]
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl ModelStore for JsonFileStore {
    fn load(&self, key: &CacheKey) -> Option<ReachabilityRecord> {
        let path = self.path_for(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stored reachability map");
                return None;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read reachability map");
                return None;
            }
        };

        let record: ReachabilityRecord = match serde_json::from_str(&text) {
            Ok(record) => record,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding corrupt reachability map");
                return None;
            }
        };
        if record.version != RECORD_VERSION {
            warn!(
                path = %path.display(),
                found = record.version,
                expected = RECORD_VERSION,
                "Discarding reachability map of another version"
            );
            return None;
        }
        if !record.is_consistent() {
            warn!(path = %path.display(), "Discarding reachability map with mismatched fields");
            return None;
        }

        Some(record)
    }

    fn save(&self, key: &CacheKey, record: &ReachabilityRecord) -> ReachResult<()> {
        fs::create_dir_all(&self.root)?;
        let json =
            serde_json::to_string(record).map_err(|e| ReachError::Serialization(e.to_string()))?;

        // Write then rename so readers never see a partial file
        let path = self.path_for(key);
        let partial = path.with_extension("json.partial");
        fs::write(&partial, json)?;
        fs::rename(&partial, &path)?;

        debug!(path = %path.display(), records = record.stats.len(), "Saved reachability map");
        Ok(())
    }
}

fn encode_component(out: &mut String, component: &str) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for byte in component.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-') {
            out.push(char::from(byte));
        } else {
            out.push('%');
            out.push(char::from(HEX[usize::from(byte >> 4)]));
            out.push(char::from(HEX[usize::from(byte & 0x0F)]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use nalgebra::{Quaternion, UnitQuaternion};
    use reach_types::{Pose, PoseRecord};

    fn sample_record() -> ReachabilityRecord {
        let mut density = VoxelField::zeros(3);
        density.values_mut()[13] = 0.5;
        ReachabilityRecord {
            version: RECORD_VERSION,
            stats: [PoseRecord::new(Pose::identity(), 2)].into_iter().collect(),
            reachability: density.clone(),
            density,
            scale: PoseScale::from_delta(0.05, 1),
            base_anchor: Point3::new(0.0, 0.0, 0.1),
            xyz_delta: 0.05,
            quat_delta: 0.4,
        }
    }

    #[test]
    fn test_key_escapes_file_name_characters() {
        let key = CacheKey::new("a/b c", "arm:1");
        assert_eq!(key.as_str(), "reachability.a%2Fb%20c.arm%3A1");
        assert_eq!(key.to_string(), key.as_str());

        let key = CacheKey::new("ab12", "bras-gauche_é");
        assert_eq!(key.as_str(), "reachability.ab12.bras-gauche_%C3%A9");
    }

    #[test]
    fn test_distinct_components_give_distinct_keys() {
        let pairs = [
            ("ab12", "left arm"),
            ("ab12", "left_arm"),
            ("ab12", "left%20arm"),
            ("ab12.left", "arm"),
            ("ab12", "left.arm"),
            ("ab12", "left/arm"),
            ("", "ab12.left.arm"),
            ("ab12.left.arm", ""),
        ];
        let keys: HashSet<CacheKey> = pairs.iter().map(|(h, m)| CacheKey::new(h, m)).collect();
        assert_eq!(keys.len(), pairs.len());

        // Separate keys land in separate files
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let spaced = CacheKey::new("ab12", "left arm");
        let underscored = CacheKey::new("ab12", "left_arm");
        store.save(&spaced, &sample_record()).unwrap();
        assert_ne!(store.path_for(&spaced), store.path_for(&underscored));
        assert!(store.load(&underscored).is_none());
        assert!(store.load(&spaced).is_some());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("maps"));
        let key = CacheKey::new("h", "arm");
        let record = sample_record();

        store.save(&key, &record).unwrap();
        assert!(store.path_for(&key).exists());
        assert_eq!(store.load(&key), Some(record));
    }

    #[test]
    fn test_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load(&CacheKey::new("h", "arm")).is_none());
    }

    #[test]
    fn test_version_mismatch_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let key = CacheKey::new("h", "arm");
        let mut record = sample_record();
        record.version = RECORD_VERSION + 1;

        store.save(&key, &record).unwrap();
        assert!(store.load(&key).is_none());
    }

    #[test]
    fn test_corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let key = CacheKey::new("h", "arm");
        fs::write(store.path_for(&key), "{ not json").unwrap();
        assert!(store.load(&key).is_none());
    }

    #[test]
    fn test_mismatched_fields_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let key = CacheKey::new("h", "arm");
        let mut record = sample_record();
        record.reachability = VoxelField::zeros(2);

        store.save(&key, &record).unwrap();
        assert!(store.load(&key).is_none());
    }

    #[test]
    fn test_sample_record_is_consistent() {
        assert!(sample_record().is_consistent());
    }

    #[test]
    fn test_offset_must_center_the_grid() {
        let mut record = sample_record();
        record.scale.offset = 0.0;
        assert!(!record.is_consistent());

        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let key = CacheKey::new("h", "arm");
        store.save(&key, &record).unwrap();
        assert!(store.load(&key).is_none());
    }

    #[test]
    fn test_spacing_must_match_scale() {
        let mut record = sample_record();
        record.xyz_delta = 0.1;
        assert!(!record.is_consistent());
    }

    #[test]
    fn test_even_side_is_rejected() {
        let mut record = sample_record();
        record.density = VoxelField::zeros(4);
        record.reachability = VoxelField::zeros(4);
        record.scale = PoseScale::from_delta(0.05, 1);
        assert!(!record.is_consistent());
    }

    #[test]
    fn test_non_unit_quaternion_is_rejected() {
        let mut record = sample_record();
        let skewed = Pose::from_position_rotation(
            Point3::origin(),
            UnitQuaternion::new_unchecked(Quaternion::new(2.0, 0.0, 0.0, 0.0)),
        );
        record.stats = [PoseRecord::new(skewed, 1)].into_iter().collect();
        assert!(!record.is_consistent());

        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let key = CacheKey::new("h", "arm");
        store.save(&key, &record).unwrap();
        assert!(store.load(&key).is_none());
    }

    #[test]
    fn test_density_out_of_range_is_rejected() {
        let mut record = sample_record();
        record.density.values_mut()[0] = 1.5;
        assert!(!record.is_consistent());
    }
}
