//! Feasible-pose records gathered during generation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pose::Pose;

/// One evaluated pose that produced at least one IK solution.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseRecord {
    /// Target pose in the manipulator base frame.
    pub pose: Pose,
    /// Number of IK solutions found (always `>= 1`).
    pub num_solutions: u32,
}

impl PoseRecord {
    /// Creates a new record.
    #[must_use]
    pub const fn new(pose: Pose, num_solutions: u32) -> Self {
        Self {
            pose,
            num_solutions,
        }
    }
}

/// Ordered sequence of feasible-pose records.
///
/// Order follows evaluation: voxel order first, rotation order second.
/// Nearest-neighbor indices always refer to positions in this sequence.
///
/// # Example
///
/// ```
/// use reach_types::{Pose, PoseRecord, ReachabilityStats};
///
/// let mut stats = ReachabilityStats::new();
/// stats.push(PoseRecord::new(Pose::identity(), 2));
/// assert_eq!(stats.len(), 1);
/// assert_eq!(stats.total_solutions(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ReachabilityStats {
    records: Vec<PoseRecord>,
}

impl ReachabilityStats {
    /// Creates an empty sequence.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Appends a record.
    pub fn push(&mut self, record: PoseRecord) {
        self.records.push(record);
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no pose was feasible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PoseRecord> {
        self.records.get(index)
    }

    /// All records in order.
    #[must_use]
    pub fn records(&self) -> &[PoseRecord] {
        &self.records
    }

    /// Iterator over the recorded poses.
    pub fn poses(&self) -> impl ExactSizeIterator<Item = &Pose> {
        self.records.iter().map(|r| &r.pose)
    }

    /// Sum of solution counts over all records.
    #[must_use]
    pub fn total_solutions(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.num_solutions)).sum()
    }
}

impl From<Vec<PoseRecord>> for ReachabilityStats {
    fn from(records: Vec<PoseRecord>) -> Self {
        Self { records }
    }
}

impl FromIterator<PoseRecord> for ReachabilityStats {
    fn from_iter<I: IntoIterator<Item = PoseRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl Extend<PoseRecord> for ReachabilityStats {
    fn extend<I: IntoIterator<Item = PoseRecord>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}
