//! k-d tree storage that tolerates repeated points and repeated axis values.
//!
//! Reachability data is highly regular: every rotation sampled at a voxel
//! shares that voxel's position, and every voxel shares the rotation set.
//! kiddo's tree build cannot split a node whose entries all share one value
//! on the split axis, so the raw data is never handed to it directly:
//!
//! - identical points are stored once, and each stored point owns the run of
//!   input entries at that location
//! - points are reflected through a fixed hyperplane whose normal has
//!   rationally independent components, which preserves distances but leaves
//!   no two lattice points with a shared coordinate

use std::collections::HashMap;

use kiddo::{ImmutableKdTree, SquaredEuclidean};

/// Squares of the reflection normal's components.
const NORMAL_SQUARES: [f64; 7] = [2.0, 3.0, 5.0, 7.0, 11.0, 13.0, 17.0];

/// Householder reflection `x - 2 (u.x / u.u) u`.
#[derive(Debug, Clone, Copy)]
struct Reflection<const K: usize> {
    normal: [f64; K],
    factor: f64,
}

impl<const K: usize> Reflection<K> {
    fn new() -> Self {
        let normal: [f64; K] =
            std::array::from_fn(|i| NORMAL_SQUARES[i % NORMAL_SQUARES.len()].sqrt());
        let norm_sq: f64 = normal.iter().map(|v| v * v).sum();
        Self {
            normal,
            factor: 2.0 / norm_sq,
        }
    }

    fn apply(&self, point: &[f64; K]) -> [f64; K] {
        let dot: f64 = point.iter().zip(&self.normal).map(|(a, b)| a * b).sum();
        let shift = dot * self.factor;
        std::array::from_fn(|i| point[i] - shift * self.normal[i])
    }
}

/// Exact nearest-neighbor search over entries that may repeat.
///
/// Entries are addressed by their position in the slice the tree was built
/// from. Hits at equal distance come back in entry order.
pub(crate) struct PointTree<const K: usize> {
    tree: ImmutableKdTree<f64, K>,
    reflection: Reflection<K>,
    members: Vec<Vec<usize>>,
}

impl<const K: usize> PointTree<K> {
    /// Builds the tree. Returns `None` for an empty slice.
    pub(crate) fn new(entries: &[[f64; K]]) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }

        let reflection = Reflection::new();
        let mut slots: HashMap<[u64; K], usize> = HashMap::with_capacity(entries.len());
        let mut points = Vec::new();
        let mut members: Vec<Vec<usize>> = Vec::new();

        for (entry, point) in entries.iter().enumerate() {
            // Adding zero folds -0.0 onto 0.0
            let key = point.map(|v| (v + 0.0).to_bits());
            let slot = *slots.entry(key).or_insert_with(|| {
                points.push(reflection.apply(point));
                members.push(Vec::new());
                points.len() - 1
            });
            members[slot].push(entry);
        }

        Some(Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            reflection,
            members,
        })
    }

    /// Number of distinct points.
    pub(crate) fn num_points(&self) -> usize {
        self.members.len()
    }

    /// Entries nearest to `query` as `(entry, distance_sq)`, nearest first.
    ///
    /// Whole runs of repeated entries are returned, so the result covers at
    /// least `min_entries` entries (or every entry when there are fewer) and
    /// may exceed it.
    pub(crate) fn nearest(&self, query: &[f64; K], min_entries: usize) -> Vec<(usize, f64)> {
        // Each point owns at least one entry
        let qty = min_entries.min(self.members.len());
        let hits = self
            .tree
            .nearest_n::<SquaredEuclidean>(&self.reflection.apply(query), qty);

        let mut found = Vec::with_capacity(qty);
        for hit in hits {
            if found.len() >= min_entries {
                break;
            }
            #[allow(clippy::cast_possible_truncation)]
            let slot = hit.item as usize;
            found.extend(self.members[slot].iter().map(|&entry| (entry, hit.distance)));
        }
        found
    }

    /// Every entry within `radius_sq` of `query`, nearest first.
    pub(crate) fn within(&self, query: &[f64; K], radius_sq: f64) -> Vec<(usize, f64)> {
        let hits = self
            .tree
            .within::<SquaredEuclidean>(&self.reflection.apply(query), radius_sq);

        let mut found = Vec::with_capacity(hits.len());
        for hit in hits {
            #[allow(clippy::cast_possible_truncation)]
            let slot = hit.item as usize;
            found.extend(self.members[slot].iter().map(|&entry| (entry, hit.distance)));
        }
        found
    }
}
