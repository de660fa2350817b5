//! Build-on-first-use holder for search indices.

use reach_types::{ReachError, ReachResult};

/// An index that is built on first query and dropped when the data changes.
///
/// # Example
///
/// ```
/// use reach_index::{LazyIndex, PoseSearch, TranslationIndex};
/// use reach_types::Pose;
///
/// let poses = [Pose::identity()];
/// let mut lazy = LazyIndex::new();
/// assert!(!lazy.is_built());
///
/// let index = lazy.get_or_try_build(|| TranslationIndex::from_poses(&poses)).unwrap();
/// assert_eq!(index.len(), 1);
/// assert!(lazy.is_built());
///
/// lazy.invalidate();
/// assert!(lazy.get().is_none());
/// ```
#[derive(Debug, Clone)]
pub enum LazyIndex<T> {
    /// Not built yet, or invalidated.
    NotBuilt,
    /// Ready for queries.
    Built(T),
}

impl<T> Default for LazyIndex<T> {
    fn default() -> Self {
        Self::NotBuilt
    }
}

impl<T> LazyIndex<T> {
    /// Creates an unbuilt holder.
    #[must_use]
    pub const fn new() -> Self {
        Self::NotBuilt
    }

    /// Returns the built index, running `build` first if needed.
    ///
    /// A failed build leaves the holder unbuilt.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `build`.
    pub fn get_or_try_build<F>(&mut self, build: F) -> ReachResult<&T>
    where
        F: FnOnce() -> ReachResult<T>,
    {
        if matches!(self, Self::NotBuilt) {
            *self = Self::Built(build()?);
        }
        match self {
            Self::Built(index) => Ok(index),
            Self::NotBuilt => Err(ReachError::NoData),
        }
    }

    /// The index, if built.
    #[must_use]
    pub const fn get(&self) -> Option<&T> {
        match self {
            Self::Built(index) => Some(index),
            Self::NotBuilt => None,
        }
    }

    /// Returns `true` once the index has been built.
    #[must_use]
    pub const fn is_built(&self) -> bool {
        matches!(self, Self::Built(_))
    }

    /// Drops the built index so the next query rebuilds it.
    pub fn invalidate(&mut self) {
        *self = Self::NotBuilt;
    }
}
