//! Error types for reachability operations.
//!
//! This module defines the [`ReachError`] enum shared by the sampling,
//! indexing, and model-generation crates.

/// Errors that can occur while generating or querying a reachability model.
///
/// An IK oracle that finds no solution is *not* an error: it is the negative
/// signal that drives density and reachability toward zero.
///
/// # Example
///
/// ```
/// use reach_types::ReachError;
///
/// let error = ReachError::invalid_config("xyz_delta must be positive");
/// assert!(error.to_string().contains("xyz_delta"));
/// assert!(ReachError::NoData.is_no_data());
/// ```
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReachError {
    /// An invalid configuration parameter was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The kinematic chain cannot support generation (no arm joints, or an
    /// arm of zero length).
    #[error("degenerate kinematic chain: {0}")]
    DegenerateChain(String),

    /// A nearest-neighbor structure was queried or built without any poses.
    #[error("no reachability data available")]
    NoData,

    /// A query carried invalid parameters (zero `k`, negative radius, ...).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Generation was cancelled through its cancel token.
    #[error("generation cancelled")]
    Cancelled,

    /// An I/O error from a persistence backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ReachError {
    /// Creates an invalid configuration error with the given message.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Creates a degenerate chain error with the given message.
    #[must_use]
    pub fn degenerate_chain(message: impl Into<String>) -> Self {
        Self::DegenerateChain(message.into())
    }

    /// Creates an invalid query error with the given message.
    #[must_use]
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Returns `true` if this is a "no data" error.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// Returns `true` if generation was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result alias used across the reachability crates.
pub type ReachResult<T> = Result<T, ReachError>;
