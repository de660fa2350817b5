//! Configuration for reachability generation.
//!
//! # Example
//!
//! ```
//! use reach_types::ReachabilityConfig;
//!
//! let config = ReachabilityConfig::default()
//!     .with_xyz_delta(0.03)
//!     .with_quat_delta(0.2)
//!     .with_free_space(false);
//!
//! assert!(config.validate().is_empty());
//! assert!(!config.use_free_space());
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default grid spacing in world units.
pub const DEFAULT_XYZ_DELTA: f64 = 0.04;

/// Default target angular spacing between sampled rotations.
pub const DEFAULT_QUAT_DELTA: f64 = 0.5;

/// Default multiplier applied to translation components in the pose index.
pub const DEFAULT_TRANSLATION_WEIGHT: f64 = 5.0;

/// Settings for generating a reachability model.
///
/// Defaults:
/// - `max_radius`: derived from the arm length plus `xyz_delta`
/// - `xyz_delta`: 0.04
/// - `quat_delta`: 0.5
/// - `translation_only`: false
/// - `use_free_space`: true (count every IK solution)
/// - `use_convex_decomposition`: false
/// - `show_scale`: 1.0
/// - `translation_weight`: 5.0
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReachabilityConfig {
    max_radius: Option<f64>,
    xyz_delta: f64,
    quat_delta: f64,
    translation_only: bool,
    use_free_space: bool,
    use_convex_decomposition: bool,
    show_scale: f64,
    translation_weight: f64,
}

impl ReachabilityConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_radius: None,
            xyz_delta: DEFAULT_XYZ_DELTA,
            quat_delta: DEFAULT_QUAT_DELTA,
            translation_only: false,
            use_free_space: true,
            use_convex_decomposition: false,
            show_scale: 1.0,
            translation_weight: DEFAULT_TRANSLATION_WEIGHT,
        }
    }

    /// Sets an explicit sampling radius around the first arm joint.
    #[must_use]
    pub const fn with_max_radius(mut self, radius: f64) -> Self {
        self.max_radius = Some(radius);
        self
    }

    /// Derive the sampling radius from the arm length.
    #[must_use]
    pub const fn with_derived_radius(mut self) -> Self {
        self.max_radius = None;
        self
    }

    /// Sets the grid spacing.
    #[must_use]
    pub const fn with_xyz_delta(mut self, delta: f64) -> Self {
        self.xyz_delta = delta;
        self
    }

    /// Sets the target rotation spacing.
    #[must_use]
    pub const fn with_quat_delta(mut self, delta: f64) -> Self {
        self.quat_delta = delta;
        self
    }

    /// Sample a single identity rotation per voxel.
    #[must_use]
    pub const fn with_translation_only(mut self, translation_only: bool) -> Self {
        self.translation_only = translation_only;
        self
    }

    /// Count all IK solutions (`true`) or only test for one (`false`).
    #[must_use]
    pub const fn with_free_space(mut self, use_free_space: bool) -> Self {
        self.use_free_space = use_free_space;
        self
    }

    /// Request convex-decomposed collision geometry from the IK backend.
    #[must_use]
    pub const fn with_convex_decomposition(mut self, enabled: bool) -> Self {
        self.use_convex_decomposition = enabled;
        self
    }

    /// Sets the display multiplier for visualizers.
    #[must_use]
    pub const fn with_show_scale(mut self, scale: f64) -> Self {
        self.show_scale = scale;
        self
    }

    /// Sets the translation weight of the 6D pose index.
    #[must_use]
    pub const fn with_translation_weight(mut self, weight: f64) -> Self {
        self.translation_weight = weight;
        self
    }

    /// Explicit sampling radius, if any.
    #[must_use]
    pub const fn max_radius(&self) -> Option<f64> {
        self.max_radius
    }

    /// Grid spacing.
    #[must_use]
    pub const fn xyz_delta(&self) -> f64 {
        self.xyz_delta
    }

    /// Target rotation spacing.
    #[must_use]
    pub const fn quat_delta(&self) -> f64 {
        self.quat_delta
    }

    /// Whether only the identity rotation is sampled.
    #[must_use]
    pub const fn translation_only(&self) -> bool {
        self.translation_only
    }

    /// Whether every IK solution is counted.
    #[must_use]
    pub const fn use_free_space(&self) -> bool {
        self.use_free_space
    }

    /// Whether the IK backend should use convex-decomposed geometry.
    #[must_use]
    pub const fn use_convex_decomposition(&self) -> bool {
        self.use_convex_decomposition
    }

    /// Display multiplier for visualizers.
    #[must_use]
    pub const fn show_scale(&self) -> f64 {
        self.show_scale
    }

    /// Translation weight of the 6D pose index.
    #[must_use]
    pub const fn translation_weight(&self) -> f64 {
        self.translation_weight
    }

    /// Validates the configuration.
    ///
    /// Returns a list of problems; empty if the configuration is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(self.xyz_delta > 0.0 && self.xyz_delta.is_finite()) {
            issues.push(format!("xyz_delta must be positive, got {}", self.xyz_delta));
        }
        if !self.translation_only && !(self.quat_delta > 0.0 && self.quat_delta.is_finite()) {
            issues.push(format!("quat_delta must be positive, got {}", self.quat_delta));
        }
        if let Some(radius) = self.max_radius {
            if !(radius > 0.0 && radius.is_finite()) {
                issues.push(format!("max_radius must be positive, got {radius}"));
            } else if self.xyz_delta > 0.0 && radius < self.xyz_delta {
                issues.push(format!(
                    "max_radius {radius} is smaller than xyz_delta {}",
                    self.xyz_delta
                ));
            }
        }
        if !(self.translation_weight > 0.0 && self.translation_weight.is_finite()) {
            issues.push(format!(
                "translation_weight must be positive, got {}",
                self.translation_weight
            ));
        }
        if !(self.show_scale > 0.0 && self.show_scale.is_finite()) {
            issues.push(format!("show_scale must be positive, got {}", self.show_scale));
        }

        issues
    }
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReachabilityConfig::default();
        assert_eq!(config.max_radius(), None);
        assert!((config.xyz_delta() - 0.04).abs() < 1e-12);
        assert!((config.quat_delta() - 0.5).abs() < 1e-12);
        assert!(!config.translation_only());
        assert!(config.use_free_space());
        assert!(!config.use_convex_decomposition());
        assert!((config.translation_weight() - 5.0).abs() < 1e-12);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_builder() {
        let config = ReachabilityConfig::new()
            .with_max_radius(1.1)
            .with_translation_only(true)
            .with_convex_decomposition(true)
            .with_show_scale(2.0);
        assert_eq!(config.max_radius(), Some(1.1));
        assert!(config.translation_only());
        assert!(config.use_convex_decomposition());
        assert!(config.with_derived_radius().max_radius().is_none());
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let config = ReachabilityConfig::new()
            .with_xyz_delta(0.0)
            .with_quat_delta(-1.0)
            .with_max_radius(f64::NAN)
            .with_translation_weight(0.0);
        let issues = config.validate();
        assert_eq!(issues.len(), 4);
        assert!(issues.iter().any(|i| i.contains("xyz_delta")));
        assert!(issues.iter().any(|i| i.contains("quat_delta")));
        assert!(issues.iter().any(|i| i.contains("max_radius")));
        assert!(issues.iter().any(|i| i.contains("translation_weight")));
    }

    #[test]
    fn test_translation_only_ignores_quat_delta() {
        let config = ReachabilityConfig::new()
            .with_quat_delta(0.0)
            .with_translation_only(true);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_radius_smaller_than_delta() {
        let config = ReachabilityConfig::new().with_max_radius(0.01);
        assert_eq!(config.validate().len(), 1);
    }
}
