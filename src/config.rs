//! Configuration for gradient checks
//!
//! This module provides the configuration structure used by
//! [`GradientChecker`](crate::checker::GradientChecker), loaded from JSON files.

use crate::compare::DEFAULT_TOLERANCE;
use crate::error::{GradCheckError, Result};
use crate::numerical::DEFAULT_EPSILON;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings for a gradient check.
///
/// Every field is optional in the JSON file and falls back to its default:
///
/// - **epsilon**: finite-difference step (default 1e-5)
/// - **tolerance**: relative error below which the check passes (default 1e-7)
/// - **report_top**: how many worst coordinates to print when a check fails (default 5)
///
/// # Example
///
/// ```json
/// {
///   "epsilon": 1e-5,
///   "tolerance": 1e-7,
///   "report_top": 5
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradCheckConfig {
    /// Perturbation applied to each parameter entry
    pub epsilon: f64,

    /// Pass threshold for the relative error
    pub tolerance: f64,

    /// Number of largest discrepancies printed on failure (0 disables)
    pub report_top: usize,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            tolerance: DEFAULT_TOLERANCE,
            report_top: 5,
        }
    }
}

impl GradCheckConfig {
    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(contents: &str) -> Result<Self> {
        let config: GradCheckConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(GradCheckError::InvalidConfig(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(GradCheckError::InvalidConfig(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Loads a gradient-check configuration from a JSON file.
///
/// # Returns
///
/// `Ok(GradCheckConfig)` on success, or an error if the file cannot be read,
/// the JSON is invalid, or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use grad_check::config::load_config;
///
/// let cfg = load_config("config/gradcheck_default.json").unwrap();
/// assert_eq!(cfg.tolerance, 1e-7);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<GradCheckConfig> {
    let contents = fs::read_to_string(path)?;
    GradCheckConfig::from_json(&contents)
}
