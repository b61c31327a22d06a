//! Packing configuration.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Per-attempt configuration of the encoder and the solve budget.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_floorplan::model::PackingConfig;
///
/// let config = PackingConfig::default()
///     .with_rotation(true)
///     .with_symmetry_breaking(true)
///     .with_time_budget(Duration::from_secs(60));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PackingConfig {
    /// Allow 90° rotation of circuits.
    pub allow_rotation: bool,

    /// Add the largest-pair symmetry-breaking constraints.
    pub symmetry_breaking: bool,

    /// Add the redundant cumulative constraint along the vertical axis.
    pub cumulative: bool,

    /// Wall-clock budget separating "solved" from "timed out".
    pub time_budget: Duration,

    /// Extra time granted to the backend on top of `time_budget`.
    ///
    /// Results that arrive inside the margin are kept but classified as
    /// timed out.
    pub overrun_margin: Duration,
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            allow_rotation: false,
            symmetry_breaking: false,
            cumulative: true,
            time_budget: Duration::from_secs(300),
            overrun_margin: Duration::from_secs(1),
        }
    }
}

impl PackingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rotation(mut self, allow: bool) -> Self {
        self.allow_rotation = allow;
        self
    }

    pub fn with_symmetry_breaking(mut self, enable: bool) -> Self {
        self.symmetry_breaking = enable;
        self
    }

    pub fn with_cumulative(mut self, enable: bool) -> Self {
        self.cumulative = enable;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_overrun_margin(mut self, margin: Duration) -> Self {
        self.overrun_margin = margin;
        self
    }

    /// Total time the backend may run.
    pub fn solver_time_limit(&self) -> Duration {
        self.time_budget.saturating_add(self.overrun_margin)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.time_budget.is_zero() {
            return Err(InputError::InvalidConfig(
                "time_budget must be positive".into(),
            ));
        }
        Ok(())
    }
}
