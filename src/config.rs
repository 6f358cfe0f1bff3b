//! Parameters shared by the end-effector node sets.

use serde::{Deserialize, Serialize};

use crate::error::{NodeError, Result};

/// Default number of motion segments in each swing phase.
pub const DEFAULT_POLYS_PER_SWING_PHASE: usize = 2;
/// Default number of force segments in each stance phase.
pub const DEFAULT_POLYS_PER_STANCE_PHASE: usize = 3;
/// Default bound on the magnitude of a contact force component.
pub const DEFAULT_MAX_FORCE: f64 = 10_000.0;
/// Default tolerance for query times past the end of the trajectory.
pub const DEFAULT_TIME_TOLERANCE: f64 = 1e-6;

/// Configuration for end-effector motion and force node sets.
///
/// # Example
///
/// ```
/// use phase_nodes_rs::NodeParams;
///
/// let params = NodeParams::default()
///     .with_polys_per_swing_phase(3)
///     .with_max_force(2000.0);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParams {
    /// Motion segments per swing phase (stance collapses to one segment).
    pub polys_per_swing_phase: usize,
    /// Force segments per stance phase (swing collapses to one segment).
    pub polys_per_stance_phase: usize,
    /// Largest force magnitude allowed per component.
    pub max_force: f64,
    /// How far past the total duration a query may land and still be
    /// evaluated on the last segment.
    pub time_tolerance: f64,
}

impl Default for NodeParams {
    fn default() -> Self {
        Self {
            polys_per_swing_phase: DEFAULT_POLYS_PER_SWING_PHASE,
            polys_per_stance_phase: DEFAULT_POLYS_PER_STANCE_PHASE,
            max_force: DEFAULT_MAX_FORCE,
            time_tolerance: DEFAULT_TIME_TOLERANCE,
        }
    }
}

impl NodeParams {
    /// Sets the number of motion segments per swing phase.
    #[must_use]
    pub const fn with_polys_per_swing_phase(mut self, n: usize) -> Self {
        self.polys_per_swing_phase = n;
        self
    }

    /// Sets the number of force segments per stance phase.
    #[must_use]
    pub const fn with_polys_per_stance_phase(mut self, n: usize) -> Self {
        self.polys_per_stance_phase = n;
        self
    }

    /// Sets the maximum force magnitude.
    #[must_use]
    pub const fn with_max_force(mut self, max_force: f64) -> Self {
        self.max_force = max_force;
        self
    }

    /// Sets the end-of-trajectory time tolerance.
    #[must_use]
    pub const fn with_time_tolerance(mut self, tol: f64) -> Self {
        self.time_tolerance = tol;
        self
    }

    /// Checks that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if self.polys_per_swing_phase == 0 {
            return Err(NodeError::invalid_config(
                "polys_per_swing_phase must be at least 1",
            ));
        }
        if self.polys_per_stance_phase == 0 {
            return Err(NodeError::invalid_config(
                "polys_per_stance_phase must be at least 1",
            ));
        }
        if !(self.max_force.is_finite() && self.max_force > 0.0) {
            return Err(NodeError::invalid_config(format!(
                "max_force must be positive and finite, got {}",
                self.max_force
            )));
        }
        if !(self.time_tolerance.is_finite() && self.time_tolerance >= 0.0) {
            return Err(NodeError::invalid_config(format!(
                "time_tolerance must be non-negative and finite, got {}",
                self.time_tolerance
            )));
        }
        Ok(())
    }

    /// Parses and validates parameters from JSON. Missing fields take
    /// their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| NodeError::invalid_config(format!("failed to parse node params: {e}")))?;
        params.validate()?;
        Ok(params)
    }
}
