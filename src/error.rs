//! Error types for node variable sets.

use thiserror::Error;

use crate::core::state::MotionDerivative;

/// Errors raised while building or querying node variable sets.
///
/// Construction errors (empty schedules, bad dimensions, bad configuration)
/// mean the object cannot exist. Query errors mean the caller broke the
/// contract of the call; none of them are recoverable by retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    /// No segments or phases were given.
    #[error("empty schedule: at least one segment is required")]
    EmptySchedule,

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Vector length does not match what the variable set expects.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Length that was provided.
        found: usize,
    },

    /// A node does not carry the requested derivative.
    #[error("node has no {0:?} values")]
    MissingDerivative(MotionDerivative),

    /// Index past the end of a sequence.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Length of the indexed sequence.
        len: usize,
    },

    /// Global time outside of the trajectory.
    #[error("time out of range: {t} not in [0, {total}]")]
    TimeOutOfRange {
        /// The requested global time.
        t: f64,
        /// Total trajectory duration.
        total: f64,
    },

    /// Segment durations were never assigned.
    #[error("segment durations not set")]
    DurationsNotSet,

    /// Non-positive or non-finite duration.
    #[error("invalid duration {duration} at index {index}")]
    InvalidDuration {
        /// Index of the offending duration.
        index: usize,
        /// The offending value.
        duration: f64,
    },

    /// Number of phase durations differs from the number of phases.
    #[error("phase count mismatch: expected {expected}, found {found}")]
    PhaseCountMismatch {
        /// Number of phases in the schedule.
        expected: usize,
        /// Number of durations given.
        found: usize,
    },

    /// A component with this name is already registered.
    #[error("duplicate component: {0}")]
    DuplicateComponent(String),

    /// No component with this name is registered.
    #[error("unknown component: {0}")]
    UnknownComponent(String),
}

impl NodeError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a dimension mismatch error.
    #[must_use]
    pub const fn dimension_mismatch(expected: usize, found: usize) -> Self {
        Self::DimensionMismatch { expected, found }
    }

    /// Creates an index out of range error.
    #[must_use]
    pub const fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Creates a time out of range error.
    #[must_use]
    pub const fn time_out_of_range(t: f64, total: f64) -> Self {
        Self::TimeOutOfRange { t, total }
    }
}

/// Result type for node variable operations.
pub type Result<T> = std::result::Result<T, NodeError>;
