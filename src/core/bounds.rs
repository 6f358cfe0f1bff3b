//! Box bounds on single optimization variables.

/// A closed interval `[lower, upper]` a variable must stay in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

/// Unconstrained variable.
pub const NO_BOUND: Bound = Bound::new(f64::NEG_INFINITY, f64::INFINITY);
/// Variable pinned to zero.
pub const EQUALITY_BOUND: Bound = Bound::new(0.0, 0.0);

impl Bound {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Symmetric interval `[-limit, limit]`.
    pub fn symmetric(limit: f64) -> Self {
        Self::new(-limit, limit)
    }

    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower == f64::NEG_INFINITY && self.upper == f64::INFINITY
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}
