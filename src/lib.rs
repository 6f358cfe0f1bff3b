//! Phase-based cubic Hermite node variables for trajectory optimization.
//!
//! A trajectory is stored as a chain of cubic Hermite segments joined at
//! physical nodes. The node values (position and velocity per dimension) are
//! exposed to a nonlinear solver as a compact optimization vector, where whole
//! constant phases collapse onto one shared block of variables.

pub mod config;
pub mod core;
pub mod error;

pub use crate::config::NodeParams;
pub use crate::core::bounds::{Bound, EQUALITY_BOUND, NO_BOUND};
pub use crate::core::component::{Component, Composite, NodeSpline};
pub use crate::core::ee_nodes::{ee_force_id, ee_motion_id, EEForcesNodes, EEMotionNodes};
pub use crate::core::hermite::CubicHermitePoly;
pub use crate::core::jacobian::{jacobian_entry, jacobian_to_dense, Jacobian};
pub use crate::core::node_values::NodeValues;
pub use crate::core::phase_nodes::PhaseNodes;
pub use crate::core::state::{MotionDerivative, Node, NodeInfo, PolyInfo, Side, StateLin};
pub use crate::error::{NodeError, Result};
