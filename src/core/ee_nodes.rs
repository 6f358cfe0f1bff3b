//! Motion and force node sets of a single end-effector.

use ndarray::Array1;

use crate::config::NodeParams;
use crate::core::bounds::{Bound, EQUALITY_BOUND, NO_BOUND};
use crate::core::component::{Component, NodeSpline};
use crate::core::node_values::NodeValues;
use crate::core::phase_nodes::PhaseNodes;
use crate::core::state::{MotionDerivative, Node, NodeInfo, X, Y, Z};
use crate::error::Result;

/// Variable block name of the motion of end-effector `ee`.
pub fn ee_motion_id(ee: usize) -> String {
    format!("ee-motion_{ee}")
}

/// Variable block name of the contact force of end-effector `ee`.
pub fn ee_force_id(ee: usize) -> String {
    format!("ee-force_{ee}")
}

/// End-effector position over time.
///
/// Every stance phase is one constant segment: the foot does not move while
/// it is on the ground. Swing phases are split into
/// [`NodeParams::polys_per_swing_phase`] segments.
#[derive(Debug, Clone)]
pub struct EEMotionNodes {
    phase_nodes: PhaseNodes,
}

impl EEMotionNodes {
    pub fn new(initial_value: &Node, contact_schedule: &[bool], ee: usize, params: &NodeParams) -> Result<Self> {
        params.validate()?;
        let phase_nodes = PhaseNodes::new(
            initial_value,
            contact_schedule,
            ee_motion_id(ee),
            true,
            params.polys_per_swing_phase,
        )?
        .with_time_tolerance(params.time_tolerance)?;
        Ok(Self { phase_nodes })
    }

    pub fn phase_nodes(&self) -> &PhaseNodes {
        &self.phase_nodes
    }

    pub fn update_durations(&mut self, phase_durations: &[f64]) -> Result<()> {
        self.phase_nodes.update_durations(phase_durations)
    }

    /// Stance values are pinned to zero velocity and zero height. Swing
    /// heights are left unbounded so the foot can lift off the ground.
    pub fn bounds(&self) -> Vec<Bound> {
        self.phase_nodes
            .nodes()
            .all_node_infos()
            .map(|infos| motion_bound(&infos))
            .collect()
    }
}

fn motion_bound(infos: &[NodeInfo]) -> Bound {
    let is_stance = infos.len() > 1;
    let n0 = infos[0];
    if is_stance && (n0.deriv == MotionDerivative::Vel || n0.dim == Z) {
        // standing still on ground at zero height
        return EQUALITY_BOUND;
    }
    NO_BOUND
}

/// End-effector contact force over time.
///
/// Every swing phase is one constant segment, pinned to zero. Stance phases
/// are split into [`NodeParams::polys_per_stance_phase`] segments.
#[derive(Debug, Clone)]
pub struct EEForcesNodes {
    phase_nodes: PhaseNodes,
    max_force: f64,
}

impl EEForcesNodes {
    pub fn new(initial_force: &Node, contact_schedule: &[bool], ee: usize, params: &NodeParams) -> Result<Self> {
        params.validate()?;
        let phase_nodes = PhaseNodes::new(
            initial_force,
            contact_schedule,
            ee_force_id(ee),
            false,
            params.polys_per_stance_phase,
        )?
        .with_time_tolerance(params.time_tolerance)?;
        Ok(Self {
            phase_nodes,
            max_force: params.max_force,
        })
    }

    pub fn phase_nodes(&self) -> &PhaseNodes {
        &self.phase_nodes
    }

    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    pub fn update_durations(&mut self, phase_durations: &[f64]) -> Result<()> {
        self.phase_nodes.update_durations(phase_durations)
    }

    /// No force during swing; bounded, unilateral force during stance.
    pub fn bounds(&self) -> Vec<Bound> {
        self.phase_nodes
            .nodes()
            .all_node_infos()
            .map(|infos| self.force_bound(&infos))
            .collect()
    }

    fn force_bound(&self, infos: &[NodeInfo]) -> Bound {
        let is_swing = infos.len() > 1;
        if is_swing {
            // neither force nor its rate of change in the air
            return EQUALITY_BOUND;
        }

        let n0 = infos[0];
        match (n0.deriv, n0.dim) {
            (MotionDerivative::Pos, X | Y) => Bound::symmetric(self.max_force),
            // the ground can only push
            (MotionDerivative::Pos, Z) => Bound::new(0.0, self.max_force),
            // zero slope keeps the normal force from overshooting its limit
            (MotionDerivative::Vel, Z) => EQUALITY_BOUND,
            _ => NO_BOUND,
        }
    }
}

macro_rules! impl_phase_component {
    ($ty:ty) => {
        impl Component for $ty {
            fn name(&self) -> &str {
                self.phase_nodes.nodes().name()
            }

            fn rows(&self) -> usize {
                self.phase_nodes.nodes().rows()
            }

            fn values(&self) -> Array1<f64> {
                self.phase_nodes.nodes().values()
            }

            fn set_values(&mut self, x: &Array1<f64>) -> Result<()> {
                self.phase_nodes.set_values(x)
            }

            fn bounds(&self) -> Vec<Bound> {
                <$ty>::bounds(self)
            }

            fn as_spline(&self) -> Option<&dyn NodeSpline> {
                Some(self)
            }
        }

        impl NodeSpline for $ty {
            fn node_values(&self) -> &NodeValues {
                self.phase_nodes.nodes()
            }
        }
    };
}

impl_phase_component!(EEMotionNodes);
impl_phase_component!(EEForcesNodes);
