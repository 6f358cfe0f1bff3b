use ndarray::Array1;
use tracing::debug;

use crate::core::component::{Component, NodeSpline};
use crate::core::node_values::NodeValues;
use crate::core::state::{Node, PolyInfo};
use crate::core::timing::segment_durations;
use crate::error::{NodeError, Result};

/// Node values whose segments are laid out by a contact schedule.
///
/// A phase whose contact flag equals `is_constant_during_contact` becomes a
/// single constant segment. Every other phase is split into
/// `n_polys_in_changing_phase` segments of equal duration.
#[derive(Debug, Clone)]
pub struct PhaseNodes {
    nodes: NodeValues,
    contact_schedule: Vec<bool>,
}

impl PhaseNodes {
    /// # Arguments
    /// * `initial_value` - Value every node starts with.
    /// * `contact_schedule` - Contact flag of every phase, in time order.
    /// * `name` - Name of the variable block.
    /// * `is_constant_during_contact` - Contact flag whose phases are constant.
    /// * `n_polys_in_changing_phase` - Segments per non-constant phase.
    pub fn new(
        initial_value: &Node,
        contact_schedule: &[bool],
        name: impl Into<String>,
        is_constant_during_contact: bool,
        n_polys_in_changing_phase: usize,
    ) -> Result<Self> {
        if contact_schedule.is_empty() {
            return Err(NodeError::EmptySchedule);
        }
        if n_polys_in_changing_phase == 0 {
            return Err(NodeError::invalid_config(
                "a changing phase needs at least one polynomial",
            ));
        }

        let poly_infos = build_poly_infos(contact_schedule, is_constant_during_contact, n_polys_in_changing_phase);
        let nodes = NodeValues::new(initial_value, poly_infos, name)?;

        Ok(Self {
            nodes,
            contact_schedule: contact_schedule.to_vec(),
        })
    }

    pub fn with_time_tolerance(mut self, tolerance: f64) -> Result<Self> {
        self.nodes = self.nodes.with_time_tolerance(tolerance)?;
        Ok(self)
    }

    pub fn phase_count(&self) -> usize {
        self.contact_schedule.len()
    }

    pub fn contact_schedule(&self) -> &[bool] {
        &self.contact_schedule
    }

    pub fn nodes(&self) -> &NodeValues {
        &self.nodes
    }

    /// Distributes every phase duration evenly over the segments of that
    /// phase and refreshes all segments.
    pub fn update_durations(&mut self, phase_durations: &[f64]) -> Result<()> {
        if phase_durations.len() != self.phase_count() {
            return Err(NodeError::PhaseCountMismatch {
                expected: self.phase_count(),
                found: phase_durations.len(),
            });
        }
        let durations = segment_durations(self.nodes.poly_infos(), phase_durations)?;
        self.nodes.set_segment_durations(&durations)?;
        debug!(name = self.nodes.name(), phases = phase_durations.len(), "updated phase durations");
        Ok(())
    }

    pub fn set_values(&mut self, x: &Array1<f64>) -> Result<()> {
        self.nodes.set_values(x)
    }
}

/// Segment layout for a contact schedule.
pub fn build_poly_infos(
    contact_schedule: &[bool],
    is_constant_during_contact: bool,
    n_polys_in_changing_phase: usize,
) -> Vec<PolyInfo> {
    let mut infos = Vec::new();
    for (phase, &in_contact) in contact_schedule.iter().enumerate() {
        if in_contact == is_constant_during_contact {
            infos.push(PolyInfo::new(phase, 0, 1, true));
        } else {
            for j in 0..n_polys_in_changing_phase {
                infos.push(PolyInfo::new(phase, j, n_polys_in_changing_phase, false));
            }
        }
    }
    infos
}

impl Component for PhaseNodes {
    fn name(&self) -> &str {
        self.nodes.name()
    }

    fn rows(&self) -> usize {
        self.nodes.rows()
    }

    fn values(&self) -> Array1<f64> {
        self.nodes.values()
    }

    fn set_values(&mut self, x: &Array1<f64>) -> Result<()> {
        PhaseNodes::set_values(self, x)
    }

    fn as_spline(&self) -> Option<&dyn NodeSpline> {
        Some(self)
    }
}

impl NodeSpline for PhaseNodes {
    fn node_values(&self) -> &NodeValues {
        &self.nodes
    }
}
