//! Interfaces through which a solver sees optimization variable blocks.

use ndarray::{s, Array1};
use tracing::debug;

use crate::core::bounds::{Bound, NO_BOUND};
use crate::core::jacobian::Jacobian;
use crate::core::node_values::NodeValues;
use crate::core::state::{MotionDerivative, StateLin};
use crate::error::{NodeError, Result};

/// A named block of optimization variables with a fixed length.
pub trait Component {
    /// Identifier the solver uses to route values to this block.
    fn name(&self) -> &str;

    /// Number of optimization variables. Fixed for the lifetime of the block.
    fn rows(&self) -> usize;

    /// Current values of all variables.
    fn values(&self) -> Array1<f64>;

    /// Overwrites all variables. `x` must have exactly [`Component::rows`] entries.
    fn set_values(&mut self, x: &Array1<f64>) -> Result<()>;

    /// Box bounds of every variable. Unbounded unless overridden.
    fn bounds(&self) -> Vec<Bound> {
        vec![NO_BOUND; self.rows()]
    }

    /// Access to trajectory queries, for blocks that represent a spline.
    fn as_spline(&self) -> Option<&dyn NodeSpline> {
        None
    }
}

/// Trajectory queries on anything backed by [`NodeValues`].
pub trait NodeSpline {
    fn node_values(&self) -> &NodeValues;

    fn point(&self, t_global: f64) -> Result<StateLin> {
        self.node_values().get_point(t_global)
    }

    fn jacobian(&self, t_global: f64, dxdt: MotionDerivative) -> Result<Jacobian> {
        self.node_values().get_jacobian(t_global, dxdt)
    }

    fn derivative_of_pos_wrt_phase_duration(&self, t_global: f64) -> Result<Array1<f64>> {
        self.node_values().get_derivative_of_pos_wrt_phase_duration(t_global)
    }

    fn do_var_affect_current_state(&self, var_name: &str, t_current: f64) -> bool {
        self.node_values().do_var_affect_current_state(var_name, t_current)
    }

    fn total_duration(&self) -> f64 {
        self.node_values().total_duration()
    }
}

/// Ordered collection of uniquely named components forming the full
/// optimization vector.
#[derive(Default)]
pub struct Composite {
    components: Vec<Box<dyn Component>>,
}

impl Composite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a component at the end of the optimization vector.
    pub fn add(&mut self, component: Box<dyn Component>) -> Result<()> {
        if self.get(component.name()).is_some() {
            return Err(NodeError::DuplicateComponent(component.name().to_string()));
        }
        debug!(name = component.name(), rows = component.rows(), "adding component");
        self.components.push(component);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&dyn Component> {
        self.components
            .iter()
            .find(|c| c.name() == name)
            .map(|c| &**c)
    }

    /// Trajectory queries of a named component, if it is a spline.
    pub fn spline(&self, name: &str) -> Result<&dyn NodeSpline> {
        self.get(name)
            .and_then(|c| c.as_spline())
            .ok_or_else(|| NodeError::UnknownComponent(name.to_string()))
    }

    /// Index of the first variable of `name` in the full vector.
    pub fn offset_of(&self, name: &str) -> Result<usize> {
        let mut offset = 0;
        for c in &self.components {
            if c.name() == name {
                return Ok(offset);
            }
            offset += c.rows();
        }
        Err(NodeError::UnknownComponent(name.to_string()))
    }

    pub fn rows(&self) -> usize {
        self.components.iter().map(|c| c.rows()).sum()
    }

    pub fn values(&self) -> Array1<f64> {
        let mut x = Array1::zeros(self.rows());
        let mut offset = 0;
        for c in &self.components {
            let n = c.rows();
            x.slice_mut(s![offset..offset + n]).assign(&c.values());
            offset += n;
        }
        x
    }

    /// Splits `x` across the components in insertion order.
    pub fn set_values(&mut self, x: &Array1<f64>) -> Result<()> {
        let rows = self.rows();
        if x.len() != rows {
            return Err(NodeError::dimension_mismatch(rows, x.len()));
        }
        let mut offset = 0;
        for c in &mut self.components {
            let n = c.rows();
            c.set_values(&x.slice(s![offset..offset + n]).to_owned())?;
            offset += n;
        }
        Ok(())
    }

    pub fn bounds(&self) -> Vec<Bound> {
        self.components.iter().flat_map(|c| c.bounds()).collect()
    }
}
