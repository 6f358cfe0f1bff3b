//! Basic value types shared by the polynomial evaluator and the node sets.

use ndarray::Array1;

use crate::error::{NodeError, Result};

/// Index of the forward axis.
pub const X: usize = 0;
/// Index of the lateral axis.
pub const Y: usize = 1;
/// Index of the vertical axis.
pub const Z: usize = 2;

/// Time derivative order of a trajectory quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionDerivative {
    /// Position (zeroth derivative).
    Pos,
    /// Velocity (first derivative).
    Vel,
    /// Acceleration (second derivative).
    Acc,
}

impl MotionDerivative {
    /// Derivatives stored in every node and therefore exposed as
    /// optimization variables.
    pub const NODE_DERIVATIVES: [MotionDerivative; 2] = [MotionDerivative::Pos, MotionDerivative::Vel];

    /// Position of this derivative within a node's block of variables.
    pub const fn index(self) -> usize {
        match self {
            MotionDerivative::Pos => 0,
            MotionDerivative::Vel => 1,
            MotionDerivative::Acc => 2,
        }
    }

    /// Inverse of [`MotionDerivative::index`].
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(MotionDerivative::Pos),
            1 => Some(MotionDerivative::Vel),
            2 => Some(MotionDerivative::Acc),
            _ => None,
        }
    }
}

/// Which boundary of a polynomial segment a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Start,
    End,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Start, Side::End];

    /// Node id offset relative to the segment id.
    pub const fn offset(self) -> usize {
        match self {
            Side::Start => 0,
            Side::End => 1,
        }
    }
}

/// Boundary values of a segment: position and velocity per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub pos: Array1<f64>,
    pub vel: Array1<f64>,
}

impl Node {
    pub fn new(pos: Array1<f64>, vel: Array1<f64>) -> Self {
        Self { pos, vel }
    }

    /// A node with zero position and velocity in `n_dim` dimensions.
    pub fn zeros(n_dim: usize) -> Self {
        Self::new(Array1::zeros(n_dim), Array1::zeros(n_dim))
    }

    /// Number of spatial dimensions, taken from the position values.
    pub fn n_dim(&self) -> usize {
        self.pos.len()
    }

    /// Values of one derivative. Nodes carry no acceleration.
    pub fn at(&self, deriv: MotionDerivative) -> Result<&Array1<f64>> {
        match deriv {
            MotionDerivative::Pos => Ok(&self.pos),
            MotionDerivative::Vel => Ok(&self.vel),
            MotionDerivative::Acc => Err(NodeError::MissingDerivative(deriv)),
        }
    }

    pub fn at_mut(&mut self, deriv: MotionDerivative) -> Result<&mut Array1<f64>> {
        match deriv {
            MotionDerivative::Pos => Ok(&mut self.pos),
            MotionDerivative::Vel => Ok(&mut self.vel),
            MotionDerivative::Acc => Err(NodeError::MissingDerivative(deriv)),
        }
    }
}

/// Evaluated state of a trajectory at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct StateLin {
    pub pos: Array1<f64>,
    pub vel: Array1<f64>,
    pub acc: Array1<f64>,
}

impl StateLin {
    pub fn at(&self, deriv: MotionDerivative) -> &Array1<f64> {
        match deriv {
            MotionDerivative::Pos => &self.pos,
            MotionDerivative::Vel => &self.vel,
            MotionDerivative::Acc => &self.acc,
        }
    }
}

/// One physical node value addressed by an optimization index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    /// Physical node id.
    pub id: usize,
    /// Which derivative of the node.
    pub deriv: MotionDerivative,
    /// Spatial dimension.
    pub dim: usize,
}

/// Placement of one polynomial segment within the phase schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolyInfo {
    /// Phase this segment belongs to.
    pub phase: usize,
    /// Position of the segment within its phase.
    pub poly_id_in_phase: usize,
    /// Number of segments the phase is split into.
    pub num_polys_in_phase: usize,
    /// Start and end node of this segment hold the same value.
    pub is_constant: bool,
}

impl PolyInfo {
    pub const fn new(
        phase: usize,
        poly_id_in_phase: usize,
        num_polys_in_phase: usize,
        is_constant: bool,
    ) -> Self {
        Self {
            phase,
            poly_id_in_phase,
            num_polys_in_phase,
            is_constant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_derivative_index_roundtrip() {
        for deriv in [MotionDerivative::Pos, MotionDerivative::Vel, MotionDerivative::Acc] {
            assert_eq!(MotionDerivative::from_index(deriv.index()), Some(deriv));
        }
        assert_eq!(MotionDerivative::from_index(3), None);
    }

    #[test]
    fn test_node_has_no_acceleration() {
        let mut node = Node::new(arr1(&[1.0, 2.0]), arr1(&[0.5, 0.0]));
        assert_eq!(node.n_dim(), 2);
        assert_eq!(node.at(MotionDerivative::Vel).unwrap()[0], 0.5);
        assert_eq!(
            node.at(MotionDerivative::Acc),
            Err(NodeError::MissingDerivative(MotionDerivative::Acc))
        );
        node.at_mut(MotionDerivative::Pos).unwrap()[1] = 7.0;
        assert_eq!(node.pos[1], 7.0);
    }

    #[test]
    fn test_side_offset() {
        assert_eq!(Side::Start.offset(), 0);
        assert_eq!(Side::End.offset(), 1);
    }
}
