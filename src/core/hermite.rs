use ndarray::Array1;

use crate::core::state::{MotionDerivative, Node, Side, StateLin};
use crate::error::{NodeError, Result};

/// A cubic polynomial segment fixed by position and velocity at both ends.
///
/// With start node `(p0, v0)`, end node `(p1, v1)` and duration `T` the
/// segment is `x(t) = c0 + c1 t + c2 t^2 + c3 t^3` where
///
/// ```text
/// c0 = p0
/// c1 = v0
/// c2 = -(3 (p0 - p1) + T (2 v0 + v1)) / T^2
/// c3 =  (2 (p0 - p1) + T (v0 + v1)) / T^3
/// ```
///
/// The same weights apply independently in every dimension, which is what
/// makes the Jacobian with respect to node values diagonal per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicHermitePoly {
    n_dim: usize,
    start: Node,
    end: Node,
    duration: f64,
}

impl CubicHermitePoly {
    /// Creates a segment of zero nodes and zero duration in `n_dim` dimensions.
    pub fn new(n_dim: usize) -> Self {
        Self {
            n_dim,
            start: Node::zeros(n_dim),
            end: Node::zeros(n_dim),
            duration: 0.0,
        }
    }

    /// Replaces the boundary conditions of the segment.
    ///
    /// # Arguments
    /// * `start` - Node at local time zero.
    /// * `end` - Node at local time `duration`.
    /// * `duration` - Length of the segment.
    pub fn set_nodes(&mut self, start: &Node, end: &Node, duration: f64) {
        debug_assert_eq!(start.n_dim(), self.n_dim);
        debug_assert_eq!(end.n_dim(), self.n_dim);
        self.start.clone_from(start);
        self.end.clone_from(end);
        self.duration = duration;
    }

    pub fn n_dim(&self) -> usize {
        self.n_dim
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn start(&self) -> &Node {
        &self.start
    }

    pub fn end(&self) -> &Node {
        &self.end
    }

    /// Evaluates position, velocity and acceleration at local time `t`.
    ///
    /// The duration must be positive.
    pub fn get_point(&self, t: f64) -> StateLin {
        debug_assert!(self.duration > 0.0, "segment evaluated with zero duration");
        StateLin {
            pos: self.combine(MotionDerivative::Pos, t),
            vel: self.combine(MotionDerivative::Vel, t),
            acc: self.combine(MotionDerivative::Acc, t),
        }
    }

    /// Derivative of the `dxdt` output at local time `t` with respect to
    /// the `node_deriv` value of the node on `side`.
    ///
    /// # Arguments
    /// * `dxdt` - Which output is differentiated (position, velocity or acceleration).
    /// * `side` - Boundary node whose value is varied.
    /// * `node_deriv` - Which value of that node is varied. Only position and
    ///   velocity exist in a node.
    /// * `t` - Local time inside the segment.
    ///
    /// # Returns
    /// The scalar weight, identical for every dimension, or an error if
    /// `node_deriv` is acceleration.
    pub fn get_derivative_of(
        &self,
        dxdt: MotionDerivative,
        side: Side,
        node_deriv: MotionDerivative,
        t: f64,
    ) -> Result<f64> {
        if node_deriv == MotionDerivative::Acc {
            return Err(NodeError::MissingDerivative(node_deriv));
        }
        Ok(hermite_weight(dxdt, side, node_deriv, t, self.duration))
    }

    /// Derivative of position at local time `t` with respect to the segment
    /// duration, holding `t` and all node values fixed.
    pub fn get_derivative_of_pos_wrt_duration(&self, t: f64) -> Array1<f64> {
        let big_t = self.duration;
        let dp = &self.start.pos - &self.end.pos;
        let v0 = &self.start.vel;
        let v1 = &self.end.vel;

        // dc2/dT = 6 (p0 - p1) / T^3 + (2 v0 + v1) / T^2
        let dc2 = &dp * (6.0 / big_t.powi(3)) + &(v0 * 2.0 + v1) / big_t.powi(2);
        // dc3/dT = -6 (p0 - p1) / T^4 - 2 (v0 + v1) / T^3
        let dc3 = &dp * (-6.0 / big_t.powi(4)) - &(v0 + v1) * (2.0 / big_t.powi(3));

        dc2 * t.powi(2) + dc3 * t.powi(3)
    }

    fn combine(&self, dxdt: MotionDerivative, t: f64) -> Array1<f64> {
        let big_t = self.duration;
        let w = |side, node_deriv| hermite_weight(dxdt, side, node_deriv, t, big_t);
        &self.start.pos * w(Side::Start, MotionDerivative::Pos)
            + &self.start.vel * w(Side::Start, MotionDerivative::Vel)
            + &self.end.pos * w(Side::End, MotionDerivative::Pos)
            + &self.end.vel * w(Side::End, MotionDerivative::Vel)
    }
}

/// Hermite basis weight of one boundary value, differentiated `dxdt` times
/// with respect to local time.
fn hermite_weight(
    dxdt: MotionDerivative,
    side: Side,
    node_deriv: MotionDerivative,
    t: f64,
    big_t: f64,
) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let big_t2 = big_t * big_t;
    let big_t3 = big_t2 * big_t;

    use MotionDerivative::{Acc, Pos, Vel};
    match (dxdt, side, node_deriv) {
        (Pos, Side::Start, Pos) => 1.0 - 3.0 * t2 / big_t2 + 2.0 * t3 / big_t3,
        (Pos, Side::Start, Vel) => t - 2.0 * t2 / big_t + t3 / big_t2,
        (Pos, Side::End, Pos) => 3.0 * t2 / big_t2 - 2.0 * t3 / big_t3,
        (Pos, Side::End, Vel) => -t2 / big_t + t3 / big_t2,

        (Vel, Side::Start, Pos) => -6.0 * t / big_t2 + 6.0 * t2 / big_t3,
        (Vel, Side::Start, Vel) => 1.0 - 4.0 * t / big_t + 3.0 * t2 / big_t2,
        (Vel, Side::End, Pos) => 6.0 * t / big_t2 - 6.0 * t2 / big_t3,
        (Vel, Side::End, Vel) => -2.0 * t / big_t + 3.0 * t2 / big_t2,

        (Acc, Side::Start, Pos) => -6.0 / big_t2 + 12.0 * t / big_t3,
        (Acc, Side::Start, Vel) => -4.0 / big_t + 6.0 * t / big_t2,
        (Acc, Side::End, Pos) => 6.0 / big_t2 - 12.0 * t / big_t3,
        (Acc, Side::End, Vel) => -2.0 / big_t + 6.0 * t / big_t2,

        (_, _, Acc) => 0.0,
    }
}
