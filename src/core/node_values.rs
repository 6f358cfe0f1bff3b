use ndarray::Array1;
use tracing::{debug, trace};

use crate::config::DEFAULT_TIME_TOLERANCE;
use crate::core::component::{Component, NodeSpline};
use crate::core::hermite::CubicHermitePoly;
use crate::core::jacobian::{Jacobian, JacobianBuilder};
use crate::core::state::{MotionDerivative, Node, NodeInfo, PolyInfo, Side, StateLin};
use crate::core::timing::{local_time, validate_durations};
use crate::error::{NodeError, Result};

/// Number of node derivatives exposed per dimension (position and velocity).
const N_NODE_DERIVATIVES: usize = MotionDerivative::NODE_DERIVATIVES.len();

/// A chain of cubic Hermite segments whose boundary nodes are optimization
/// variables.
///
/// Segment `i` runs from node `i` to node `i + 1`. Nodes are grouped into
/// optimization blocks: a constant segment puts its start and end node in
/// the same block, so a run of constant segments shares one set of values.
/// Each block contributes `2 * n_dim` variables, laid out as all position
/// dimensions followed by all velocity dimensions.
#[derive(Debug, Clone)]
pub struct NodeValues {
    name: String,
    n_dim: usize,
    nodes: Vec<Node>,
    polys: Vec<CubicHermitePoly>,
    poly_infos: Vec<PolyInfo>,
    durations: Vec<f64>,
    opt_to_spline: Vec<Vec<usize>>,
    spline_to_opt: Vec<usize>,
    rows: usize,
    time_tolerance: f64,
}

impl NodeValues {
    /// Builds the node chain and its optimization mapping.
    ///
    /// # Arguments
    /// * `initial_value` - Value every node starts with. Its position length
    ///   fixes the number of dimensions.
    /// * `poly_infos` - One entry per segment, in time order.
    /// * `name` - Name of the variable block.
    ///
    /// # Returns
    /// The node set with all segment durations still zero. Durations must be
    /// assigned before any point or Jacobian query.
    pub fn new(initial_value: &Node, poly_infos: Vec<PolyInfo>, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if poly_infos.is_empty() {
            return Err(NodeError::EmptySchedule);
        }
        let n_dim = initial_value.n_dim();
        if n_dim == 0 {
            return Err(NodeError::invalid_config(format!(
                "initial node of '{name}' has no position values"
            )));
        }
        if initial_value.vel.len() != n_dim {
            return Err(NodeError::dimension_mismatch(n_dim, initial_value.vel.len()));
        }
        for info in &poly_infos {
            if info.num_polys_in_phase == 0 || info.poly_id_in_phase >= info.num_polys_in_phase {
                return Err(NodeError::invalid_config(format!(
                    "segment {} of {} in phase {} is not a valid placement",
                    info.poly_id_in_phase, info.num_polys_in_phase, info.phase
                )));
            }
        }

        let n_polys = poly_infos.len();
        let nodes = vec![initial_value.clone(); n_polys + 1];
        let polys = vec![CubicHermitePoly::new(n_dim); n_polys];

        let opt_to_spline = build_node_mappings(&poly_infos);
        let mut spline_to_opt = vec![0; n_polys + 1];
        for (block, node_ids) in opt_to_spline.iter().enumerate() {
            for &id in node_ids {
                spline_to_opt[id] = block;
            }
        }
        let rows = opt_to_spline.len() * N_NODE_DERIVATIVES * n_dim;

        debug!(
            name = %name,
            n_dim,
            segments = n_polys,
            blocks = opt_to_spline.len(),
            rows,
            "built node values"
        );

        let mut node_values = Self {
            name,
            n_dim,
            nodes,
            polys,
            poly_infos,
            durations: vec![0.0; n_polys],
            opt_to_spline,
            spline_to_opt,
            rows,
            time_tolerance: DEFAULT_TIME_TOLERANCE,
        };
        node_values.update_polynomials();
        Ok(node_values)
    }

    /// Sets how far past the total duration a query may land.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::InvalidConfig`] if `tolerance` is negative or not finite.
    pub fn with_time_tolerance(mut self, tolerance: f64) -> Result<Self> {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(NodeError::invalid_config(format!(
                "time_tolerance must be non-negative and finite, got {tolerance}"
            )));
        }
        self.time_tolerance = tolerance;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn n_dim(&self) -> usize {
        self.n_dim
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn poly_infos(&self) -> &[PolyInfo] {
        &self.poly_infos
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn total_duration(&self) -> f64 {
        self.durations.iter().sum()
    }

    /// Physical node ids sharing each optimization block.
    pub fn opt_blocks(&self) -> &[Vec<usize>] {
        &self.opt_to_spline
    }

    /// Id of the node on `side` of segment `poly_id`.
    pub fn node_id(&self, poly_id: usize, side: Side) -> usize {
        poly_id + side.offset()
    }

    /// Optimization index of one value of an optimization block.
    fn opt_index(&self, block: usize, deriv: MotionDerivative, dim: usize) -> usize {
        block * N_NODE_DERIVATIVES * self.n_dim + deriv.index() * self.n_dim + dim
    }

    /// Physical node values that optimization index `idx` stands for.
    ///
    /// Returns more than one entry exactly when `idx` belongs to a block
    /// shared by a run of constant segments.
    pub fn get_node_info(&self, idx: usize) -> Result<Vec<NodeInfo>> {
        if idx >= self.rows {
            return Err(NodeError::index_out_of_range(idx, self.rows));
        }
        let n_per_block = N_NODE_DERIVATIVES * self.n_dim;
        let block = idx / n_per_block;
        let internal = idx % n_per_block;
        let deriv = MotionDerivative::from_index(internal / self.n_dim)
            .ok_or_else(|| NodeError::index_out_of_range(internal / self.n_dim, N_NODE_DERIVATIVES))?;
        let dim = internal % self.n_dim;

        Ok(self.opt_to_spline[block]
            .iter()
            .map(|&id| NodeInfo { id, deriv, dim })
            .collect())
    }

    /// Node values of every optimization index, in index order.
    pub fn all_node_infos(&self) -> impl Iterator<Item = Vec<NodeInfo>> + '_ {
        self.opt_to_spline.iter().flat_map(move |node_ids| {
            MotionDerivative::NODE_DERIVATIVES.into_iter().flat_map(move |deriv| {
                (0..self.n_dim).map(move |dim| {
                    node_ids
                        .iter()
                        .map(|&id| NodeInfo { id, deriv, dim })
                        .collect()
                })
            })
        })
    }

    /// Current optimization vector.
    pub fn values(&self) -> Array1<f64> {
        let mut x = Array1::zeros(self.rows);
        for (block, node_ids) in self.opt_to_spline.iter().enumerate() {
            // All nodes of a block hold the same values.
            let node = &self.nodes[node_ids[0]];
            for dim in 0..self.n_dim {
                x[self.opt_index(block, MotionDerivative::Pos, dim)] = node.pos[dim];
                x[self.opt_index(block, MotionDerivative::Vel, dim)] = node.vel[dim];
            }
        }
        x
    }

    /// Writes the optimization vector into every node it maps to and
    /// refreshes all segments.
    pub fn set_values(&mut self, x: &Array1<f64>) -> Result<()> {
        if x.len() != self.rows {
            return Err(NodeError::dimension_mismatch(self.rows, x.len()));
        }
        for idx in 0..self.rows {
            for info in self.get_node_info(idx)? {
                self.nodes[info.id].at_mut(info.deriv)?[info.dim] = x[idx];
            }
        }
        self.update_polynomials();
        Ok(())
    }

    /// Assigns one duration per segment and refreshes all segments.
    pub fn set_segment_durations(&mut self, durations: &[f64]) -> Result<()> {
        if durations.len() != self.durations.len() {
            return Err(NodeError::dimension_mismatch(self.durations.len(), durations.len()));
        }
        validate_durations(durations)?;
        self.durations.copy_from_slice(durations);
        self.update_polynomials();
        Ok(())
    }

    /// Re-derives every segment's boundary conditions from the current
    /// nodes and durations.
    pub fn update_polynomials(&mut self) {
        for (i, poly) in self.polys.iter_mut().enumerate() {
            poly.set_nodes(&self.nodes[i], &self.nodes[i + 1], self.durations[i]);
        }
        trace!(name = %self.name, segments = self.polys.len(), "updated polynomials");
    }

    /// Coarse dependency check: only this block's own variables affect it.
    pub fn do_var_affect_current_state(&self, var_name: &str, _t_current: f64) -> bool {
        var_name == self.name
    }

    /// State of the trajectory at global time `t_global`.
    pub fn get_point(&self, t_global: f64) -> Result<StateLin> {
        let (id, t_local) = local_time(t_global, &self.durations, self.time_tolerance)?;
        Ok(self.polys[id].get_point(t_local))
    }

    /// Jacobian of the `dxdt` output at `t_global` with respect to the
    /// optimization vector, with one row per dimension.
    pub fn get_jacobian(&self, t_global: f64, dxdt: MotionDerivative) -> Result<Jacobian> {
        let (id, t_local) = local_time(t_global, &self.durations, self.time_tolerance)?;
        self.get_jacobian_at(id, t_local, dxdt)
    }

    /// Jacobian of segment `poly_id` at local time `t_local`.
    ///
    /// Only the two boundary nodes of the segment contribute. When both map
    /// to the same block (a constant segment) their contributions add up.
    pub fn get_jacobian_at(&self, poly_id: usize, t_local: f64, dxdt: MotionDerivative) -> Result<Jacobian> {
        let poly = self
            .polys
            .get(poly_id)
            .ok_or_else(|| NodeError::index_out_of_range(poly_id, self.polys.len()))?;

        let mut jac = JacobianBuilder::new(self.n_dim, self.rows);
        for side in Side::BOTH {
            let block = self.spline_to_opt[self.node_id(poly_id, side)];
            for node_deriv in MotionDerivative::NODE_DERIVATIVES {
                let val = poly.get_derivative_of(dxdt, side, node_deriv, t_local)?;
                for dim in 0..self.n_dim {
                    jac.add(dim, self.opt_index(block, node_deriv, dim), val)?;
                }
            }
        }
        Ok(jac.build())
    }

    /// Derivative of position at `t_global` with respect to the duration of
    /// the phase containing it.
    ///
    /// The phase duration is split evenly across its segments, so stretching
    /// it lengthens every segment by `1/n` and also shifts the start of the
    /// `k`-th segment by `k/n`, which moves the local time backwards.
    pub fn get_derivative_of_pos_wrt_phase_duration(&self, t_global: f64) -> Result<Array1<f64>> {
        let (id, t_local) = local_time(t_global, &self.durations, self.time_tolerance)?;
        let info = &self.poly_infos[id];
        let poly = &self.polys[id];

        let percent_of_phase = 1.0 / info.num_polys_in_phase as f64;
        let inner_derivative = percent_of_phase;
        let vel = poly.get_point(t_local).vel;
        let dxdt = poly.get_derivative_of_pos_wrt_duration(t_local);

        Ok(dxdt * inner_derivative - vel * (info.poly_id_in_phase as f64 * percent_of_phase))
    }
}

/// Groups physical node ids into optimization blocks.
///
/// Walking the segments in order, each segment's start node joins the
/// current block; the block only advances after a non-constant segment.
/// The final node joins whichever block is current at the end.
pub fn build_node_mappings(poly_infos: &[PolyInfo]) -> Vec<Vec<usize>> {
    let mut blocks: Vec<Vec<usize>> = vec![Vec::new()];
    for (poly_id, info) in poly_infos.iter().enumerate() {
        let node_id_start = poly_id + Side::Start.offset();
        if let Some(current) = blocks.last_mut() {
            current.push(node_id_start);
        }
        // a constant segment keeps its end node in the same block
        if !info.is_constant {
            blocks.push(Vec::new());
        }
    }
    let last_node_id = poly_infos.len();
    if let Some(current) = blocks.last_mut() {
        current.push(last_node_id);
    }
    blocks
}

impl Component for NodeValues {
    fn name(&self) -> &str {
        NodeValues::name(self)
    }

    fn rows(&self) -> usize {
        NodeValues::rows(self)
    }

    fn values(&self) -> Array1<f64> {
        NodeValues::values(self)
    }

    fn set_values(&mut self, x: &Array1<f64>) -> Result<()> {
        NodeValues::set_values(self, x)
    }

    fn as_spline(&self) -> Option<&dyn NodeSpline> {
        Some(self)
    }
}

impl NodeSpline for NodeValues {
    fn node_values(&self) -> &NodeValues {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jacobian::{jacobian_entry, jacobian_to_dense};
    use ndarray::arr1;

    const TOL: f64 = 1e-9;

    fn assert_arr_eq_tol(a: &Array1<f64>, b: &Array1<f64>, tol: f64) {
        assert_eq!(a.len(), b.len(), "Array lengths differ. Left: {:?}, Right: {:?}", a, b);
        for (i, (val_a, val_b)) in a.iter().zip(b.iter()).enumerate() {
            assert!((val_a - val_b).abs() < tol, "Mismatch at index {}: {} vs {}", i, val_a, val_b);
        }
    }

    fn initial_node(n_dim: usize) -> Node {
        Node::new(Array1::from_elem(n_dim, 0.3), Array1::zeros(n_dim))
    }

    // stance (constant), two swing segments, stance (constant)
    fn stance_swing_stance() -> Vec<PolyInfo> {
        vec![
            PolyInfo::new(0, 0, 1, true),
            PolyInfo::new(1, 0, 2, false),
            PolyInfo::new(1, 1, 2, false),
            PolyInfo::new(2, 0, 1, true),
        ]
    }

    fn ramp(n: usize) -> Array1<f64> {
        Array1::from_iter((0..n).map(|i| 0.1 * i as f64 - 0.7))
    }

    #[test]
    fn test_mapping_collapses_constant_segments() {
        let blocks = build_node_mappings(&stance_swing_stance());
        assert_eq!(blocks, vec![vec![0, 1], vec![2], vec![3, 4]]);
    }

    #[test]
    fn test_mapping_all_changing() {
        let infos = vec![PolyInfo::new(0, 0, 3, false); 3];
        let blocks = build_node_mappings(&infos);
        assert_eq!(blocks, vec![vec![0], vec![1], vec![2], vec![3]]);
    }

    #[test]
    fn test_mapping_consecutive_constant_run() {
        let infos = vec![
            PolyInfo::new(0, 0, 1, false),
            PolyInfo::new(1, 0, 1, true),
            PolyInfo::new(2, 0, 1, true),
            PolyInfo::new(3, 0, 1, false),
        ];
        let blocks = build_node_mappings(&infos);
        assert_eq!(blocks, vec![vec![0], vec![1, 2, 3], vec![4]]);
    }

    #[test]
    fn test_every_node_in_exactly_one_block() {
        let nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "ee-motion_0").unwrap();
        let mut seen: Vec<usize> = nv.opt_blocks().iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..nv.nodes().len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_rows() {
        let nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        assert_eq!(nv.rows(), 3 * 2 * 3);
        assert_eq!(nv.nodes().len(), 5);
        assert_eq!(nv.n_dim(), 3);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert_eq!(
            NodeValues::new(&initial_node(3), Vec::new(), "nodes").err(),
            Some(NodeError::EmptySchedule)
        );
        assert!(NodeValues::new(&Node::zeros(0), stance_swing_stance(), "nodes").is_err());

        let lopsided = Node::new(arr1(&[0.0, 0.0, 0.0]), arr1(&[0.0, 0.0]));
        assert_eq!(
            NodeValues::new(&lopsided, stance_swing_stance(), "nodes").err(),
            Some(NodeError::dimension_mismatch(3, 2))
        );

        let bad_placement = vec![PolyInfo::new(0, 2, 2, false)];
        assert!(NodeValues::new(&initial_node(2), bad_placement, "nodes").is_err());
    }

    #[test]
    fn test_time_tolerance_rejects_invalid_values() {
        for tolerance in [f64::NAN, -1e-6, f64::INFINITY] {
            let result = NodeValues::new(&Node::zeros(1), vec![PolyInfo::new(0, 0, 1, false)], "n")
                .unwrap()
                .with_time_tolerance(tolerance);
            assert!(
                matches!(result, Err(NodeError::InvalidConfig(_))),
                "tolerance {} accepted",
                tolerance
            );
        }
    }

    #[test]
    fn test_time_tolerance_allows_queries_just_past_end() {
        let mut nv = NodeValues::new(&Node::zeros(1), vec![PolyInfo::new(0, 0, 1, false)], "n")
            .unwrap()
            .with_time_tolerance(1e-3)
            .unwrap();
        nv.set_segment_durations(&[1.0]).unwrap();

        assert!(nv.get_point(0.5).is_ok());
        assert!(nv.get_point(1.0005).is_ok());
        assert!(nv.get_point(1.01).is_err());
    }

    #[test]
    fn test_get_node_info_decoding() {
        let nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();

        // block 0, position, dim 1 -> shared by nodes 0 and 1
        let info = nv.get_node_info(1).unwrap();
        assert_eq!(
            info,
            vec![
                NodeInfo { id: 0, deriv: MotionDerivative::Pos, dim: 1 },
                NodeInfo { id: 1, deriv: MotionDerivative::Pos, dim: 1 },
            ]
        );

        // block 1, velocity, dim 2 -> node 2 only
        let info = nv.get_node_info(6 + 3 + 2).unwrap();
        assert_eq!(info, vec![NodeInfo { id: 2, deriv: MotionDerivative::Vel, dim: 2 }]);

        assert!(nv.get_node_info(nv.rows()).is_err());
    }

    #[test]
    fn test_all_node_infos_matches_index_decoding() {
        let nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        let all: Vec<Vec<NodeInfo>> = nv.all_node_infos().collect();
        assert_eq!(all.len(), nv.rows());
        for (idx, infos) in all.iter().enumerate() {
            assert_eq!(infos, &nv.get_node_info(idx).unwrap());
        }
    }

    #[test]
    fn test_initial_values_come_from_initial_node() {
        let nv = NodeValues::new(&initial_node(2), stance_swing_stance(), "nodes").unwrap();
        let x = nv.values();
        // per block: [pos0, pos1, vel0, vel1]
        assert_arr_eq_tol(&x, &arr1(&[0.3, 0.3, 0.0, 0.0, 0.3, 0.3, 0.0, 0.0, 0.3, 0.3, 0.0, 0.0]), TOL);
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let mut nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        let x = ramp(nv.rows());
        nv.set_values(&x).unwrap();
        assert_eq!(nv.values(), x);

        // idempotent: writing back what was read changes nothing
        let nodes_before = nv.nodes().to_vec();
        let again = nv.values();
        nv.set_values(&again).unwrap();
        assert_eq!(nv.nodes(), &nodes_before[..]);
    }

    #[test]
    fn test_set_values_keeps_shared_nodes_equal() {
        let mut nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        nv.set_values(&ramp(nv.rows())).unwrap();
        assert_eq!(nv.nodes()[0], nv.nodes()[1]);
        assert_eq!(nv.nodes()[3], nv.nodes()[4]);
        assert_ne!(nv.nodes()[1], nv.nodes()[2]);
    }

    #[test]
    fn test_set_values_wrong_length() {
        let mut nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        assert_eq!(
            nv.set_values(&Array1::zeros(5)),
            Err(NodeError::dimension_mismatch(18, 5))
        );
    }

    #[test]
    fn test_queries_before_durations_fail() {
        let nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        assert_eq!(nv.get_point(0.0).err(), Some(NodeError::DurationsNotSet));
        assert_eq!(
            nv.get_jacobian(0.0, MotionDerivative::Pos).err(),
            Some(NodeError::DurationsNotSet)
        );
    }

    #[test]
    fn test_set_segment_durations_validation() {
        let mut nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        assert!(nv.set_segment_durations(&[0.2, 0.3]).is_err());
        assert!(nv.set_segment_durations(&[0.2, 0.3, -0.1, 0.4]).is_err());
        nv.set_segment_durations(&[0.2, 0.3, 0.3, 0.4]).unwrap();
        assert!((nv.total_duration() - 1.2).abs() < TOL);
    }

    #[test]
    fn test_get_point_follows_nodes() {
        let mut nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        nv.set_segment_durations(&[0.2, 0.3, 0.3, 0.4]).unwrap();
        nv.set_values(&ramp(nv.rows())).unwrap();

        // inside the first stance segment the position is the shared block value
        let state = nv.get_point(0.1).unwrap();
        assert_arr_eq_tol(&state.pos, &nv.nodes()[0].pos, TOL);

        // on a segment boundary the point is the boundary node
        let state = nv.get_point(0.5).unwrap();
        assert_arr_eq_tol(&state.pos, &nv.nodes()[2].pos, TOL);
        assert_arr_eq_tol(&state.vel, &nv.nodes()[2].vel, TOL);

        // end of the trajectory
        let state = nv.get_point(1.2).unwrap();
        assert_arr_eq_tol(&state.pos, &nv.nodes()[4].pos, TOL);

        assert!(nv.get_point(1.3).is_err());
    }

    #[test]
    fn test_jacobian_only_active_segment_nodes() {
        let mut nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        nv.set_segment_durations(&[0.2, 0.3, 0.3, 0.4]).unwrap();

        // t = 0.35 lies in segment 1, between node 1 (block 0) and node 2 (block 1)
        let jac = jacobian_to_dense(&nv.get_jacobian(0.35, MotionDerivative::Pos).unwrap());
        assert_eq!(jac.shape(), &[3, nv.rows()]);
        for col in 12..18 {
            for row in 0..3 {
                assert_eq!(jac[[row, col]], 0.0, "block 2 must not affect segment 1");
            }
        }
        // diagonal structure: dimension d only depends on dimension d
        assert_eq!(jac[[0, 1]], 0.0);
        assert!(jac[[1, 1]] > 0.0);
    }

    #[test]
    fn test_jacobian_accumulates_on_constant_segment() {
        let mut nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        nv.set_segment_durations(&[0.2, 0.3, 0.3, 0.4]).unwrap();

        // inside the first (constant) segment both boundary nodes map to block 0,
        // so the position weights add up to one
        for &t in &[0.0, 0.05, 0.1, 0.19] {
            let jac = nv.get_jacobian(t, MotionDerivative::Pos).unwrap();
            for dim in 0..3 {
                assert!((jacobian_entry(&jac, dim, dim) - 1.0).abs() < TOL);
            }
        }

        // velocity output of a constant segment does not depend on the shared position
        let jac = nv.get_jacobian(0.1, MotionDerivative::Vel).unwrap();
        assert!(jacobian_entry(&jac, 0, 0).abs() < TOL);
    }

    #[test]
    fn test_jacobian_at_segment_boundary_uses_next_segment() {
        let mut nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        nv.set_segment_durations(&[0.2, 0.3, 0.3, 0.4]).unwrap();

        // t = 0.5 resolves to segment 2 at local time 0: only node 2 (block 1) matters
        let jac = nv.get_jacobian(0.5, MotionDerivative::Pos).unwrap();
        assert!((jacobian_entry(&jac, 0, 6) - 1.0).abs() < TOL);
        assert!(jacobian_entry(&jac, 0, 0).abs() < TOL);
        assert!(jacobian_entry(&jac, 0, 12).abs() < TOL);
    }

    #[test]
    fn test_jacobian_matches_finite_differences() {
        let mut nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "nodes").unwrap();
        nv.set_segment_durations(&[0.2, 0.3, 0.3, 0.4]).unwrap();
        let x = ramp(nv.rows());
        nv.set_values(&x).unwrap();

        let h = 1e-6;
        for &t in &[0.1, 0.35, 0.65, 1.0] {
            for dxdt in [MotionDerivative::Pos, MotionDerivative::Vel, MotionDerivative::Acc] {
                let jac = jacobian_to_dense(&nv.get_jacobian(t, dxdt).unwrap());
                let base = nv.get_point(t).unwrap().at(dxdt).clone();
                for col in 0..nv.rows() {
                    let mut perturbed = nv.clone();
                    let mut xp = x.clone();
                    xp[col] += h;
                    perturbed.set_values(&xp).unwrap();
                    let fd = (perturbed.get_point(t).unwrap().at(dxdt) - &base) / h;
                    for row in 0..3 {
                        assert!(
                            (fd[row] - jac[[row, col]]).abs() < 1e-4,
                            "t={} {:?} ({}, {}): fd {} vs {}",
                            t, dxdt, row, col, fd[row], jac[[row, col]]
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_phase_duration_derivative_velocity_term() {
        let mut nv = NodeValues::new(&initial_node(1), stance_swing_stance(), "nodes").unwrap();
        nv.set_segment_durations(&[0.2, 0.3, 0.3, 0.4]).unwrap();
        nv.set_values(&ramp(nv.rows())).unwrap();

        // first segment of the swing phase: no time shift
        let t = 0.35;
        let expected = nv.polys[1].get_derivative_of_pos_wrt_duration(0.15) * 0.5;
        assert_arr_eq_tol(&nv.get_derivative_of_pos_wrt_phase_duration(t).unwrap(), &expected, TOL);

        // second segment: minus half the velocity
        let t = 0.65;
        let vel = nv.get_point(t).unwrap().vel;
        let expected = nv.polys[2].get_derivative_of_pos_wrt_duration(0.15) * 0.5 - vel * 0.5;
        assert_arr_eq_tol(&nv.get_derivative_of_pos_wrt_phase_duration(t).unwrap(), &expected, TOL);
    }

    #[test]
    fn test_do_var_affect_current_state() {
        let nv = NodeValues::new(&initial_node(3), stance_swing_stance(), "ee-motion_0").unwrap();
        assert!(nv.do_var_affect_current_state("ee-motion_0", 0.0));
        assert!(!nv.do_var_affect_current_state("ee-force_0", 0.0));
    }
}
