//! Sparse Jacobian assembly.
//!
//! Entries are collected as `(row, col, value)` triplets and compressed into
//! clarabel's column-major [`CscMatrix`], the format the solver side consumes.
//! Triplets hitting the same `(row, col)` are summed.

use clarabel::algebra::CscMatrix;
use ndarray::Array2;

use crate::error::{NodeError, Result};

/// Sparse Jacobian in compressed sparse column format.
pub type Jacobian = CscMatrix<f64>;

/// Collects Jacobian entries before compression.
#[derive(Debug, Clone)]
pub struct JacobianBuilder {
    rows: usize,
    cols: usize,
    triplets: Vec<(usize, usize, f64)>,
}

impl JacobianBuilder {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            triplets: Vec::new(),
        }
    }

    /// Adds `value` onto entry `(row, col)`.
    ///
    /// Zero values are kept so the sparsity pattern does not depend on
    /// where inside a segment the Jacobian is taken.
    pub fn add(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows {
            return Err(NodeError::index_out_of_range(row, self.rows));
        }
        if col >= self.cols {
            return Err(NodeError::index_out_of_range(col, self.cols));
        }
        self.triplets.push((row, col, value));
        Ok(())
    }

    /// Compresses the collected triplets, summing duplicates.
    pub fn build(mut self) -> Jacobian {
        // CscMatrix expects row indices sorted within each column.
        self.triplets.sort_unstable_by_key(|k| (k.1, k.0));

        let mut colptr = vec![0; self.cols + 1];
        let mut rowval: Vec<usize> = Vec::with_capacity(self.triplets.len());
        let mut nzval: Vec<f64> = Vec::with_capacity(self.triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, val) in self.triplets {
            if last == Some((r, c)) {
                if let Some(v) = nzval.last_mut() {
                    *v += val;
                }
                continue;
            }
            rowval.push(r);
            nzval.push(val);
            colptr[c + 1] += 1;
            last = Some((r, c));
        }

        for j in 0..self.cols {
            colptr[j + 1] += colptr[j];
        }

        CscMatrix::new(self.rows, self.cols, colptr, rowval, nzval)
    }
}

/// Reads entry `(row, col)`, returning zero for entries outside the pattern.
pub fn jacobian_entry(jac: &Jacobian, row: usize, col: usize) -> f64 {
    if col >= jac.n {
        return 0.0;
    }
    let range = jac.colptr[col]..jac.colptr[col + 1];
    jac.rowval[range.clone()]
        .iter()
        .position(|&r| r == row)
        .map_or(0.0, |k| jac.nzval[range.start + k])
}

/// Expands a sparse Jacobian into a dense matrix.
pub fn jacobian_to_dense(jac: &Jacobian) -> Array2<f64> {
    let mut dense = Array2::zeros((jac.m, jac.n));
    for col in 0..jac.n {
        for k in jac.colptr[col]..jac.colptr[col + 1] {
            dense[[jac.rowval[k], col]] += jac.nzval[k];
        }
    }
    dense
}
