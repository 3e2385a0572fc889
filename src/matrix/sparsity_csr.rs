//! Pattern-only CSR plus a uniform scalar (spec §4.D): row pointers and
//! column indices with a single value shared by every stored position,
//! for symbolic phases (SpGEMM sizing, ILU/ISAI pattern generation) and
//! for operators like graph adjacency where every edge carries the same
//! weight.

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::linop::{ConvertTo, LinOp, PolymorphicObject};
use crate::types::{Scalar, SparseIndex};
use num_traits::Zero;

#[derive(Clone, Debug)]
pub struct SparsityCsr<V, I> {
    dim: Dim2,
    row_ptrs: Vec<I>,
    col_idxs: Vec<I>,
    value: V,
}

impl<V: Scalar, I: SparseIndex> SparsityCsr<V, I> {
    pub fn from_parts(dim: Dim2, row_ptrs: Vec<I>, col_idxs: Vec<I>, value: V) -> Result<Self> {
        if row_ptrs.len() != dim.rows + 1 {
            return Err(SparseError::DimensionMismatch {
                operation: "SparsityCsr::from_parts".to_string(),
                expected: (dim.rows + 1, 0),
                actual: (row_ptrs.len(), 0),
            });
        }
        Ok(Self { dim, row_ptrs, col_idxs, value })
    }

    /// Drop per-entry values from a value-carrying CSR matrix, keeping only
    /// structure plus a single uniform scalar applied at every stored
    /// position.
    pub fn from_csr(csr: &Csr<V, I>, value: V) -> Self {
        Self {
            dim: csr.dim(),
            row_ptrs: csr.row_ptrs().to_vec(),
            col_idxs: csr.col_idxs().to_vec(),
            value,
        }
    }

    pub fn dim(&self) -> Dim2 {
        self.dim
    }

    pub fn value(&self) -> V {
        self.value
    }

    pub fn row_ptrs(&self) -> &[I] {
        &self.row_ptrs
    }

    pub fn col_idxs(&self) -> &[I] {
        &self.col_idxs
    }

    pub fn row_cols(&self, row: usize) -> &[I] {
        let start = self.row_ptrs[row].to_usize();
        let end = self.row_ptrs[row + 1].to_usize();
        &self.col_idxs[start..end]
    }

    pub fn to_csr(&self) -> Csr<V, I> {
        let values = vec![self.value; self.col_idxs.len()];
        Csr::from_parts(self.dim, self.row_ptrs.clone(), self.col_idxs.clone(), values)
            .expect("SparsityCsr's own row_ptrs are already valid CSR row pointers")
    }
}

impl<V: Scalar, I: SparseIndex> LinOp<V> for SparsityCsr<V, I> {
    fn dim(&self) -> Dim2 {
        self.dim
    }

    fn apply(&self, x: &[V], y: &mut [V]) -> Result<()> {
        if x.len() != self.dim.cols || y.len() != self.dim.rows {
            return Err(SparseError::DimensionMismatch {
                operation: "SparsityCsr::apply".to_string(),
                expected: (self.dim.rows, self.dim.cols),
                actual: (y.len(), x.len()),
            });
        }
        for row in 0..self.dim.rows {
            let mut acc = V::zero();
            for &c in self.row_cols(row) {
                acc = acc + x[c.to_usize()];
            }
            y[row] = acc * self.value;
        }
        Ok(())
    }
}

impl<V: Scalar, I: SparseIndex> PolymorphicObject for SparsityCsr<V, I> {
    fn format_name(&self) -> &'static str {
        "sparsity_csr"
    }

    fn nnz(&self) -> usize {
        self.col_idxs.len()
    }
}

impl<V: Scalar, I: SparseIndex> ConvertTo<Csr<V, I>> for SparsityCsr<V, I> {
    fn convert_to(&self) -> Csr<V, I> {
        self.to_csr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_csr_drops_values_keeps_structure() {
        let csr: Csr<f64, i32> =
            Csr::from_parts(Dim2::square(2), vec![0, 1, 2], vec![1, 0], vec![9.0, 9.0]).unwrap();
        let pattern = SparsityCsr::from_csr(&csr, 1.0);
        assert_eq!(pattern.row_cols(0), &[1]);
        assert_eq!(pattern.row_cols(1), &[0]);
    }

    #[test]
    fn apply_scales_row_sums_by_the_uniform_value() {
        let csr: Csr<f64, i32> = Csr::from_parts(
            Dim2::square(2),
            vec![0, 2, 3],
            vec![0, 1, 1],
            vec![9.0, 9.0, 9.0],
        )
        .unwrap();
        let pattern = SparsityCsr::from_csr(&csr, 2.0);
        let x = vec![1.0, 3.0];
        let mut y = vec![0.0; 2];
        pattern.apply(&x, &mut y).unwrap();
        assert_eq!(y, vec![8.0, 6.0]);
    }

    #[test]
    fn to_csr_materializes_the_uniform_value_at_every_position() {
        let pattern: SparsityCsr<f64, i32> =
            SparsityCsr::from_parts(Dim2::square(2), vec![0, 1, 2], vec![1, 0], 5.0).unwrap();
        let csr = pattern.to_csr();
        assert_eq!(csr.values(), &[5.0, 5.0]);
    }
}
