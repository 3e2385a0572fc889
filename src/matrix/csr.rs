//! Compressed Sparse Row (spec §4.D): the primary storage format, and the
//! one every other format converts through.

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::data::MatrixData;
use crate::matrix::dense::Dense;
use crate::matrix::linop::{ConvertTo, LinOp, PolymorphicObject, Transposable};
use crate::matrix::strategy::{resolve_strategy, CsrStrategy};
use crate::types::{Scalar, SparseIndex};
use num_traits::Zero;

#[derive(Clone, Debug)]
pub struct Csr<V, I> {
    dim: Dim2,
    row_ptrs: Vec<I>,
    col_idxs: Vec<I>,
    values: Vec<V>,
    strategy: CsrStrategy,
    /// Whether a vendor sparse BLAS binding is available to `Automatical`'s
    /// tie-break. No such binding exists in this crate's dependency stack,
    /// so host/reference-built matrices default to `false`; an executor
    /// backed by one would set this via [`Csr::with_sparselib_available`].
    sparselib_available: bool,
}

impl<V: Scalar, I: SparseIndex> Csr<V, I> {
    /// Build directly from CSR arrays. `row_ptrs.len()` must be `dim.rows + 1`
    /// and `row_ptrs` must be non-decreasing (spec §3 CSR invariant).
    pub fn from_parts(dim: Dim2, row_ptrs: Vec<I>, col_idxs: Vec<I>, values: Vec<V>) -> Result<Self> {
        if row_ptrs.len() != dim.rows + 1 {
            return Err(SparseError::DimensionMismatch {
                operation: "Csr::from_parts".to_string(),
                expected: (dim.rows + 1, 0),
                actual: (row_ptrs.len(), 0),
            });
        }
        if col_idxs.len() != values.len() {
            return Err(SparseError::DimensionMismatch {
                operation: "Csr::from_parts".to_string(),
                expected: (col_idxs.len(), col_idxs.len()),
                actual: (col_idxs.len(), values.len()),
            });
        }
        if row_ptrs.windows(2).any(|w| w[0] > w[1]) {
            return Err(SparseError::ValueMismatch {
                context: "Csr::from_parts".to_string(),
                reason: "row_ptrs must be non-decreasing".to_string(),
            });
        }
        Ok(Self {
            dim,
            row_ptrs,
            col_idxs,
            values,
            strategy: CsrStrategy::default(),
            sparselib_available: false,
        })
    }

    pub fn with_strategy(mut self, strategy: CsrStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Declares whether a vendor sparse BLAS binding backs this matrix's
    /// executor, for `CsrStrategy::Automatical`'s sparselib/size tie-break.
    pub fn with_sparselib_available(mut self, available: bool) -> Self {
        self.sparselib_available = available;
        self
    }

    pub fn strategy(&self) -> CsrStrategy {
        self.strategy
    }

    pub fn row_ptrs(&self) -> &[I] {
        &self.row_ptrs
    }

    pub fn col_idxs(&self) -> &[I] {
        &self.col_idxs
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn row_nnz(&self, row: usize) -> usize {
        self.row_ptrs[row + 1].to_usize() - self.row_ptrs[row].to_usize()
    }

    pub fn row(&self, row: usize) -> (&[I], &[V]) {
        let start = self.row_ptrs[row].to_usize();
        let end = self.row_ptrs[row + 1].to_usize();
        (&self.col_idxs[start..end], &self.values[start..end])
    }

    /// Index of `(row, col)` within `col_idxs`/`values`, if the pattern
    /// stores that entry explicitly.
    pub fn position(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptrs[row].to_usize();
        let end = self.row_ptrs[row + 1].to_usize();
        self.col_idxs[start..end]
            .binary_search_by_key(&col, |c| c.to_usize())
            .ok()
            .map(|offset| start + offset)
    }

    /// `A[row][col]`, or zero if the pattern doesn't store that entry.
    pub fn get(&self, row: usize, col: usize) -> V {
        self.position(row, col).map(|p| self.values[p]).unwrap_or_else(V::zero)
    }

    pub fn values_mut(&mut self) -> &mut [V] {
        &mut self.values
    }

    /// The matrix's main diagonal as a dense vector, zero where the pattern
    /// doesn't store an explicit `(i, i)` entry.
    pub fn extract_diagonal(&self) -> Vec<V> {
        let n = self.dim.rows.min(self.dim.cols);
        (0..n).map(|i| self.get(i, i)).collect()
    }

    pub fn read(data: &MatrixData<V, I>) -> Self {
        let mut rows_of: Vec<Vec<(I, V)>> = vec![Vec::new(); data.dim.rows];
        for (r, c, v) in data.iter() {
            rows_of[r.to_usize()].push((c, v));
        }
        for row in &mut rows_of {
            row.sort_by_key(|(c, _)| c.to_usize());
        }
        let mut row_ptrs = Vec::with_capacity(data.dim.rows + 1);
        let mut col_idxs = Vec::new();
        let mut values = Vec::new();
        row_ptrs.push(I::zero());
        for row in rows_of {
            for (c, v) in row {
                col_idxs.push(c);
                values.push(v);
            }
            row_ptrs.push(I::from_usize(col_idxs.len()));
        }
        Self {
            dim: data.dim,
            row_ptrs,
            col_idxs,
            values,
            strategy: CsrStrategy::default(),
            sparselib_available: false,
        }
    }

    pub fn write(&self) -> MatrixData<V, I> {
        let mut data = MatrixData::new(self.dim);
        for row in 0..self.dim.rows {
            let (cols, vals) = self.row(row);
            for (c, v) in cols.iter().zip(vals.iter()) {
                data.push(I::from_usize(row), *c, *v);
            }
        }
        data
    }
}

impl<V: Scalar, I: SparseIndex> LinOp<V> for Csr<V, I> {
    fn dim(&self) -> Dim2 {
        self.dim
    }

    fn apply(&self, x: &[V], y: &mut [V]) -> Result<()> {
        if x.len() != self.dim.cols || y.len() != self.dim.rows {
            return Err(SparseError::DimensionMismatch {
                operation: "Csr::apply".to_string(),
                expected: (self.dim.rows, self.dim.cols),
                actual: (y.len(), x.len()),
            });
        }
        let resolved = resolve_strategy(self.strategy, &self.row_ptrs, self.dim, self.sparselib_available);
        // Classical and LoadBalance produce identical results on a single
        // host thread; the strategy only changes how work would be split
        // across parallel workers on a device executor.
        let _ = resolved;
        for row in 0..self.dim.rows {
            let (cols, vals) = self.row(row);
            let mut acc = V::zero();
            for (c, v) in cols.iter().zip(vals.iter()) {
                acc = acc + *v * x[c.to_usize()];
            }
            y[row] = acc;
        }
        Ok(())
    }
}

impl<V: Scalar, I: SparseIndex> Transposable for Csr<V, I> {
    fn transpose(&self) -> Self {
        let t_dim = self.dim.transpose();
        let mut counts = vec![0usize; t_dim.rows];
        for &c in &self.col_idxs {
            counts[c.to_usize()] += 1;
        }
        let mut row_ptrs = vec![I::zero(); t_dim.rows + 1];
        let mut acc = 0usize;
        for r in 0..t_dim.rows {
            row_ptrs[r] = I::from_usize(acc);
            acc += counts[r];
        }
        row_ptrs[t_dim.rows] = I::from_usize(acc);

        let mut cursor: Vec<usize> = (0..t_dim.rows).map(|r| row_ptrs[r].to_usize()).collect();
        let mut col_idxs = vec![I::zero(); acc];
        let mut values = vec![V::zero(); acc];
        for row in 0..self.dim.rows {
            let (cols, vals) = self.row(row);
            for (c, v) in cols.iter().zip(vals.iter()) {
                let dst = cursor[c.to_usize()];
                col_idxs[dst] = I::from_usize(row);
                values[dst] = *v;
                cursor[c.to_usize()] += 1;
            }
        }
        Self {
            dim: t_dim,
            row_ptrs,
            col_idxs,
            values,
            strategy: self.strategy,
            sparselib_available: self.sparselib_available,
        }
    }
}

impl<V: Scalar, I: SparseIndex> PolymorphicObject for Csr<V, I> {
    fn format_name(&self) -> &'static str {
        "csr"
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }
}

impl<V: Scalar, I: SparseIndex> ConvertTo<Dense<V>> for Csr<V, I> {
    fn convert_to(&self) -> Dense<V> {
        Dense::read(&self.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Csr<f64, i32> {
        // [[1,0,2],[0,3,0],[4,0,5]]
        Csr::from_parts(
            Dim2::square(3),
            vec![0, 2, 3, 5],
            vec![0, 2, 1, 0, 2],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
        .unwrap()
    }

    #[test]
    fn spmv_matches_hand_computation() {
        let m = sample();
        let x = vec![1.0, 1.0, 1.0];
        let mut y = vec![0.0; 3];
        m.apply(&x, &mut y).unwrap();
        assert_eq!(y, vec![3.0, 3.0, 9.0]);
    }

    #[test]
    fn non_decreasing_row_ptrs_enforced() {
        let err = Csr::<f64, i32>::from_parts(Dim2::square(2), vec![0, 3, 1], vec![], vec![]);
        assert!(err.is_err());
    }

    #[test]
    fn transpose_of_transpose_is_original() {
        let m = sample();
        let tt = m.transpose().transpose();
        assert_eq!(tt.row_ptrs(), m.row_ptrs());
        assert_eq!(tt.col_idxs(), m.col_idxs());
        assert_eq!(tt.values(), m.values());
    }

    #[test]
    fn round_trip_through_matrix_data() {
        let m = sample();
        let data: MatrixData<f64, i32> = m.write();
        let back = Csr::read(&data);
        assert_eq!(back.row_ptrs(), m.row_ptrs());
        assert_eq!(back.col_idxs(), m.col_idxs());
        assert_eq!(back.values(), m.values());
    }

    #[test]
    fn extract_diagonal_reads_explicit_entries() {
        let m = sample();
        assert_eq!(m.extract_diagonal(), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn convert_to_dense_matches_get() {
        let m = sample();
        let dense: Dense<f64> = m.convert_to();
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(dense.get(r, c), m.get(r, c));
            }
        }
    }
}
