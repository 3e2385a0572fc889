//! Two-phase format conversion (spec §4.D): a sizing pass computes the
//! destination row pointers, a fill pass writes column indices and values
//! into exactly the slots the sizing pass reserved. Every format's
//! `from_csr`/`to_csr` already composes these two passes internally; this
//! module exposes the split explicitly for the Dense<->CSR pair, which spec
//! §8 exercises directly as a round-trip scenario.

use crate::dim::Dim2;
use crate::matrix::csr::Csr;
use crate::matrix::dense::Dense;
use crate::matrix::linop::LinOp;
use crate::types::{Scalar, SparseIndex};
use num_traits::Zero;

/// Sizing phase: row pointers for the CSR that `fill_csr_from_dense` will
/// populate, i.e. a prefix sum of nonzero counts per row.
pub fn size_csr_from_dense<V: Scalar, I: SparseIndex>(dense: &Dense<V>) -> Vec<I> {
    let dim = dense.dim();
    let mut row_ptrs = Vec::with_capacity(dim.rows + 1);
    let mut acc = 0usize;
    row_ptrs.push(I::from_usize(0));
    for r in 0..dim.rows {
        for c in 0..dim.cols {
            if !dense.get(r, c).is_zero() {
                acc += 1;
            }
        }
        row_ptrs.push(I::from_usize(acc));
    }
    row_ptrs
}

/// Fill phase: given the row pointers `size_csr_from_dense` computed, write
/// the column indices and values.
pub fn fill_csr_from_dense<V: Scalar, I: SparseIndex>(dense: &Dense<V>, row_ptrs: &[I]) -> (Vec<I>, Vec<V>) {
    let dim = dense.dim();
    let nnz = row_ptrs[dim.rows].to_usize();
    let mut col_idxs = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    for r in 0..dim.rows {
        for c in 0..dim.cols {
            let v = dense.get(r, c);
            if !v.is_zero() {
                col_idxs.push(I::from_usize(c));
                values.push(v);
            }
        }
    }
    (col_idxs, values)
}

pub fn csr_from_dense<V: Scalar, I: SparseIndex>(dense: &Dense<V>) -> Csr<V, I> {
    let row_ptrs = size_csr_from_dense(dense);
    let (col_idxs, values) = fill_csr_from_dense(dense, &row_ptrs);
    Csr::from_parts(dense.dim(), row_ptrs, col_idxs, values)
        .expect("sizing/fill passes agree on row pointer layout by construction")
}

pub fn dense_from_csr<V: Scalar, I: SparseIndex>(csr: &Csr<V, I>) -> Dense<V> {
    let mut dense = Dense::zeros(csr.dim());
    for row in 0..csr.dim().rows {
        let (cols, vals) = csr.row(row);
        for (c, v) in cols.iter().zip(vals.iter()) {
            dense.set(row, c.to_usize(), *v);
        }
    }
    dense
}
