//! The multi-way merge at the core of SpGEMM (spec §4.E): for each row `i`
//! of `A`, merge the rows of `B` indexed by `A`'s nonzero columns in that
//! row, summing values that land on the same output column.
//!
//! Run as two passes over the same per-row merge so the row pointers the
//! count pass produces exactly match what the kernel pass writes (spec §8
//! two-pass coherence invariant) — both passes walk the identical sorted
//! merge, the kernel pass just additionally accumulates values.

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::linop::LinOp;
use crate::spgemm::tier::choose_tier;
use crate::spgemm::work::row_fanin;
use crate::types::{Scalar, SparseIndex};
use num_traits::Zero;
use std::collections::BTreeMap;

/// Merge one output row: gather `(col, value)` pairs from `b`'s rows keyed
/// by `a_row`'s columns, summing duplicates, sorted by column ascending.
fn merge_row<V: Scalar, I: SparseIndex>(
    a_cols: &[I],
    a_vals: &[V],
    b: &Csr<V, I>,
) -> BTreeMap<usize, V> {
    let mut acc: BTreeMap<usize, V> = BTreeMap::new();
    for (a_col, a_val) in a_cols.iter().zip(a_vals.iter()) {
        let (b_cols, b_vals) = b.row(a_col.to_usize());
        for (b_col, b_val) in b_cols.iter().zip(b_vals.iter()) {
            let entry = acc.entry(b_col.to_usize()).or_insert_with(V::zero);
            *entry = *entry + *a_val * *b_val;
        }
    }
    acc
}

/// Count pass: row pointers for `A * B`, without materializing values.
pub fn count_pass<V: Scalar, I: SparseIndex>(a: &Csr<V, I>, b: &Csr<V, I>) -> Result<Vec<I>> {
    if a.dim().cols != b.dim().rows {
        return Err(SparseError::DimensionMismatch {
            operation: "spgemm::count_pass".to_string(),
            expected: (a.dim().cols, a.dim().cols),
            actual: (a.dim().cols, b.dim().rows),
        });
    }
    let mut row_ptrs = Vec::with_capacity(a.dim().rows + 1);
    let mut acc = 0usize;
    row_ptrs.push(I::from_usize(0));
    for row in 0..a.dim().rows {
        let (cols, vals) = a.row(row);
        let tier = choose_tier(row_fanin(a, b, row));
        tracing::trace!(row, tier = ?tier, "spgemm: count pass row");
        acc += merge_row(cols, vals, b).len();
        row_ptrs.push(I::from_usize(acc));
    }
    Ok(row_ptrs)
}

/// Kernel pass: fill column indices and values into the slots `count_pass`
/// reserved. `row_ptrs` must be exactly `count_pass`'s output.
pub fn kernel_pass<V: Scalar, I: SparseIndex>(
    a: &Csr<V, I>,
    b: &Csr<V, I>,
    row_ptrs: &[I],
) -> (Vec<I>, Vec<V>) {
    let nnz = row_ptrs[a.dim().rows].to_usize();
    let mut col_idxs = Vec::with_capacity(nnz);
    let mut values = Vec::with_capacity(nnz);
    for row in 0..a.dim().rows {
        let (cols, vals) = a.row(row);
        let merged = merge_row(cols, vals, b);
        for (c, v) in merged {
            col_idxs.push(I::from_usize(c));
            values.push(v);
        }
    }
    (col_idxs, values)
}

/// `A * B`, driving the count and kernel passes.
pub fn multiply<V: Scalar, I: SparseIndex>(a: &Csr<V, I>, b: &Csr<V, I>) -> Result<Csr<V, I>> {
    let row_ptrs = count_pass(a, b)?;
    let (col_idxs, values) = kernel_pass(a, b, &row_ptrs);
    debug_assert_eq!(row_ptrs[a.dim().rows].to_usize(), col_idxs.len(), "count/kernel pass disagree");
    Csr::from_parts(Dim2::new(a.dim().rows, b.dim().cols), row_ptrs, col_idxs, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::convert::dense_from_csr;
    use crate::matrix::dense::Dense;

    #[test]
    fn product_matches_dense_reference() {
        // A = [[1,2],[0,3]], B = [[1,0],[4,5]]
        let a: Csr<f64, i32> = Csr::from_parts(
            Dim2::square(2),
            vec![0, 2, 3],
            vec![0, 1, 1],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();
        let b: Csr<f64, i32> = Csr::from_parts(
            Dim2::square(2),
            vec![0, 1, 3],
            vec![0, 0, 1],
            vec![1.0, 4.0, 5.0],
        )
        .unwrap();
        let product = multiply(&a, &b).unwrap();
        let dense = dense_from_csr(&product);

        let a_dense = dense_from_csr(&a);
        let b_dense = dense_from_csr(&b);
        let mut expected: Dense<f64> = Dense::zeros(Dim2::square(2));
        for i in 0..2 {
            for j in 0..2 {
                let mut acc = 0.0;
                for k in 0..2 {
                    acc += a_dense.get(i, k) * b_dense.get(k, j);
                }
                expected.set(i, j, acc);
            }
        }
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(dense.get(i, j), expected.get(i, j));
            }
        }
    }

    #[test]
    fn count_and_kernel_pass_agree_on_row_pointers() {
        let a: Csr<f64, i32> = Csr::from_parts(
            Dim2::square(3),
            vec![0, 1, 2, 3],
            vec![1, 2, 0],
            vec![1.0, 1.0, 1.0],
        )
        .unwrap();
        let b: Csr<f64, i32> = Csr::from_parts(
            Dim2::square(3),
            vec![0, 1, 2, 3],
            vec![0, 1, 2],
            vec![2.0, 3.0, 4.0],
        )
        .unwrap();
        let row_ptrs = count_pass(&a, &b).unwrap();
        let (col_idxs, _) = kernel_pass(&a, &b, &row_ptrs);
        assert_eq!(row_ptrs[a.dim().rows].to_usize(), col_idxs.len());
    }

    #[test]
    fn incompatible_inner_dimension_is_an_error() {
        let a: Csr<f64, i32> = Csr::from_parts(Dim2::new(1, 2), vec![0, 0], vec![], vec![]).unwrap();
        let b: Csr<f64, i32> = Csr::from_parts(Dim2::new(3, 1), vec![0, 0, 0, 0], vec![], vec![]).unwrap();
        assert!(multiply(&a, &b).is_err());
    }
}
