//! Work estimation for an `A * B` SpGEMM, used to size scratch buffers and
//! to pick a tier before the count pass runs (spec §4.E).

use crate::matrix::csr::Csr;
use crate::matrix::linop::LinOp;
use crate::types::{Scalar, SparseIndex};

/// Sum, over every nonzero `(i, j)` of `A`, of `B`'s row-`j` length. This
/// over-counts the true output nnz (entries may collide within a row and
/// get summed together) but bounds the scratch space a row's merge needs.
pub fn estimate_work<V: Scalar, I: SparseIndex>(a: &Csr<V, I>, b: &Csr<V, I>) -> usize {
    let mut total = 0usize;
    for row in 0..a.dim().rows {
        total += row_fanin(a, b, row);
    }
    total
}

/// Fan-in for one row of `A`: sum of `B`'s row lengths over `A`'s nonzero
/// columns in that row.
pub fn row_fanin<V: Scalar, I: SparseIndex>(a: &Csr<V, I>, b: &Csr<V, I>, row: usize) -> usize {
    let (cols, _) = a.row(row);
    cols.iter().map(|c| b.row_nnz(c.to_usize())).sum()
}
