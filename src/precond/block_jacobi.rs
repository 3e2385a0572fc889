//! Block-Jacobi preconditioner (spec §4.G): partition the diagonal into
//! fixed-size blocks, invert each block densely, apply block-diagonally.

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::dense::Dense;
use crate::matrix::linop::LinOp;
use crate::types::{Scalar, SparseIndex};
use num_traits::{Float, One, Zero};

/// Detect `a`'s diagonal block structure by following its dense connected
/// components: starting a block at row `start`, grow it past row `end`
/// whenever some row already in `[start, end)` has a nonzero at a column
/// `>= end`, i.e. the block isn't closed yet. Growth stops at
/// `max_block_size` even if the component is wider, so a long row forces a
/// split rather than dragging the whole remainder into one block.
pub fn find_blocks<V: Scalar, I: SparseIndex>(a: &Csr<V, I>, max_block_size: usize) -> Result<Vec<(usize, usize)>> {
    if max_block_size == 0 {
        return Err(SparseError::ValueMismatch {
            context: "block_jacobi::find_blocks".to_string(),
            reason: "max_block_size must be nonzero".to_string(),
        });
    }
    let dim = a.dim();
    if !dim.is_square() {
        return Err(SparseError::DimensionMismatch {
            operation: "block_jacobi::find_blocks".to_string(),
            expected: (dim.rows, dim.rows),
            actual: (dim.rows, dim.cols),
        });
    }
    let mut blocks = Vec::new();
    let mut start = 0;
    while start < dim.rows {
        let cap = (start + max_block_size).min(dim.rows);
        let mut end = (start + 1).min(cap);
        loop {
            let mut reach = end;
            for row in start..end {
                for &c in a.row(row).0 {
                    let c = c.to_usize();
                    if c >= start && c + 1 > reach {
                        reach = c + 1;
                    }
                }
            }
            reach = reach.min(cap);
            if reach <= end {
                break;
            }
            end = reach;
        }
        blocks.push((start, end));
        start = end;
    }
    Ok(blocks)
}

/// Extract and invert each diagonal block of `a` via Gauss-Jordan
/// elimination with partial pivoting.
pub fn generate<V: Scalar, I: SparseIndex>(a: &Csr<V, I>, blocks: &[(usize, usize)]) -> Result<Vec<Dense<V>>> {
    blocks
        .iter()
        .map(|&(start, end)| {
            let n = end - start;
            let mut block = Dense::zeros(Dim2::square(n));
            for r in 0..n {
                for c in 0..n {
                    block.set(r, c, a.get(start + r, start + c));
                }
            }
            invert_dense(&block)
        })
        .collect()
}

/// `y = block_diag(inverses) * x`.
pub fn apply<V: Scalar>(blocks: &[(usize, usize)], inverses: &[Dense<V>], x: &[V], y: &mut [V]) -> Result<()> {
    if blocks.len() != inverses.len() {
        return Err(SparseError::ValueMismatch {
            context: "block_jacobi::apply".to_string(),
            reason: "blocks and inverses must have the same length".to_string(),
        });
    }
    for (&(start, end), inv) in blocks.iter().zip(inverses.iter()) {
        let n = end - start;
        let mut local_y = vec![V::zero(); n];
        inv.apply(&x[start..end], &mut local_y)?;
        y[start..end].copy_from_slice(&local_y);
    }
    Ok(())
}

fn invert_dense<V: Scalar>(m: &Dense<V>) -> Result<Dense<V>> {
    let n = m.dim().rows;
    let mut aug = Dense::zeros(Dim2::new(n, 2 * n));
    for r in 0..n {
        for c in 0..n {
            aug.set(r, c, m.get(r, c));
        }
        aug.set(r, n + r, V::one());
    }
    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| aug.get(a, col).abs().partial_cmp(&aug.get(b, col).abs()).unwrap())
            .unwrap();
        if aug.get(pivot_row, col).is_zero() {
            return Err(SparseError::ValueMismatch {
                context: "block_jacobi::invert_dense".to_string(),
                reason: format!("block is singular at column {col}"),
            });
        }
        if pivot_row != col {
            for c in 0..2 * n {
                let tmp = aug.get(col, c);
                aug.set(col, c, aug.get(pivot_row, c));
                aug.set(pivot_row, c, tmp);
            }
        }
        let pivot = aug.get(col, col);
        for c in 0..2 * n {
            aug.set(col, c, aug.get(col, c) / pivot);
        }
        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = aug.get(r, col);
            if factor.is_zero() {
                continue;
            }
            for c in 0..2 * n {
                let value = aug.get(r, c) - factor * aug.get(col, c);
                aug.set(r, c, value);
            }
        }
    }
    let mut inv = Dense::zeros(Dim2::square(n));
    for r in 0..n {
        for c in 0..n {
            inv.set(r, c, aug.get(r, n + c));
        }
    }
    Ok(inv)
}
