//! Incomplete sparse approximate inverse (spec §4.G): approximates `L^-1`
//! (or `U^-1`) with a matrix carrying the same sparsity pattern as `L`
//! (resp. `U`). For each row the pattern induces a small dense triangular
//! system, solved directly by substitution rather than a general solver —
//! the submatrix is triangular by construction because the pattern columns
//! inherit the original row order.

use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::linop::LinOp;
use crate::types::{Scalar, SparseIndex};
use num_traits::{One, Zero};

/// Approximate inverse of a lower-triangular `l` (unit or non-unit
/// diagonal), same sparsity pattern as `l`.
pub fn generate_lower<V: Scalar, I: SparseIndex>(l: &Csr<V, I>) -> Result<Csr<V, I>> {
    generate_triangular(l, true)
}

/// Approximate inverse of an upper-triangular `u`, same sparsity pattern.
pub fn generate_upper<V: Scalar, I: SparseIndex>(u: &Csr<V, I>) -> Result<Csr<V, I>> {
    generate_triangular(u, false)
}

fn generate_triangular<V: Scalar, I: SparseIndex>(a: &Csr<V, I>, lower: bool) -> Result<Csr<V, I>> {
    let n = a.dim().rows;
    let mut row_ptrs = vec![I::zero(); n + 1];
    let mut col_idxs = Vec::new();
    let mut values = Vec::new();
    for i in 0..n {
        let (cols, _) = a.row(i);
        let pattern: Vec<usize> = cols.iter().map(|c| c.to_usize()).collect();
        let k = pattern.len();
        let pivot_pos = pattern.iter().position(|&c| c == i).ok_or_else(|| SparseError::ValueMismatch {
            context: "isai::generate_triangular".to_string(),
            reason: format!("row {i} has no diagonal entry in its pattern"),
        })?;

        let mut sub = vec![V::zero(); k * k];
        for (ai, &ra) in pattern.iter().enumerate() {
            for (bi, &cb) in pattern.iter().enumerate() {
                let in_triangle = if lower { cb <= ra } else { cb >= ra };
                if in_triangle {
                    sub[ai * k + bi] = a.get(ra, cb);
                }
            }
        }

        let mut rhs = vec![V::zero(); k];
        rhs[pivot_pos] = V::one();
        let sol = if lower {
            forward_substitute(&sub, &rhs, k)?
        } else {
            backward_substitute(&sub, &rhs, k)?
        };

        for (slot, &c) in pattern.iter().enumerate() {
            col_idxs.push(I::from_usize(c));
            values.push(sol[slot]);
        }
        row_ptrs[i + 1] = I::from_usize(col_idxs.len());
    }
    Csr::from_parts(a.dim(), row_ptrs, col_idxs, values)
}

fn forward_substitute<V: Scalar>(a: &[V], rhs: &[V], n: usize) -> Result<Vec<V>> {
    let mut x = vec![V::zero(); n];
    for i in 0..n {
        let mut sum = rhs[i];
        for j in 0..i {
            sum = sum - a[i * n + j] * x[j];
        }
        let diag = a[i * n + i];
        if diag.is_zero() {
            return Err(SparseError::ValueMismatch {
                context: "isai::forward_substitute".to_string(),
                reason: format!("zero pivot at local row {i}"),
            });
        }
        x[i] = sum / diag;
    }
    Ok(x)
}

fn backward_substitute<V: Scalar>(a: &[V], rhs: &[V], n: usize) -> Result<Vec<V>> {
    let mut x = vec![V::zero(); n];
    for i in (0..n).rev() {
        let mut sum = rhs[i];
        for j in (i + 1)..n {
            sum = sum - a[i * n + j] * x[j];
        }
        let diag = a[i * n + i];
        if diag.is_zero() {
            return Err(SparseError::ValueMismatch {
                context: "isai::backward_substitute".to_string(),
                reason: format!("zero pivot at local row {i}"),
            });
        }
        x[i] = sum / diag;
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::Dim2;
    use crate::matrix::convert::dense_from_csr;
    use crate::matrix::dense::Dense;

    #[test]
    fn lower_triangular_dense_inverse_matches_direct_inversion() {
        // Dense (fully populated, so ISAI is exact, not approximate).
        let l: Csr<f64, i32> = Csr::from_parts(
            Dim2::square(3),
            vec![0, 1, 3, 6],
            vec![0, 0, 1, 0, 1, 2],
            vec![2.0, 1.0, 3.0, 1.0, 1.0, 4.0],
        )
        .unwrap();
        let approx = generate_lower(&l).unwrap();
        let l_dense = dense_from_csr(&l);
        let m_dense = dense_from_csr(&approx);
        let mut product: Dense<f64> = Dense::zeros(Dim2::square(3));
        for i in 0..3 {
            for j in 0..3 {
                let mut acc = 0.0;
                for k in 0..3 {
                    acc += l_dense.get(i, k) * m_dense.get(k, j);
                }
                product.set(i, j, acc);
            }
        }
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product.get(i, j) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn missing_diagonal_is_an_error() {
        let l: Csr<f64, i32> = Csr::from_parts(Dim2::square(2), vec![0, 1, 1], vec![0], vec![1.0]).unwrap();
        assert!(generate_lower(&l).is_err());
    }
}
