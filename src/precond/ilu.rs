//! ILU(0) and ParILU (spec §4.G): an incomplete LU factorization sharing
//! `a`'s sparsity pattern, stored as one combined CSR (unit diagonal on `L`
//! implied, not stored).

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::linop::LinOp;
use crate::types::{Scalar, SparseIndex};
use num_traits::Zero;

/// Combined L/U factor sharing `a`'s pattern: below the diagonal is `L`
/// (unit diagonal implied), on and above is `U`.
#[derive(Clone, Debug)]
pub struct IluFactors<V, I> {
    lu: Csr<V, I>,
}

/// Sequential ILU(0): standard left-looking elimination restricted to `a`'s
/// pattern (no fill-in).
pub fn generate_ilu0<V: Scalar, I: SparseIndex>(a: &Csr<V, I>) -> Result<IluFactors<V, I>> {
    if !a.dim().is_square() {
        return Err(SparseError::DimensionMismatch {
            operation: "ilu::generate_ilu0".to_string(),
            expected: (a.dim().rows, a.dim().rows),
            actual: (a.dim().rows, a.dim().cols),
        });
    }
    let mut lu = a.clone();
    let n = lu.dim().rows;
    for i in 0..n {
        let row_cols: Vec<usize> = lu.row(i).0.iter().map(|c| c.to_usize()).collect();
        for &k in row_cols.iter().take_while(|&&c| c < i) {
            let a_ik = lu.get(i, k);
            let a_kk = lu.get(k, k);
            if a_kk.is_zero() {
                return Err(SparseError::ValueMismatch {
                    context: "ilu::generate_ilu0".to_string(),
                    reason: format!("zero pivot at row {k}"),
                });
            }
            let factor = a_ik / a_kk;
            if let Some(p) = lu.position(i, k) {
                lu.values_mut()[p] = factor;
            }
            for &j in &row_cols {
                if j <= k {
                    continue;
                }
                if let Some(p_ij) = lu.position(i, j) {
                    let u_kj = lu.get(k, j);
                    lu.values_mut()[p_ij] = lu.values()[p_ij] - factor * u_kj;
                }
            }
        }
    }
    Ok(IluFactors { lu })
}

/// ParILU fixed-point sweep (spec §4.G): repeatedly re-evaluate every
/// pattern entry from the elimination identity using the current factor
/// estimate, rather than the strict row-by-row elimination order ILU(0)
/// uses. Converges to the same factors for a pattern where ILU(0) is
/// well-defined; unlike `generate_ilu0` this has no sequential row
/// dependency, which is the point on a parallel executor.
pub fn generate_parilu<V: Scalar, I: SparseIndex>(a: &Csr<V, I>, sweeps: usize) -> Result<IluFactors<V, I>> {
    if !a.dim().is_square() {
        return Err(SparseError::DimensionMismatch {
            operation: "ilu::generate_parilu".to_string(),
            expected: (a.dim().rows, a.dim().rows),
            actual: (a.dim().rows, a.dim().cols),
        });
    }
    let mut lu = a.clone();
    for sweep in 0..sweeps {
        let snapshot = lu.clone();
        for i in 0..lu.dim().rows {
            let (cols, _) = snapshot.row(i);
            for &c in cols {
                let j = c.to_usize();
                let a_ij = a.get(i, j);
                let bound = i.min(j);
                let mut sum = V::zero();
                for k in 0..bound {
                    sum = sum + snapshot.get(i, k) * snapshot.get(k, j);
                }
                let value = if j < i {
                    let u_jj = snapshot.get(j, j);
                    if u_jj.is_zero() {
                        return Err(SparseError::ValueMismatch {
                            context: "ilu::generate_parilu".to_string(),
                            reason: format!("zero pivot at row {j} during sweep {sweep}"),
                        });
                    }
                    (a_ij - sum) / u_jj
                } else {
                    a_ij - sum
                };
                if let Some(p) = lu.position(i, j) {
                    lu.values_mut()[p] = value;
                }
            }
        }
    }
    Ok(IluFactors { lu })
}

impl<V: Scalar, I: SparseIndex> IluFactors<V, I> {
    /// Solve `L * U * x = b` via forward then backward substitution,
    /// restricted to the stored pattern (`L`'s diagonal is implicitly 1).
    pub fn apply(&self, b: &[V], x: &mut [V]) -> Result<()> {
        let n = self.lu.dim().rows;
        if b.len() != n || x.len() != n {
            return Err(SparseError::DimensionMismatch {
                operation: "IluFactors::apply".to_string(),
                expected: (n, n),
                actual: (b.len(), x.len()),
            });
        }
        let mut y = vec![V::zero(); n];
        for i in 0..n {
            let (cols, _) = self.lu.row(i);
            let mut sum = b[i];
            for &c in cols {
                let j = c.to_usize();
                if j < i {
                    sum = sum - self.lu.get(i, j) * y[j];
                }
            }
            y[i] = sum;
        }
        for i in (0..n).rev() {
            let (cols, _) = self.lu.row(i);
            let mut sum = y[i];
            for &c in cols {
                let j = c.to_usize();
                if j > i {
                    sum = sum - self.lu.get(i, j) * x[j];
                }
            }
            let diag = self.lu.get(i, i);
            if diag.is_zero() {
                return Err(SparseError::ValueMismatch {
                    context: "IluFactors::apply".to_string(),
                    reason: format!("zero pivot at row {i}"),
                });
            }
            x[i] = sum / diag;
        }
        Ok(())
    }

    pub fn lu(&self) -> &Csr<V, I> {
        &self.lu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dense3() -> Csr<f64, i32> {
        // Fully dense 3x3, positive-definite-ish, so ILU(0) == exact LU.
        Csr::from_parts(
            Dim2::square(3),
            vec![0, 3, 6, 9],
            vec![0, 1, 2, 0, 1, 2, 0, 1, 2],
            vec![4.0, 3.0, 2.0, 6.0, 3.0, 1.0, -4.0, -12.0, 5.0],
        )
        .unwrap()
    }

    #[test]
    fn ilu0_solves_exactly_on_a_dense_pattern() {
        let a = dense3();
        let factors = generate_ilu0(&a).unwrap();
        let b = vec![1.0, 2.0, 3.0];
        let mut x = vec![0.0; 3];
        factors.apply(&b, &mut x).unwrap();

        use crate::matrix::linop::LinOp;
        let mut reconstructed = vec![0.0; 3];
        a.apply(&x, &mut reconstructed).unwrap();
        for i in 0..3 {
            assert!((reconstructed[i] - b[i]).abs() < 1e-8);
        }
    }

    #[test]
    fn parilu_converges_to_same_factors_as_ilu0_on_dense_pattern() {
        let a = dense3();
        let seq = generate_ilu0(&a).unwrap();
        let par = generate_parilu(&a, 20).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert!((seq.lu().get(i, j) - par.lu().get(i, j)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn non_square_input_rejected() {
        let a: Csr<f64, i32> = Csr::from_parts(Dim2::new(2, 3), vec![0, 0, 0], vec![], vec![]).unwrap();
        assert!(generate_ilu0(&a).is_err());
    }
}
