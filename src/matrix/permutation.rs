//! Row/column permutations (spec §4.D) applied to reorder a matrix in place
//! of re-deriving it, e.g. for fill-reducing orderings ahead of ILU.

use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::data::MatrixData;
use crate::types::{Scalar, SparseIndex};

/// A permutation of `0..n`, stored as `perm[i]` = the original index now at
/// position `i`.
#[derive(Clone, Debug)]
pub struct Permutation<I> {
    perm: Vec<I>,
}

/// Which side(s) of a matrix a permutation is applied to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PermuteMask {
    Rows,
    Cols,
    Both,
}

impl<I: SparseIndex> Permutation<I> {
    pub fn new(perm: Vec<I>) -> Result<Self> {
        let n = perm.len();
        let mut seen = vec![false; n];
        for &p in &perm {
            let idx = p.to_usize();
            if idx >= n || seen[idx] {
                return Err(SparseError::ValueMismatch {
                    context: "Permutation::new".to_string(),
                    reason: format!("{idx} is not a valid permutation entry for length {n}"),
                });
            }
            seen[idx] = true;
        }
        Ok(Self { perm })
    }

    pub fn identity(n: usize) -> Self {
        Self { perm: (0..n).map(I::from_usize).collect() }
    }

    pub fn len(&self) -> usize {
        self.perm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    pub fn as_slice(&self) -> &[I] {
        &self.perm
    }

    pub fn inverse(&self) -> Self {
        let mut inv = vec![I::zero(); self.perm.len()];
        for (i, &p) in self.perm.iter().enumerate() {
            inv[p.to_usize()] = I::from_usize(i);
        }
        Self { perm: inv }
    }

    pub fn apply_to_csr<V: Scalar>(&self, csr: &Csr<V, I>, mask: PermuteMask) -> Csr<V, I> {
        let data: MatrixData<V, I> = csr.write();
        let mut permuted = MatrixData::new(data.dim);
        let row_target = self.inverse();
        for (r, c, v) in data.iter() {
            let new_r = match mask {
                PermuteMask::Rows | PermuteMask::Both => row_target.perm[r.to_usize()],
                PermuteMask::Cols => r,
            };
            let new_c = match mask {
                PermuteMask::Cols | PermuteMask::Both => row_target.perm[c.to_usize()],
                PermuteMask::Rows => c,
            };
            permuted.push(new_r, new_c, v);
        }
        Csr::read(&permuted)
    }
}

/// Reorder `a`'s rows by `p`: row `i` of the result holds the row that `p`
/// puts at position `i`.
pub fn row_permute<V: Scalar, I: SparseIndex>(p: &Permutation<I>, a: &Csr<V, I>) -> Csr<V, I> {
    p.apply_to_csr(a, PermuteMask::Rows)
}

/// Reorder `a`'s columns by `p`.
pub fn column_permute<V: Scalar, I: SparseIndex>(p: &Permutation<I>, a: &Csr<V, I>) -> Csr<V, I> {
    p.apply_to_csr(a, PermuteMask::Cols)
}

/// `inverse_row_permute(p, a) == row_permute(p.inverse(), a)`: undoes a
/// previous `row_permute(p, ...)`.
pub fn inverse_row_permute<V: Scalar, I: SparseIndex>(p: &Permutation<I>, a: &Csr<V, I>) -> Csr<V, I> {
    row_permute(&p.inverse(), a)
}

/// `inverse_column_permute(p, a) == column_permute(p.inverse(), a)`.
pub fn inverse_column_permute<V: Scalar, I: SparseIndex>(p: &Permutation<I>, a: &Csr<V, I>) -> Csr<V, I> {
    column_permute(&p.inverse(), a)
}
