//! ELLPACK format (spec §4.D): every row padded to `max_nnz_per_row`,
//! stored column-major so a fixed-stride device kernel can stream it.
//! Padding slots carry `col_idx = row` and `value = 0`, so a consumer can
//! fold every slot into the same multiply-accumulate with no branch: the
//! padded slot multiplies by zero instead of being skipped.

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::data::MatrixData;
use crate::matrix::dense::Dense;
use crate::matrix::linop::{ConvertTo, LinOp, PolymorphicObject};
use crate::types::{Scalar, SparseIndex};
use num_traits::Zero;

#[derive(Clone, Debug)]
pub struct Ell<V, I> {
    dim: Dim2,
    max_nnz_per_row: usize,
    /// How many of each row's `max_nnz_per_row` slots are real entries; the
    /// rest are `(row, 0)` padding. Needed to reconstruct CSR/`nnz()`
    /// without values stored double as a discriminator.
    row_nnz: Vec<usize>,
    /// Column-major: `col_idxs[slot * dim.rows + row]`.
    col_idxs: Vec<I>,
    values: Vec<V>,
}

impl<V: Scalar, I: SparseIndex> Ell<V, I> {
    /// Build from a CSR source; rows with more than `max_nnz_per_row`
    /// nonzeros are an error (spec §4.D: ELL requires a caller-supplied
    /// upper bound that the data must actually satisfy).
    pub fn from_csr(csr: &Csr<V, I>, max_nnz_per_row: usize) -> Result<Self> {
        let dim = csr.dim();
        let mut col_idxs = vec![I::zero(); max_nnz_per_row * dim.rows];
        let mut values = vec![V::zero(); max_nnz_per_row * dim.rows];
        let mut row_nnz = vec![0usize; dim.rows];
        for row in 0..dim.rows {
            let (cols, vals) = csr.row(row);
            if cols.len() > max_nnz_per_row {
                return Err(SparseError::OutOfBounds {
                    index: cols.len(),
                    limit: max_nnz_per_row,
                    context: format!("Ell::from_csr row {row}"),
                });
            }
            row_nnz[row] = cols.len();
            for slot in 0..max_nnz_per_row {
                col_idxs[slot * dim.rows + row] = I::from_usize(row);
            }
            for (slot, (c, v)) in cols.iter().zip(vals.iter()).enumerate() {
                col_idxs[slot * dim.rows + row] = *c;
                values[slot * dim.rows + row] = *v;
            }
        }
        Ok(Self { dim, max_nnz_per_row, row_nnz, col_idxs, values })
    }

    pub fn to_csr(&self) -> Csr<V, I> {
        let mut row_ptrs = Vec::with_capacity(self.dim.rows + 1);
        let mut col_idxs = Vec::new();
        let mut values = Vec::new();
        row_ptrs.push(I::zero());
        for row in 0..self.dim.rows {
            for slot in 0..self.row_nnz[row] {
                col_idxs.push(self.col_idxs[slot * self.dim.rows + row]);
                values.push(self.values[slot * self.dim.rows + row]);
            }
            row_ptrs.push(I::from_usize(col_idxs.len()));
        }
        Csr::from_parts(self.dim, row_ptrs, col_idxs, values).expect("ELL->CSR rows are non-decreasing by construction")
    }

    pub fn read(data: &MatrixData<V, I>, max_nnz_per_row: usize) -> Result<Self> {
        Self::from_csr(&Csr::read(data), max_nnz_per_row)
    }

    pub fn write(&self) -> MatrixData<V, I> {
        self.to_csr().write()
    }

    pub fn max_nnz_per_row(&self) -> usize {
        self.max_nnz_per_row
    }
}

impl<V: Scalar, I: SparseIndex> LinOp<V> for Ell<V, I> {
    fn dim(&self) -> Dim2 {
        self.dim
    }

    fn apply(&self, x: &[V], y: &mut [V]) -> Result<()> {
        if x.len() != self.dim.cols || y.len() != self.dim.rows {
            return Err(SparseError::DimensionMismatch {
                operation: "Ell::apply".to_string(),
                expected: (self.dim.rows, self.dim.cols),
                actual: (y.len(), x.len()),
            });
        }
        for row in 0..self.dim.rows {
            let mut acc = V::zero();
            for slot in 0..self.max_nnz_per_row {
                let c = self.col_idxs[slot * self.dim.rows + row];
                acc = acc + self.values[slot * self.dim.rows + row] * x[c.to_usize()];
            }
            y[row] = acc;
        }
        Ok(())
    }
}

impl<V: Scalar, I: SparseIndex> PolymorphicObject for Ell<V, I> {
    fn format_name(&self) -> &'static str {
        "ell"
    }

    fn nnz(&self) -> usize {
        self.row_nnz.iter().sum()
    }
}

impl<V: Scalar, I: SparseIndex> ConvertTo<Csr<V, I>> for Ell<V, I> {
    fn convert_to(&self) -> Csr<V, I> {
        self.to_csr()
    }
}

impl<V: Scalar, I: SparseIndex> ConvertTo<Dense<V>> for Ell<V, I> {
    fn convert_to(&self) -> Dense<V> {
        Dense::read(&self.to_csr().write())
    }
}
