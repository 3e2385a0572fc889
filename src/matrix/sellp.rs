//! Sliced ELLPACK (spec §4.D): rows grouped into fixed-size slices, each
//! slice padded independently to its own max row length. Trades ELL's
//! global padding waste for per-slice padding.

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::data::MatrixData;
use crate::matrix::dense::Dense;
use crate::matrix::linop::{ConvertTo, LinOp, PolymorphicObject};
use crate::types::{Scalar, SparseIndex};
use num_traits::Zero;

#[derive(Clone, Debug)]
pub struct SellP<V, I> {
    dim: Dim2,
    slice_size: usize,
    /// Every slice's width is rounded up to a multiple of this (spec
    /// invariant: SELL-P slice widths are multiples of `stride_factor`).
    stride_factor: usize,
    /// Number of columns in the matrix this slice set covers (`dim.cols`,
    /// named separately per the SELL-P data model).
    total_cols: usize,
    /// Column-count prefix sum over `slice_lengths`: `slice_sets[s] *
    /// slice_size` is the flat storage offset where slice `s` begins.
    /// `slice_sets.len() == slice_lengths.len() + 1`.
    slice_sets: Vec<usize>,
    /// Per-slice width, already a multiple of `stride_factor`.
    slice_lengths: Vec<usize>,
    col_idxs: Vec<I>,
    values: Vec<V>,
}

impl<V: Scalar, I: SparseIndex> SellP<V, I> {
    /// `stride_factor` rounds every slice's padded width up to the next
    /// multiple of itself (spec §4.D: "per-slice width = next multiple of
    /// `stride_factor` above max non-zeros in slice").
    pub fn from_csr(csr: &Csr<V, I>, slice_size: usize, stride_factor: usize) -> Result<Self> {
        if slice_size == 0 {
            return Err(SparseError::ValueMismatch {
                context: "SellP::from_csr".to_string(),
                reason: "slice_size must be nonzero".to_string(),
            });
        }
        if stride_factor == 0 {
            return Err(SparseError::ValueMismatch {
                context: "SellP::from_csr".to_string(),
                reason: "stride_factor must be nonzero".to_string(),
            });
        }
        let dim = csr.dim();
        let num_slices = dim.rows.div_ceil(slice_size);
        let mut slice_lengths = Vec::with_capacity(num_slices);
        for s in 0..num_slices {
            let start = s * slice_size;
            let end = (start + slice_size).min(dim.rows);
            let max_len = (start..end).map(|r| csr.row_nnz(r)).max().unwrap_or(0);
            slice_lengths.push(max_len.div_ceil(stride_factor) * stride_factor);
        }
        let mut slice_sets = Vec::with_capacity(num_slices + 1);
        let mut cols_acc = 0usize;
        for &len in &slice_lengths {
            slice_sets.push(cols_acc);
            cols_acc += len;
        }
        slice_sets.push(cols_acc);
        let acc = cols_acc * slice_size;

        let mut col_idxs = vec![I::sentinel(); acc];
        let mut values = vec![V::zero(); acc];
        for s in 0..num_slices {
            let start_row = s * slice_size;
            let end_row = (start_row + slice_size).min(dim.rows);
            let base = slice_sets[s] * slice_size;
            for row in start_row..end_row {
                let local = row - start_row;
                let (cols, vals) = csr.row(row);
                for (slot, (c, v)) in cols.iter().zip(vals.iter()).enumerate() {
                    col_idxs[base + slot * slice_size + local] = *c;
                    values[base + slot * slice_size + local] = *v;
                }
            }
        }
        Ok(Self {
            dim,
            slice_size,
            stride_factor,
            total_cols: dim.cols,
            slice_sets,
            slice_lengths,
            col_idxs,
            values,
        })
    }

    pub fn to_csr(&self) -> Csr<V, I> {
        let mut row_ptrs = Vec::with_capacity(self.dim.rows + 1);
        let mut col_idxs = Vec::new();
        let mut values = Vec::new();
        row_ptrs.push(I::zero());
        let sentinel = I::sentinel().to_usize();
        for row in 0..self.dim.rows {
            let s = row / self.slice_size;
            let local = row % self.slice_size;
            let base = self.slice_sets[s] * self.slice_size;
            let len = self.slice_lengths[s];
            for slot in 0..len {
                let c = self.col_idxs[base + slot * self.slice_size + local];
                if c.to_usize() == sentinel {
                    continue;
                }
                col_idxs.push(c);
                values.push(self.values[base + slot * self.slice_size + local]);
            }
            row_ptrs.push(I::from_usize(col_idxs.len()));
        }
        Csr::from_parts(self.dim, row_ptrs, col_idxs, values).expect("SellP->CSR rows are non-decreasing by construction")
    }

    pub fn read(data: &MatrixData<V, I>, slice_size: usize, stride_factor: usize) -> Result<Self> {
        Self::from_csr(&Csr::read(data), slice_size, stride_factor)
    }

    pub fn write(&self) -> MatrixData<V, I> {
        self.to_csr().write()
    }

    pub fn stride_factor(&self) -> usize {
        self.stride_factor
    }

    pub fn total_cols(&self) -> usize {
        self.total_cols
    }

    pub fn slice_sets(&self) -> &[usize] {
        &self.slice_sets
    }
}

impl<V: Scalar, I: SparseIndex> LinOp<V> for SellP<V, I> {
    fn dim(&self) -> Dim2 {
        self.dim
    }

    fn apply(&self, x: &[V], y: &mut [V]) -> Result<()> {
        if x.len() != self.dim.cols || y.len() != self.dim.rows {
            return Err(SparseError::DimensionMismatch {
                operation: "SellP::apply".to_string(),
                expected: (self.dim.rows, self.dim.cols),
                actual: (y.len(), x.len()),
            });
        }
        let sentinel = I::sentinel().to_usize();
        for row in 0..self.dim.rows {
            let s = row / self.slice_size;
            let local = row % self.slice_size;
            let base = self.slice_sets[s] * self.slice_size;
            let len = self.slice_lengths[s];
            let mut acc = V::zero();
            for slot in 0..len {
                let c = self.col_idxs[base + slot * self.slice_size + local];
                if c.to_usize() == sentinel {
                    continue;
                }
                acc = acc + self.values[base + slot * self.slice_size + local] * x[c.to_usize()];
            }
            y[row] = acc;
        }
        Ok(())
    }
}

impl<V: Scalar, I: SparseIndex> PolymorphicObject for SellP<V, I> {
    fn format_name(&self) -> &'static str {
        "sellp"
    }

    fn nnz(&self) -> usize {
        let sentinel = I::sentinel().to_usize();
        self.col_idxs.iter().filter(|c| c.to_usize() != sentinel).count()
    }
}

impl<V: Scalar, I: SparseIndex> ConvertTo<Csr<V, I>> for SellP<V, I> {
    fn convert_to(&self) -> Csr<V, I> {
        self.to_csr()
    }
}

impl<V: Scalar, I: SparseIndex> ConvertTo<Dense<V>> for SellP<V, I> {
    fn convert_to(&self) -> Dense<V> {
        Dense::read(&self.to_csr().write())
    }
}
