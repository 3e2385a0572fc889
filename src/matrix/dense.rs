//! Row-major dense matrix (spec §4.D). The universal conversion target: any
//! format can round-trip through `Dense` even when a direct pairwise
//! converter hasn't been written.

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::data::MatrixData;
use crate::matrix::linop::{ConvertTo, LinOp, PolymorphicObject, Transposable};
use crate::types::{Scalar, SparseIndex};
use num_traits::Zero;

#[derive(Clone, Debug)]
pub struct Dense<V> {
    dim: Dim2,
    values: Vec<V>,
}

impl<V: Scalar> Dense<V> {
    pub fn zeros(dim: Dim2) -> Self {
        Self {
            dim,
            values: vec![V::zero(); dim.rows * dim.cols],
        }
    }

    pub fn from_row_major(dim: Dim2, values: Vec<V>) -> Result<Self> {
        if values.len() != dim.rows * dim.cols {
            return Err(SparseError::DimensionMismatch {
                operation: "Dense::from_row_major".to_string(),
                expected: (dim.rows, dim.cols),
                actual: (1, values.len()),
            });
        }
        Ok(Self { dim, values })
    }

    pub fn dim(&self) -> Dim2 {
        self.dim
    }

    pub fn get(&self, row: usize, col: usize) -> V {
        self.values[row * self.dim.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: V) {
        self.values[row * self.dim.cols + col] = value;
    }

    pub fn as_slice(&self) -> &[V] {
        &self.values
    }

    pub fn read<I: SparseIndex>(data: &MatrixData<V, I>) -> Self {
        let mut dense = Self::zeros(data.dim);
        for (r, c, v) in data.iter() {
            dense.set(r.to_usize(), c.to_usize(), v);
        }
        dense
    }

    pub fn write<I: SparseIndex>(&self) -> MatrixData<V, I> {
        let mut data = MatrixData::new(self.dim);
        for r in 0..self.dim.rows {
            for c in 0..self.dim.cols {
                let v = self.get(r, c);
                if !v.is_zero() {
                    data.push(I::from_usize(r), I::from_usize(c), v);
                }
            }
        }
        data
    }
}

impl<V: Scalar> LinOp<V> for Dense<V> {
    fn dim(&self) -> Dim2 {
        self.dim
    }

    fn apply(&self, x: &[V], y: &mut [V]) -> Result<()> {
        if x.len() != self.dim.cols || y.len() != self.dim.rows {
            return Err(SparseError::DimensionMismatch {
                operation: "Dense::apply".to_string(),
                expected: (self.dim.rows, self.dim.cols),
                actual: (y.len(), x.len()),
            });
        }
        for row in 0..self.dim.rows {
            let mut acc = V::zero();
            for col in 0..self.dim.cols {
                acc = acc + self.get(row, col) * x[col];
            }
            y[row] = acc;
        }
        Ok(())
    }
}

impl<V: Scalar> Transposable for Dense<V> {
    fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.dim.transpose());
        for r in 0..self.dim.rows {
            for c in 0..self.dim.cols {
                out.set(c, r, self.get(r, c));
            }
        }
        out
    }
}

impl<V: Scalar> PolymorphicObject for Dense<V> {
    fn format_name(&self) -> &'static str {
        "dense"
    }

    fn nnz(&self) -> usize {
        self.values.iter().filter(|v| !v.is_zero()).count()
    }
}

impl<V: Scalar, I: SparseIndex> ConvertTo<Csr<V, I>> for Dense<V> {
    fn convert_to(&self) -> Csr<V, I> {
        Csr::read(&self.write())
    }
}

impl<V: Scalar> std::fmt::Display for Dense<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dense {}", self.dim)?;
        for r in 0..self.dim.rows {
            for c in 0..self.dim.cols {
                write!(f, "{:>10.4?} ", self.get(r, c))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_identity_is_noop() {
        let mut d: Dense<f64> = Dense::zeros(Dim2::square(3));
        for i in 0..3 {
            d.set(i, i, 1.0);
        }
        let x = vec![1.0, 2.0, 3.0];
        let mut y = vec![0.0; 3];
        d.apply(&x, &mut y).unwrap();
        assert_eq!(y, x);
    }

    #[test]
    fn transpose_swaps_entries() {
        let mut d: Dense<f64> = Dense::zeros(Dim2::new(2, 3));
        d.set(0, 2, 5.0);
        let t = d.transpose();
        assert_eq!(t.dim(), Dim2::new(3, 2));
        assert_eq!(t.get(2, 0), 5.0);
    }

    #[test]
    fn convert_to_csr_preserves_nonzeros() {
        let mut d: Dense<f64> = Dense::zeros(Dim2::square(2));
        d.set(0, 1, 7.0);
        let csr: Csr<f64, i32> = d.convert_to();
        assert_eq!(csr.get(0, 1), 7.0);
        assert_eq!(csr.get(1, 0), 0.0);
    }

    #[test]
    fn round_trip_through_matrix_data() {
        let mut d: Dense<f64> = Dense::zeros(Dim2::square(2));
        d.set(0, 1, 3.0);
        d.set(1, 0, 4.0);
        let data: MatrixData<f64, i32> = d.write();
        let back = Dense::read(&data);
        assert_eq!(back.get(0, 1), 3.0);
        assert_eq!(back.get(1, 0), 4.0);
        assert_eq!(back.get(0, 0), 0.0);
    }
}
