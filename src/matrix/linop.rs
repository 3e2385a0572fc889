//! Shared matrix interfaces (spec §4.D): every storage format implements
//! [`LinOp`] so algorithms above the format layer (SpGEMM, preconditioners,
//! the distributed layer) never match on concrete type.

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::dense::Dense;
use crate::types::Scalar;
use num_traits::Zero;

/// A linear operator: something that can be applied to a dense vector.
pub trait LinOp<V: Scalar> {
    fn dim(&self) -> Dim2;

    /// `y = self * x`.
    fn apply(&self, x: &[V], y: &mut [V]) -> Result<()>;

    /// `y = alpha * (self * x) + beta * y`. Formats override this when they
    /// can fuse the scale/accumulate into the same pass; the default does
    /// it in two.
    fn apply_add(&self, alpha: V, x: &[V], beta: V, y: &mut [V]) -> Result<()> {
        let mut tmp = vec![V::zero(); y.len()];
        self.apply(x, &mut tmp)?;
        for (yi, ti) in y.iter_mut().zip(tmp.iter()) {
            *yi = alpha * *ti + beta * *yi;
        }
        Ok(())
    }

    /// Block SpMV: `y = self * x` for a multi-column right-hand side, each
    /// column processed independently. The default drives `apply` once per
    /// column, so every format gets this without overriding it.
    fn apply_multi(&self, x: &Dense<V>, y: &mut Dense<V>) -> Result<()> {
        let dim = self.dim();
        if x.dim().rows != dim.cols || y.dim().rows != dim.rows || x.dim().cols != y.dim().cols {
            return Err(SparseError::DimensionMismatch {
                operation: "LinOp::apply_multi".to_string(),
                expected: (dim.rows, dim.cols),
                actual: (y.dim().rows, x.dim().rows),
            });
        }
        let num_rhs = x.dim().cols;
        for col in 0..num_rhs {
            let xc: Vec<V> = (0..x.dim().rows).map(|r| x.get(r, col)).collect();
            let mut yc = vec![V::zero(); y.dim().rows];
            self.apply(&xc, &mut yc)?;
            for (r, v) in yc.into_iter().enumerate() {
                y.set(r, col, v);
            }
        }
        Ok(())
    }
}

/// A format that can produce its own transpose in the same representation.
pub trait Transposable {
    fn transpose(&self) -> Self;

    /// Conjugate transpose. Every `Scalar` in this crate is real, so this is
    /// the same as `transpose`; formats over complex scalars would override
    /// it to also conjugate each value.
    fn conj_transpose(&self) -> Self
    where
        Self: Sized,
    {
        self.transpose()
    }
}

/// Converts a format to `Target`, the way Ginkgo's `Matrix::convert_to`
/// materializes one format from another without consuming the source.
pub trait ConvertTo<Target> {
    fn convert_to(&self) -> Target;

    /// Same conversion, but allowed to cannibalize `self`'s storage. The
    /// default just calls `convert_to`; formats that can move buffers
    /// instead of copying them override this.
    fn move_to(self) -> Target
    where
        Self: Sized,
    {
        self.convert_to()
    }
}

/// Tags a type as one of the storage-format "polymorphic objects" spec §4.D
/// groups under one class hierarchy: every format name used in dispatch and
/// error messages comes from here.
pub trait PolymorphicObject {
    fn format_name(&self) -> &'static str;
    fn nnz(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dim::Dim2;
    use crate::matrix::csr::Csr;

    #[test]
    fn apply_multi_processes_each_column_independently() {
        let csr: Csr<f64, i32> = Csr::from_parts(
            Dim2::square(2),
            vec![0, 1, 2],
            vec![1, 0],
            vec![2.0, 3.0],
        )
        .unwrap();
        let x = Dense::from_row_major(Dim2::new(2, 2), vec![1.0, 10.0, 2.0, 20.0]).unwrap();
        let mut y: Dense<f64> = Dense::zeros(Dim2::new(2, 2));
        csr.apply_multi(&x, &mut y).unwrap();
        for col in 0..2 {
            let xc = vec![x.get(0, col), x.get(1, col)];
            let mut yc = vec![0.0; 2];
            csr.apply(&xc, &mut yc).unwrap();
            assert_eq!(y.get(0, col), yc[0]);
            assert_eq!(y.get(1, col), yc[1]);
        }
    }

    #[test]
    fn apply_multi_rejects_mismatched_column_counts() {
        let csr: Csr<f64, i32> = Csr::from_parts(Dim2::square(2), vec![0, 1, 2], vec![1, 0], vec![2.0, 3.0]).unwrap();
        let x: Dense<f64> = Dense::zeros(Dim2::new(2, 3));
        let mut y: Dense<f64> = Dense::zeros(Dim2::new(2, 2));
        assert!(csr.apply_multi(&x, &mut y).is_err());
    }
}
