//! Coordinate format (spec §4.D): row-sorted `(row, col, value)` triples.
//! Row-sortedness is an invariant the writer must uphold; the apply kernel
//! only `debug_assert!`s it (Open Question decision, see DESIGN.md).

use crate::dim::Dim2;
use crate::error::{Result, SparseError};
use crate::matrix::csr::Csr;
use crate::matrix::data::MatrixData;
use crate::matrix::dense::Dense;
use crate::matrix::linop::{ConvertTo, LinOp, PolymorphicObject};
use crate::types::{Scalar, SparseIndex};
use num_traits::Zero;

#[derive(Clone, Debug)]
pub struct Coo<V, I> {
    dim: Dim2,
    rows: Vec<I>,
    cols: Vec<I>,
    values: Vec<V>,
}

impl<V: Scalar, I: SparseIndex> Coo<V, I> {
    pub fn from_parts(dim: Dim2, rows: Vec<I>, cols: Vec<I>, values: Vec<V>) -> Result<Self> {
        if rows.len() != cols.len() || rows.len() != values.len() {
            return Err(SparseError::DimensionMismatch {
                operation: "Coo::from_parts".to_string(),
                expected: (rows.len(), rows.len()),
                actual: (cols.len(), values.len()),
            });
        }
        debug_assert!(rows.windows(2).all(|w| w[0] <= w[1]), "Coo rows must be sorted");
        Ok(Self { dim, rows, cols, values })
    }

    pub fn read(data: &MatrixData<V, I>) -> Self {
        let mut triples: Vec<(I, I, V)> = data.iter().collect();
        triples.sort_by_key(|(r, c, _)| (r.to_usize(), c.to_usize()));
        let (rows, cols, values) = triples.into_iter().fold(
            (Vec::new(), Vec::new(), Vec::new()),
            |(mut rs, mut cs, mut vs), (r, c, v)| {
                rs.push(r);
                cs.push(c);
                vs.push(v);
                (rs, cs, vs)
            },
        );
        Self { dim: data.dim, rows, cols, values }
    }

    pub fn write(&self) -> MatrixData<V, I> {
        MatrixData::with_triplets(self.dim, self.rows.clone(), self.cols.clone(), self.values.clone())
    }

    pub fn rows(&self) -> &[I] {
        &self.rows
    }
    pub fn cols(&self) -> &[I] {
        &self.cols
    }
    pub fn values(&self) -> &[V] {
        &self.values
    }
}

impl<V: Scalar, I: SparseIndex> LinOp<V> for Coo<V, I> {
    fn dim(&self) -> Dim2 {
        self.dim
    }

    fn apply(&self, x: &[V], y: &mut [V]) -> Result<()> {
        if x.len() != self.dim.cols || y.len() != self.dim.rows {
            return Err(SparseError::DimensionMismatch {
                operation: "Coo::apply".to_string(),
                expected: (self.dim.rows, self.dim.cols),
                actual: (y.len(), x.len()),
            });
        }
        debug_assert!(
            self.rows.windows(2).all(|w| w[0] <= w[1]),
            "Coo::apply requires row-sorted entries"
        );
        y.iter_mut().for_each(|v| *v = V::zero());
        for ((r, c), v) in self.rows.iter().zip(self.cols.iter()).zip(self.values.iter()) {
            y[r.to_usize()] = y[r.to_usize()] + *v * x[c.to_usize()];
        }
        Ok(())
    }
}

impl<V: Scalar, I: SparseIndex> PolymorphicObject for Coo<V, I> {
    fn format_name(&self) -> &'static str {
        "coo"
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }
}

impl<V: Scalar, I: SparseIndex> ConvertTo<Csr<V, I>> for Coo<V, I> {
    fn convert_to(&self) -> Csr<V, I> {
        Csr::read(&self.write())
    }
}

impl<V: Scalar, I: SparseIndex> ConvertTo<Dense<V>> for Coo<V, I> {
    fn convert_to(&self) -> Dense<V> {
        Dense::read(&self.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spmv_sums_duplicate_free_entries() {
        let m: Coo<f64, i32> = Coo::from_parts(
            Dim2::square(2),
            vec![0, 0, 1],
            vec![0, 1, 1],
            vec![2.0, 3.0, 4.0],
        )
        .unwrap();
        let x = vec![1.0, 1.0];
        let mut y = vec![0.0; 2];
        m.apply(&x, &mut y).unwrap();
        assert_eq!(y, vec![5.0, 4.0]);
    }

    #[test]
    fn read_sorts_unsorted_input() {
        let mut data: MatrixData<f64, i32> = MatrixData::new(Dim2::square(2));
        data.push(1, 0, 1.0);
        data.push(0, 1, 2.0);
        let coo = Coo::read(&data);
        assert_eq!(coo.rows(), &[0, 1]);
    }
}
