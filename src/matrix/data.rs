//! `MatrixData`: the triple-list transfer type every format reads from and
//! writes to (spec §4.D read/write contract), grounded on
//! `ruvnet-sublinear-time-solver`'s `from_triplets` constructor pattern.

use crate::dim::Dim2;
use crate::types::{Scalar, SparseIndex};

/// A coordinate-format triple list: `(row, col, value)` per nonzero, in no
/// particular order. This is the interchange format every storage format's
/// `read`/`write` goes through.
#[derive(Clone, Debug)]
pub struct MatrixData<V, I> {
    pub dim: Dim2,
    pub rows: Vec<I>,
    pub cols: Vec<I>,
    pub values: Vec<V>,
}

impl<V: Scalar, I: SparseIndex> MatrixData<V, I> {
    pub fn new(dim: Dim2) -> Self {
        Self {
            dim,
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_triplets(dim: Dim2, rows: Vec<I>, cols: Vec<I>, values: Vec<V>) -> Self {
        debug_assert_eq!(rows.len(), cols.len());
        debug_assert_eq!(rows.len(), values.len());
        Self { dim, rows, cols, values }
    }

    pub fn push(&mut self, row: I, col: I, value: V) {
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (I, I, V)> + '_ {
        self.rows
            .iter()
            .zip(self.cols.iter())
            .zip(self.values.iter())
            .map(|((r, c), v)| (*r, *c, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_iterate() {
        let mut data: MatrixData<f64, i32> = MatrixData::new(Dim2::new(2, 2));
        data.push(0, 0, 1.0);
        data.push(1, 1, 2.0);
        let triples: Vec<_> = data.iter().collect();
        assert_eq!(triples, vec![(0, 0, 1.0), (1, 1, 2.0)]);
    }
}
