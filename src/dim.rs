//! Matrix dimension type.

use serde::{Deserialize, Serialize};

/// A 2-D dimension, `(rows, cols)`. Either may be zero; a zero-sized matrix
/// is legal and carries no allocations.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Dim2 {
    pub rows: usize,
    pub cols: usize,
}

impl Dim2 {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn square(n: usize) -> Self {
        Self { rows: n, cols: n }
    }

    pub fn transpose(&self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
        }
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

impl std::fmt::Display for Dim2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_swaps_rows_and_cols() {
        let d = Dim2::new(3, 5);
        assert_eq!(d.transpose(), Dim2::new(5, 3));
    }

    #[test]
    fn zero_sized_is_empty() {
        assert!(Dim2::new(0, 4).is_empty());
        assert!(!Dim2::new(1, 4).is_empty());
    }
}
