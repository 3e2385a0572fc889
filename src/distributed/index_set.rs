//! Row partitioning for a distributed matrix (spec §4.F): each rank owns a
//! disjoint union of row intervals covering `[0, global_rows)` exactly once.

use crate::error::{Result, SparseError};

/// A disjoint union of half-open `[start, end)` row intervals owned by one
/// rank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowIndexSet {
    intervals: Vec<(usize, usize)>,
}

impl RowIndexSet {
    /// A single contiguous block `[start, end)`.
    pub fn contiguous(start: usize, end: usize) -> Self {
        if start >= end {
            return Self { intervals: Vec::new() };
        }
        Self {
            intervals: vec![(start, end)],
        }
    }

    /// Partition `global_rows` rows as evenly as possible across `size`
    /// ranks; ranks `0..global_rows % size` receive one extra row.
    pub fn block_partition(global_rows: usize, size: usize, rank: usize) -> Self {
        if size == 0 {
            return Self::default();
        }
        let base = global_rows / size;
        let remainder = global_rows % size;
        let start = rank * base + rank.min(remainder);
        let extra = if rank < remainder { 1 } else { 0 };
        Self::contiguous(start, start + base + extra)
    }

    pub fn len(&self) -> usize {
        self.intervals.iter().map(|(s, e)| e - s).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.intervals.iter().any(|(s, e)| row >= *s && row < *e)
    }

    pub fn intervals(&self) -> &[(usize, usize)] {
        &self.intervals
    }

    /// Iterate the global row indices this set owns, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.intervals.iter().flat_map(|(s, e)| *s..*e)
    }

    /// Verify a collection of per-rank sets exactly partitions
    /// `[0, global_rows)`: every row owned exactly once.
    pub fn verify_partition(sets: &[RowIndexSet], global_rows: usize) -> Result<()> {
        let mut owner = vec![None; global_rows];
        for (rank, set) in sets.iter().enumerate() {
            for row in set.iter() {
                if row >= global_rows {
                    return Err(SparseError::OutOfBounds {
                        index: row,
                        limit: global_rows,
                        context: "RowIndexSet::verify_partition".to_string(),
                    });
                }
                if let Some(prev) = owner[row] {
                    return Err(SparseError::ValueMismatch {
                        context: "RowIndexSet::verify_partition".to_string(),
                        reason: format!("row {row} owned by both rank {prev} and rank {rank}"),
                    });
                }
                owner[row] = Some(rank);
            }
        }
        if let Some(row) = owner.iter().position(|o| o.is_none()) {
            return Err(SparseError::ValueMismatch {
                context: "RowIndexSet::verify_partition".to_string(),
                reason: format!("row {row} owned by no rank"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_partition_covers_every_row_exactly_once() {
        let size = 3;
        let global_rows = 10;
        let sets: Vec<_> = (0..size)
            .map(|r| RowIndexSet::block_partition(global_rows, size, r))
            .collect();
        assert_eq!(sets.iter().map(|s| s.len()).sum::<usize>(), global_rows);
        RowIndexSet::verify_partition(&sets, global_rows).unwrap();
    }

    #[test]
    fn uneven_partition_front_loads_remainder() {
        let sets: Vec<_> = (0..3).map(|r| RowIndexSet::block_partition(10, 3, r)).collect();
        assert_eq!(sets[0].len(), 4);
        assert_eq!(sets[1].len(), 3);
        assert_eq!(sets[2].len(), 3);
    }

    #[test]
    fn overlapping_sets_fail_verification() {
        let sets = vec![RowIndexSet::contiguous(0, 6), RowIndexSet::contiguous(5, 10)];
        assert!(RowIndexSet::verify_partition(&sets, 10).is_err());
    }

    #[test]
    fn gap_fails_verification() {
        let sets = vec![RowIndexSet::contiguous(0, 4), RowIndexSet::contiguous(6, 10)];
        assert!(RowIndexSet::verify_partition(&sets, 10).is_err());
    }
}
