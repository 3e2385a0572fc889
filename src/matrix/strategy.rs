//! SpMV execution strategy for [`crate::matrix::csr::Csr`] (spec §4.D).
//!
//! Ginkgo's CSR kernel picks a strategy per matrix instance rather than
//! per call; we keep that shape so a matrix built once carries its own
//! load-balancing choice through every `apply`.

use crate::dim::Dim2;
use crate::types::SparseIndex;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CsrStrategy {
    /// One thread (row) of work per matrix row. Best when row lengths are
    /// close to uniform.
    Classical,
    /// Splits long rows across multiple workers and merges partial sums.
    /// Better when row lengths vary widely.
    LoadBalance,
    /// Merge-path partitioning of the (row, nnz) index space into equal
    /// work chunks irrespective of row boundaries.
    MergePath,
    /// Delegates to whatever the host's native sparse BLAS provides; the
    /// host executor treats this the same as `Classical`.
    Sparselib,
    /// Chooses `Classical` or `LoadBalance` at apply time from nnz-per-row
    /// imbalance (spec §4.D: "an automatic mode may choose a strategy from
    /// matrix statistics").
    Automatical,
}

impl Default for CsrStrategy {
    fn default() -> Self {
        CsrStrategy::Automatical
    }
}

/// Below this nonzero count, `Sparselib` isn't worth its call overhead even
/// when a vendor binding is available.
const SPARSELIB_SIZE_THRESHOLD: usize = 100_000;

/// Resolve `Automatical` (and pass everything else through): prefer
/// `Sparselib` when a vendor binding is available and the matrix exceeds
/// `SPARSELIB_SIZE_THRESHOLD` nonzeros; otherwise fall back to the imbalance
/// ratio max_row_nnz / avg_row_nnz, picking `LoadBalance` above 4x and
/// `Classical` otherwise (Ginkgo's observation that load-balancing overhead
/// only pays off for skewed rows).
///
/// `sparselib_available` reports whether the executor actually has a vendor
/// sparse BLAS binding; no such binding exists in this crate's dependency
/// stack, so host-built matrices pass `false` and this tie-break never picks
/// `Sparselib` on its own.
pub fn resolve_strategy<I: SparseIndex>(
    strategy: CsrStrategy,
    row_ptrs: &[I],
    dim: Dim2,
    sparselib_available: bool,
) -> CsrStrategy {
    if strategy != CsrStrategy::Automatical {
        return strategy;
    }
    if dim.rows == 0 {
        return CsrStrategy::Classical;
    }
    let nnz = row_ptrs[dim.rows].to_usize() - row_ptrs[0].to_usize();
    if sparselib_available && nnz > SPARSELIB_SIZE_THRESHOLD {
        return CsrStrategy::Sparselib;
    }
    let avg = nnz as f64 / dim.rows as f64;
    let max_row = (0..dim.rows)
        .map(|r| row_ptrs[r + 1].to_usize() - row_ptrs[r].to_usize())
        .max()
        .unwrap_or(0) as f64;
    if avg > 0.0 && max_row / avg > 4.0 {
        CsrStrategy::LoadBalance
    } else {
        CsrStrategy::Classical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_rows_resolve_to_classical() {
        let row_ptrs = [0i32, 2, 4, 6];
        let resolved = resolve_strategy(CsrStrategy::Automatical, &row_ptrs, Dim2::square(3), false);
        assert_eq!(resolved, CsrStrategy::Classical);
    }

    #[test]
    fn skewed_rows_resolve_to_load_balance() {
        let row_ptrs = [0i32, 1, 2, 30];
        let resolved = resolve_strategy(CsrStrategy::Automatical, &row_ptrs, Dim2::square(3), false);
        assert_eq!(resolved, CsrStrategy::LoadBalance);
    }

    #[test]
    fn explicit_strategy_passes_through() {
        let row_ptrs = [0i32, 1, 2, 30];
        let resolved = resolve_strategy(CsrStrategy::MergePath, &row_ptrs, Dim2::square(3), false);
        assert_eq!(resolved, CsrStrategy::MergePath);
    }

    #[test]
    fn sparselib_unavailable_falls_back_to_imbalance_ratio_even_above_threshold() {
        let row_ptrs = vec![0i32, (SPARSELIB_SIZE_THRESHOLD as i32) + 1, (SPARSELIB_SIZE_THRESHOLD as i32) + 2];
        let resolved = resolve_strategy(CsrStrategy::Automatical, &row_ptrs, Dim2::square(2), false);
        assert_ne!(resolved, CsrStrategy::Sparselib);
    }

    #[test]
    fn sparselib_available_and_large_resolves_to_sparselib() {
        let nnz = SPARSELIB_SIZE_THRESHOLD + 1;
        let mut row_ptrs = vec![0i32; 3];
        row_ptrs[1] = (nnz / 2) as i32;
        row_ptrs[2] = nnz as i32;
        let resolved = resolve_strategy(CsrStrategy::Automatical, &row_ptrs, Dim2::square(2), true);
        assert_eq!(resolved, CsrStrategy::Sparselib);
    }

    #[test]
    fn sparselib_available_but_small_still_uses_imbalance_ratio() {
        let row_ptrs = [0i32, 2, 4, 6];
        let resolved = resolve_strategy(CsrStrategy::Automatical, &row_ptrs, Dim2::square(3), true);
        assert_eq!(resolved, CsrStrategy::Classical);
    }
}
