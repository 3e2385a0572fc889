//! Per-row fan-in tiering (spec §4.E). Ginkgo's CUDA kernel picks a
//! warp/subwarp/heap merge strategy per row from this classification; the
//! reference executor's merge (`crate::spgemm::merge`) is tier-agnostic and
//! correct for every tier, so tiering here only drives logging/stats — a
//! device backend would dispatch three separate kernels keyed on it.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpgemmTier {
    /// Fan-in small enough for one warp's registers (Ginkgo: subwarp merge).
    Short,
    /// Fits a block's shared memory (Ginkgo: warp-per-row heap merge).
    Medium,
    /// Needs scratch memory beyond shared memory (Ginkgo: block-per-row
    /// heap merge backed by global scratch).
    Long,
}

const SHORT_FANIN_LIMIT: usize = 32;
const MEDIUM_FANIN_LIMIT: usize = 512;

/// Classify a row by its fan-in: the sum, over each nonzero column `j` in
/// the row of `A`, of `B`'s row-`j` length.
pub fn choose_tier(fanin: usize) -> SpgemmTier {
    if fanin <= SHORT_FANIN_LIMIT {
        SpgemmTier::Short
    } else if fanin <= MEDIUM_FANIN_LIMIT {
        SpgemmTier::Medium
    } else {
        SpgemmTier::Long
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_classify_correctly() {
        assert_eq!(choose_tier(0), SpgemmTier::Short);
        assert_eq!(choose_tier(32), SpgemmTier::Short);
        assert_eq!(choose_tier(33), SpgemmTier::Medium);
        assert_eq!(choose_tier(512), SpgemmTier::Medium);
        assert_eq!(choose_tier(513), SpgemmTier::Long);
    }
}
