//! Sparse-times-sparse matrix multiplication (spec §4.E).

mod merge;
mod tier;
mod work;

pub use merge::{count_pass, kernel_pass, multiply};
pub use tier::{choose_tier, SpgemmTier};
pub use work::{estimate_work, row_fanin};
