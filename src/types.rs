//! Value- and index-type bounds shared by every storage format.
//!
//! Formats are generic over a value type `V` (spec §3: "parameterized by
//! value type `V`") and an index type `I ∈ {int32, int64}`. Rather than a
//! bespoke trait hierarchy we bound `V` on [`num_traits::Float`] (covers
//! `f32`/`f64`, gives us the arithmetic the kernels need for free) and
//! define a small [`SparseIndex`] trait implemented for `i32`/`i64`.

use num_traits::Float;

/// A non-zero value type usable in a sparse storage format.
pub trait Scalar: Float + Default + std::fmt::Debug + Send + Sync + 'static {}
impl<T> Scalar for T where T: Float + Default + std::fmt::Debug + Send + Sync + 'static {}

/// An index type usable for column/row indices (`int32` or `int64` per spec).
pub trait SparseIndex:
    Copy + Ord + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
    fn from_usize(x: usize) -> Self;
    fn to_usize(self) -> usize;
    fn zero() -> Self;
    fn one() -> Self;
    /// Sentinel used by the SpGEMM merge to mark an exhausted row (spec §4.E).
    fn sentinel() -> Self;
}

macro_rules! impl_sparse_index {
    ($t:ty) => {
        impl SparseIndex for $t {
            fn from_usize(x: usize) -> Self {
                x as $t
            }
            fn to_usize(self) -> usize {
                self as usize
            }
            fn zero() -> Self {
                0
            }
            fn one() -> Self {
                1
            }
            fn sentinel() -> Self {
                <$t>::MAX
            }
        }
    };
}

impl_sparse_index!(i32);
impl_sparse_index!(i64);
