//! Matrix storage formats (spec §4.D): CSR is the primary format; the
//! others trade memory layout for better fit on skewed or device-specific
//! workloads. Every format converts to and from [`data::MatrixData`] and
//! implements [`linop::LinOp`].

pub mod convert;
pub mod coo;
pub mod csr;
pub mod data;
pub mod dense;
pub mod ell;
pub mod hybrid;
pub mod linop;
pub mod permutation;
pub mod sellp;
pub mod sparsity_csr;
pub mod strategy;

pub use coo::Coo;
pub use csr::Csr;
pub use data::MatrixData;
pub use dense::Dense;
pub use ell::Ell;
pub use hybrid::{Hybrid, HybridStrategy};
pub use linop::{ConvertTo, LinOp, PolymorphicObject, Transposable};
pub use permutation::{
    column_permute, inverse_column_permute, inverse_row_permute, row_permute, PermuteMask, Permutation,
};
pub use sellp::SellP;
pub use sparsity_csr::SparsityCsr;
pub use strategy::CsrStrategy;
