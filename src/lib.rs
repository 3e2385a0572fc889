//! Sparse-linear-algebra kernel core for heterogeneous hardware
//! (CPU/CUDA/HIP/distributed): storage formats, an executor/memory-space
//! device abstraction, SpGEMM, a row-partitioned distributed matrix layer,
//! and a handful of preconditioner cores.

pub mod array;
pub mod dim;
pub mod distributed;
pub mod error;
pub mod executor;
pub mod matrix;
pub mod memory;
pub mod operation;
pub mod precond;
pub mod spgemm;
pub mod types;

pub use array::Array;
pub use dim::Dim2;
pub use error::{Result, SparseError};
pub use executor::{DeviceProperties, Executor, ExecutorKind};
pub use memory::{MemorySpace, MemorySpaceKind};
pub use operation::Operation;
pub use types::{Scalar, SparseIndex};

/// Re-exports the types a downstream crate typically needs at the call
/// site: the executor, the array type, the primary storage formats, and
/// the error type.
pub mod prelude {
    pub use crate::array::Array;
    pub use crate::error::{Result, SparseError};
    pub use crate::executor::{Executor, ExecutorKind};
    pub use crate::matrix::{Coo, Csr, Dense, Ell, Hybrid, LinOp, SellP};
    pub use crate::types::{Scalar, SparseIndex};
}
