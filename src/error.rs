//! Domain error taxonomy.
//!
//! Every fallible entry point in this crate returns [`SparseError`] rather
//! than panicking or logging-and-continuing; dispatch failures are surfaced
//! at the call site, never swallowed (spec §7 propagation policy).

use thiserror::Error;

/// The error kinds a sparse-linear-algebra operation can fail with.
#[derive(Error, Debug)]
pub enum SparseError {
    /// The operation has no kernel registered for the executor variant it
    /// was run on. Recoverable: the caller may retry on a different
    /// executor or fall back to a host implementation.
    #[error("no kernel for operation '{operation}' on executor '{executor}'")]
    NotImplemented {
        operation: String,
        executor: String,
    },

    /// The operation cannot be performed on this object at all, independent
    /// of executor (e.g. `Executor::distributed` called on a non-distributed
    /// sub-executor).
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Sizes incompatible in an operation.
    #[error("dimension mismatch in {operation}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        operation: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Index or size exceeds an allocation.
    #[error("index {index} out of bounds (limit {limit}) in {context}")]
    OutOfBounds {
        index: usize,
        limit: usize,
        context: String,
    },

    /// A memory space refused an allocation.
    #[error("allocation of {bytes} bytes failed on memory space '{space}'")]
    AllocationError { bytes: usize, space: String },

    /// An object lives on a memory space the requesting executor cannot
    /// address directly.
    #[error("object lives on memory space '{object_space}', executor requires '{executor_space}'")]
    MemorySpaceMismatch {
        object_space: String,
        executor_space: String,
    },

    /// A device kernel returned an error code.
    #[error("kernel '{kernel}' launch failed on device {device_id}: {reason}")]
    KernelLaunchError {
        kernel: String,
        device_id: usize,
        reason: String,
    },

    /// An MPI-style collective returned a non-zero status.
    #[error("collective '{op}' failed on communicator '{communicator}': {reason}")]
    MpiError {
        communicator: String,
        op: String,
        reason: String,
    },

    /// A data precondition was violated (e.g. non-monotonic `row_ptrs`).
    #[error("value precondition violated in {context}: {reason}")]
    ValueMismatch { context: String, reason: String },
}

pub type Result<T> = std::result::Result<T, SparseError>;
