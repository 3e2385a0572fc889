//! Operation dispatch (spec §4.B).
//!
//! An [`Operation`] binds captured arguments to a family of per-executor
//! kernel entry points. [`crate::executor::Executor::run`] picks the entry
//! point matching its own variant and calls it; a variant with no override
//! falls back to `NotImplemented` (Reference falls back to Host, per spec).

use crate::error::{Result, SparseError};

/// A unit of work dispatched through an [`crate::executor::Executor`].
///
/// Implementors override only the variants they have a kernel for; the
/// defaults report [`SparseError::NotImplemented`] so a missing kernel is a
/// visible error rather than silently running on the wrong device.
pub trait Operation {
    /// Name used in logging and in `NotImplemented` errors.
    fn name(&self) -> &str;

    fn run_host(&self) -> Result<()> {
        Err(SparseError::NotImplemented {
            operation: self.name().to_string(),
            executor: "host".to_string(),
        })
    }

    /// Reference defaults to the host kernel: spec §4.B, "the reference
    /// executor variant may reuse the host kernel directly."
    fn run_reference(&self) -> Result<()> {
        self.run_host()
    }

    fn run_cuda(&self, device_id: usize) -> Result<()> {
        let _ = device_id;
        Err(SparseError::NotImplemented {
            operation: self.name().to_string(),
            executor: "cuda".to_string(),
        })
    }

    fn run_hip(&self, device_id: usize) -> Result<()> {
        let _ = device_id;
        Err(SparseError::NotImplemented {
            operation: self.name().to_string(),
            executor: "hip".to_string(),
        })
    }

    fn run_distributed(&self) -> Result<()> {
        Err(SparseError::NotImplemented {
            operation: self.name().to_string(),
            executor: "distributed".to_string(),
        })
    }
}

/// Wraps a plain closure as a host-only [`Operation`], for call sites that
/// don't warrant a named struct.
pub struct HostFn<F> {
    pub name: String,
    pub f: F,
}

impl<F: Fn() -> Result<()>> Operation for HostFn<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_host(&self) -> Result<()> {
        (self.f)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HostOnly;
    impl Operation for HostOnly {
        fn name(&self) -> &str {
            "host_only"
        }
        fn run_host(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn reference_defaults_to_host() {
        let op = HostOnly;
        assert!(op.run_host().is_ok());
        assert!(op.run_reference().is_ok());
    }

    #[test]
    fn unimplemented_variant_reports_operation_and_executor() {
        let op = HostOnly;
        let err = op.run_cuda(0).unwrap_err();
        match err {
            SparseError::NotImplemented { operation, executor } => {
                assert_eq!(operation, "host_only");
                assert_eq!(executor, "cuda");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn host_fn_wraps_closure() {
        let op = HostFn {
            name: "noop".to_string(),
            f: || Ok(()),
        };
        assert!(op.run_host().is_ok());
    }
}
