//! Executor (spec §4.B): the device-dispatch seat every [`Operation`] runs
//! through. An executor owns a [`MemorySpace`] and, for device variants, a
//! master host executor used to stage data across the host/device boundary.
//!
//! Per-device live-executor bookkeeping (grounded on `knhk-accelerate`'s
//! `DeviceTracker`, restructured here around reference counting instead of
//! polled capability queries) fires a device reset exactly once, when the
//! last executor bound to that device id is dropped.

use crate::distributed::Communicator;
use crate::error::{Result, SparseError};
use crate::memory::{MemorySpace, MemorySpaceKind};
use crate::operation::Operation;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ExecutorKind {
    Host,
    /// Single-threaded, non-optimized reference kernels; falls back to the
    /// host kernel for any operation that doesn't override `run_reference`.
    Reference,
    Cuda,
    Hip,
    Distributed,
}

impl ExecutorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutorKind::Host => "host",
            ExecutorKind::Reference => "reference",
            ExecutorKind::Cuda => "cuda",
            ExecutorKind::Hip => "hip",
            ExecutorKind::Distributed => "distributed",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DeviceProperties {
    pub device_id: usize,
    pub warp_size: usize,
    pub multiprocessor_count: usize,
}

impl DeviceProperties {
    fn stub(device_id: usize) -> Self {
        Self { device_id, warp_size: 32, multiprocessor_count: 1 }
    }
}

static LIVE_DEVICE_EXECUTORS: Lazy<Mutex<HashMap<(&'static str, usize), usize>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn register_device_executor(kind: ExecutorKind, device_id: usize) {
    let mut live = LIVE_DEVICE_EXECUTORS.lock();
    *live.entry((kind.name(), device_id)).or_insert(0) += 1;
}

fn unregister_device_executor(kind: ExecutorKind, device_id: usize) {
    let mut live = LIVE_DEVICE_EXECUTORS.lock();
    if let Some(count) = live.get_mut(&(kind.name(), device_id)) {
        *count -= 1;
        if *count == 0 {
            live.remove(&(kind.name(), device_id));
            tracing::info!(executor = kind.name(), device_id, "executor: device reset (last live executor dropped)");
        }
    }
}

pub struct Executor {
    kind: ExecutorKind,
    mem_space: Arc<MemorySpace>,
    master: Option<Arc<Executor>>,
    device_props: Option<DeviceProperties>,
    communicator: Option<Arc<dyn Communicator>>,
    sub_executor: Option<Arc<Executor>>,
}

impl Executor {
    pub fn host() -> Arc<Executor> {
        tracing::trace!(cpus = num_cpus::get(), "executor: created host executor");
        Arc::new(Self {
            kind: ExecutorKind::Host,
            mem_space: Arc::new(MemorySpace::new(MemorySpaceKind::Host)),
            master: None,
            device_props: None,
            communicator: None,
            sub_executor: None,
        })
    }

    /// Logical CPU count, for callers sizing host-side work splits (e.g. a
    /// `LoadBalance` strategy deciding how many chunks to split a row into).
    pub fn host_parallelism() -> usize {
        num_cpus::get()
    }

    pub fn reference() -> Arc<Executor> {
        Arc::new(Self {
            kind: ExecutorKind::Reference,
            mem_space: Arc::new(MemorySpace::new(MemorySpaceKind::Host)),
            master: None,
            device_props: None,
            communicator: None,
            sub_executor: None,
        })
    }

    pub fn cuda(device_id: usize, master: Arc<Executor>) -> Arc<Executor> {
        register_device_executor(ExecutorKind::Cuda, device_id);
        tracing::info!(device_id, "executor: created cuda executor");
        Arc::new(Self {
            kind: ExecutorKind::Cuda,
            mem_space: Arc::new(MemorySpace::new(MemorySpaceKind::CudaDevice(device_id))),
            master: Some(master),
            device_props: Some(DeviceProperties::stub(device_id)),
            communicator: None,
            sub_executor: None,
        })
    }

    pub fn hip(device_id: usize, master: Arc<Executor>) -> Arc<Executor> {
        register_device_executor(ExecutorKind::Hip, device_id);
        tracing::info!(device_id, "executor: created hip executor");
        Arc::new(Self {
            kind: ExecutorKind::Hip,
            mem_space: Arc::new(MemorySpace::new(MemorySpaceKind::HipDevice(device_id))),
            master: Some(master),
            device_props: Some(DeviceProperties::stub(device_id)),
            communicator: None,
            sub_executor: None,
        })
    }

    pub fn distributed(communicator: Arc<dyn Communicator>, sub_executor: Arc<Executor>) -> Arc<Executor> {
        tracing::info!(rank = communicator.rank(), size = communicator.size(), "executor: created distributed executor");
        Arc::new(Self {
            kind: ExecutorKind::Distributed,
            mem_space: Arc::new(MemorySpace::new(MemorySpaceKind::Distributed)),
            master: None,
            device_props: None,
            communicator: Some(communicator),
            sub_executor: Some(sub_executor),
        })
    }

    pub fn kind(&self) -> ExecutorKind {
        self.kind
    }

    pub fn mem_space(&self) -> &Arc<MemorySpace> {
        &self.mem_space
    }

    pub fn get_master(&self) -> Option<&Arc<Executor>> {
        self.master.as_ref()
    }

    pub fn get_sub_executor(&self) -> Option<&Arc<Executor>> {
        self.sub_executor.as_ref()
    }

    pub fn communicator(&self) -> Option<&Arc<dyn Communicator>> {
        self.communicator.as_ref()
    }

    pub fn device_properties(&self) -> Option<DeviceProperties> {
        self.device_props
    }

    /// Run `op` on the kernel entry point matching this executor's variant.
    pub fn run(&self, op: &dyn Operation) -> Result<()> {
        tracing::trace!(operation = op.name(), executor = self.kind.name(), "executor: dispatching operation");
        let result = match self.kind {
            ExecutorKind::Host => op.run_host(),
            ExecutorKind::Reference => op.run_reference(),
            ExecutorKind::Cuda => op.run_cuda(self.device_props.map(|p| p.device_id).unwrap_or(0)),
            ExecutorKind::Hip => op.run_hip(self.device_props.map(|p| p.device_id).unwrap_or(0)),
            ExecutorKind::Distributed => op.run_distributed(),
        };
        match &result {
            Ok(()) => tracing::trace!(operation = op.name(), executor = self.kind.name(), "executor: operation completed"),
            Err(e) => tracing::warn!(operation = op.name(), executor = self.kind.name(), error = %e, "executor: operation failed"),
        }
        result
    }

    /// Pick one of the four closures by executor variant, collapsing the
    /// host/reference distinction callers rarely need to make themselves.
    pub fn run_with<T>(
        &self,
        host_fn: impl FnOnce() -> Result<T>,
        distributed_fn: impl FnOnce() -> Result<T>,
        cuda_fn: impl FnOnce(usize) -> Result<T>,
        hip_fn: impl FnOnce(usize) -> Result<T>,
    ) -> Result<T> {
        match self.kind {
            ExecutorKind::Host | ExecutorKind::Reference => host_fn(),
            ExecutorKind::Distributed => distributed_fn(),
            ExecutorKind::Cuda => cuda_fn(self.device_props.map(|p| p.device_id).unwrap_or(0)),
            ExecutorKind::Hip => hip_fn(self.device_props.map(|p| p.device_id).unwrap_or(0)),
        }
    }

    /// Block until any asynchronous work queued on this executor completes.
    /// Host/reference/distributed executors are always synchronous.
    pub fn synchronize(&self) -> Result<()> {
        match self.kind {
            ExecutorKind::Cuda | ExecutorKind::Hip => {
                tracing::trace!(executor = self.kind.name(), "executor: synchronize");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn copy<T: Copy>(&self, other: &Executor, n: usize, src: *const T, dst: *mut T) -> Result<()> {
        self.mem_space.copy_from(&other.mem_space, n, src, dst)
    }

    /// Copy one value from this executor's memory space to a host-resident
    /// `T`, staging through `get_master` when this executor's space isn't
    /// host-addressable.
    pub fn copy_val_to_host<T: Copy + Default>(&self, src: *const T) -> Result<T> {
        if self.mem_space.kind().host_addressable() {
            return Ok(unsafe { *src });
        }
        let master = self.get_master().ok_or_else(|| SparseError::MemorySpaceMismatch {
            object_space: self.mem_space.kind().name(),
            executor_space: "host".to_string(),
        })?;
        let mut out = T::default();
        master.mem_space.copy_from(&self.mem_space, 1, src, &mut out as *mut T)?;
        Ok(out)
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if let Some(props) = self.device_props {
            unregister_device_executor(self.kind, props.device_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributed::LocalCommunicator;

    struct AlwaysOk;
    impl Operation for AlwaysOk {
        fn name(&self) -> &str {
            "always_ok"
        }
        fn run_host(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn host_executor_runs_host_kernel() {
        let exec = Executor::host();
        assert!(exec.run(&AlwaysOk).is_ok());
    }

    #[test]
    fn reference_executor_falls_back_to_host_kernel() {
        let exec = Executor::reference();
        assert!(exec.run(&AlwaysOk).is_ok());
    }

    #[test]
    fn cuda_executor_without_kernel_reports_not_implemented() {
        let host = Executor::host();
        let exec = Executor::cuda(0, host);
        let err = exec.run(&AlwaysOk).unwrap_err();
        assert!(matches!(err, SparseError::NotImplemented { .. }));
    }

    #[test]
    fn device_reset_fires_once_last_executor_drops() {
        let host = Executor::host();
        let a = Executor::cuda(7, host.clone());
        let b = Executor::cuda(7, host);
        drop(a);
        assert!(LIVE_DEVICE_EXECUTORS.lock().contains_key(&("cuda", 7)));
        drop(b);
        assert!(!LIVE_DEVICE_EXECUTORS.lock().contains_key(&("cuda", 7)));
    }

    #[test]
    fn distributed_executor_exposes_sub_executor_and_communicator() {
        let comms = LocalCommunicator::group(1);
        let comm: Arc<dyn Communicator> = Arc::new(comms.into_iter().next().unwrap());
        let host = Executor::host();
        let exec = Executor::distributed(comm, host);
        assert!(exec.get_sub_executor().is_some());
        assert!(exec.communicator().is_some());
    }
}
