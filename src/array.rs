//! `Array<T>` (spec §3, §4.A): an owning or borrowed 1-D buffer bound to an
//! [`Executor`]. Every raw pointer a kernel touches originates from one of
//! these.

use crate::error::Result;
use crate::executor::Executor;
use crate::memory::RawAllocation;
use std::sync::Arc;

enum Storage<T> {
    Owned(RawAllocation<T>),
    /// Borrowed pointer; not freed on drop. Spec §9: "an implementation
    /// must guarantee the view's lifetime does not exceed the source
    /// allocation and that mutation-through-view is visible to the owner."
    /// That guarantee is the caller's to uphold — it cannot be checked at
    /// this layer without a borrow-checker-visible lifetime, so `view` is
    /// `unsafe`.
    View { ptr: *mut T, len: usize },
}

/// An owning or non-owning buffer of `T` bound to an [`Executor`]'s memory
/// space.
pub struct Array<T> {
    executor: Arc<Executor>,
    storage: Storage<T>,
}

// SAFETY: Array never exposes its raw pointer without also requiring the
// caller to already be on the right executor/thread; the pointee type's own
// Send/Sync bound governs whether sharing across threads is sound.
unsafe impl<T: Send> Send for Array<T> {}
unsafe impl<T: Sync> Sync for Array<T> {}

impl<T: Default + Copy> Array<T> {
    /// Allocate an owning, zero-initialized array of `len` elements on
    /// `executor`'s memory space.
    pub fn zeros(executor: Arc<Executor>, len: usize) -> Result<Self> {
        let alloc = executor.mem_space().allocate::<T>(len)?;
        let mut arr = Self {
            executor,
            storage: Storage::Owned(alloc),
        };
        arr.as_mut_slice_host().fill(T::default());
        Ok(arr)
    }

    /// Allocate an owning array initialized from a host-side slice.
    pub fn from_slice(executor: Arc<Executor>, data: &[T]) -> Result<Self> {
        let mut arr = Self::zeros(executor, data.len())?;
        arr.as_mut_slice_host().copy_from_slice(data);
        Ok(arr)
    }
}

impl<T> Array<T> {
    /// Wrap a borrowed pointer as a non-owning view. The caller must
    /// guarantee `ptr..ptr+len` stays valid, and on the memory space of
    /// `executor`, for the lifetime of the returned `Array`.
    ///
    /// # Safety
    /// See the type-level safety note on [`Storage::View`].
    pub unsafe fn view(executor: Arc<Executor>, len: usize, ptr: *mut T) -> Self {
        Self {
            executor,
            storage: Storage::View { ptr, len },
        }
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Owned(a) => a.len,
            Storage::View { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_ptr(&self) -> *const T {
        match &self.storage {
            Storage::Owned(a) => a.ptr,
            Storage::View { ptr, .. } => *ptr,
        }
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        match &mut self.storage {
            Storage::Owned(a) => a.ptr,
            Storage::View { ptr, .. } => *ptr,
        }
    }

    /// Host-visible slice view. Only meaningful when the executor's memory
    /// space is host-addressable; callers on a device executor must route
    /// through `Executor::copy_val_to_host` instead.
    pub fn as_slice_host(&self) -> &[T] {
        debug_assert!(self.executor.mem_space().kind().host_addressable());
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    pub fn as_mut_slice_host(&mut self) -> &mut [T] {
        debug_assert!(self.executor.mem_space().kind().host_addressable());
        let len = self.len();
        unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }
}

impl<T: Copy> Array<T> {
    /// Copy `other`'s contents into `self`, routing through the memory
    /// spaces of both executors (possibly a cross-device copy).
    pub fn copy_from(&mut self, other: &Array<T>) -> Result<()> {
        let n = other.len().min(self.len());
        let other_ptr = other.as_ptr();
        let dst_ptr = self.as_mut_ptr();
        self.executor.mem_space().copy_from(other.executor.mem_space(), n, other_ptr, dst_ptr)
    }
}

impl<T> Drop for Array<T> {
    fn drop(&mut self) {
        if let Storage::Owned(_) = &self.storage {
            let owned = std::mem::replace(&mut self.storage, Storage::View { ptr: std::ptr::null_mut(), len: 0 });
            if let Storage::Owned(alloc) = owned {
                // SAFETY: this allocation was produced by this executor's
                // memory space in `zeros`/`from_slice` and is dropped once.
                unsafe { self.executor.mem_space().free(alloc) };
            }
        }
    }
}
