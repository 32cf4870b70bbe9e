//! Task stack memory.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use log::debug;

use crate::config::{STACK_ALIGN, STACK_GUARD};
use crate::error::TaskError;

/// A heap-allocated call stack, owned by exactly one task record.
///
/// Stacks grow downward from [`Stack::top`]. On unix the lowest page is a
/// guard page: it is mapped `PROT_NONE` for the lifetime of the stack and
/// made writable again just before the memory goes back to the allocator.
#[derive(Debug)]
pub struct Stack {
    base: NonNull<u8>,
    layout: Layout,
    guard: usize,
}

impl Stack {
    /// Allocate a stack of `size` bytes.
    ///
    /// Never aborts on allocation failure: a null allocation or a failed
    /// `mprotect` is reported as [`TaskError::StackAlloc`].
    pub fn new(size: usize) -> Result<Self, TaskError> {
        let page = page_size();
        let layout = Layout::from_size_align(size, page.max(STACK_ALIGN))
            .map_err(|_| TaskError::StackAlloc)?;
        if layout.size() == 0 {
            return Err(TaskError::StackAlloc);
        }

        let base = NonNull::new(unsafe { alloc::alloc(layout) }).ok_or(TaskError::StackAlloc)?;
        let mut stack = Stack {
            base,
            layout,
            guard: 0,
        };

        // Keep at least one usable page above the guard.
        if STACK_GUARD && size >= 2 * page {
            stack.protect_guard(page)?;
        }

        Ok(stack)
    }

    /// One past the highest usable address, aligned down to `STACK_ALIGN`.
    pub fn top(&self) -> usize {
        let end = self.base.as_ptr() as usize + self.layout.size();
        end & !(STACK_ALIGN - 1)
    }

    /// Lowest usable address (above the guard page, if any).
    pub fn bottom(&self) -> usize {
        self.base.as_ptr() as usize + self.guard
    }

    /// Bytes available to the task.
    pub fn usable(&self) -> usize {
        self.top() - self.bottom()
    }

    /// Whether `addr` lies in the usable part of this stack.
    pub fn contains(&self, addr: usize) -> bool {
        (self.bottom()..self.top()).contains(&addr)
    }

    #[cfg(unix)]
    fn protect_guard(&mut self, page: usize) -> Result<(), TaskError> {
        let rc = unsafe {
            libc::mprotect(
                self.base.as_ptr().cast::<libc::c_void>(),
                page,
                libc::PROT_NONE,
            )
        };
        if rc != 0 {
            debug!(
                "mprotect of stack guard failed: {}",
                std::io::Error::last_os_error()
            );
            return Err(TaskError::StackAlloc);
        }
        self.guard = page;
        Ok(())
    }

    #[cfg(not(unix))]
    fn protect_guard(&mut self, _page: usize) -> Result<(), TaskError> {
        Ok(())
    }

    #[cfg(unix)]
    fn unprotect_guard(&mut self) {
        if self.guard == 0 {
            return;
        }
        let rc = unsafe {
            libc::mprotect(
                self.base.as_ptr().cast::<libc::c_void>(),
                self.guard,
                libc::PROT_READ | libc::PROT_WRITE,
            )
        };
        if rc != 0 {
            // Freed memory must stay writable for the allocator.
            log::error!(
                "failed to unprotect stack guard: {}",
                std::io::Error::last_os_error()
            );
            std::process::abort();
        }
        self.guard = 0;
    }

    #[cfg(not(unix))]
    fn unprotect_guard(&mut self) {}
}

impl Drop for Stack {
    fn drop(&mut self) {
        self.unprotect_guard();
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
    }
}

#[cfg(unix)]
fn page_size() -> usize {
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 { size as usize } else { 4096 }
}

#[cfg(not(unix))]
fn page_size() -> usize {
    4096
}
