//! x86_64 implementation of context switching

use std::arch::naked_asm;

use super::Reclaim;

/// Saved CPU context of a suspended task
///
/// On x86_64 System V ABI, these are the callee-saved registers
/// that must be preserved across function calls.
#[repr(C)]
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Stack pointer
    rsp: u64,
    /// Frame pointer
    rbp: u64,
    /// General purpose (callee-saved)
    rbx: u64,
    r12: u64,
    r13: u64,
    r14: u64,
    r15: u64,
}

impl Context {
    /// Manufacture the context of a task that has never run.
    ///
    /// The result looks exactly like a task suspended inside
    /// `context_switch`: the saved stack pointer addresses a return address,
    /// which here is `entry` instead of a call site.
    ///
    /// # Safety
    /// `stack_top` must be the 16-byte aligned end of a writable stack with
    /// room for at least 16 bytes below it.
    pub unsafe fn new(stack_top: usize, entry: extern "C" fn() -> !) -> Self {
        // System V requires RSP to be 16n+8 on function entry (as if a
        // `call` had just pushed a return address). `ret` pops `entry` from
        // stack_top - 16, leaving RSP = stack_top - 8.
        let initial_rsp = stack_top - 16;

        unsafe {
            std::ptr::write(initial_rsp as *mut u64, entry as usize as u64);
        }

        Context {
            rsp: initial_rsp as u64,
            ..Default::default()
        }
    }

    /// Saved stack pointer.
    pub fn stack_pointer(&self) -> usize {
        self.rsp as usize
    }
}

/// Switch from one context to another
///
/// Saves the current CPU state into `old` and restores state from `new`.
/// This function returns when another context switches back to `old`.
///
/// # Safety
/// Both pointers must be valid. The `new` context must have been properly
/// initialized (either by a previous `context_switch` or by `Context::new`).
#[unsafe(naked)]
pub unsafe extern "C" fn context_switch(_old: *mut Context, _new: *const Context) {
    naked_asm!(
        // Save callee-saved registers to old context (rdi)
        "mov [rdi + 0x00], rsp",
        "mov [rdi + 0x08], rbp",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], r12",
        "mov [rdi + 0x20], r13",
        "mov [rdi + 0x28], r14",
        "mov [rdi + 0x30], r15",
        // Load callee-saved registers from new context (rsi)
        "mov rsp, [rsi + 0x00]",
        "mov rbp, [rsi + 0x08]",
        "mov rbx, [rsi + 0x10]",
        "mov r12, [rsi + 0x18]",
        "mov r13, [rsi + 0x20]",
        "mov r14, [rsi + 0x28]",
        "mov r15, [rsi + 0x30]",
        // For a fresh task: pops the entry trampoline address and jumps there
        // For a suspended task: returns to where it called context_switch
        "ret",
    );
}

/// Abandon the current context, reclaim it, and resume `new`
///
/// Nothing is saved. The stack pointer moves to `new`'s stack first, then
/// `reclaim(arg)` runs on that stack, then `new`'s registers are restored.
/// The old stack is never touched again after the first instruction, so
/// `reclaim` may free it.
///
/// # Safety
/// `new` must be valid as for `context_switch` and must stay valid while
/// `reclaim` runs. `reclaim` must not unwind.
#[unsafe(naked)]
pub unsafe extern "C" fn context_switch_destroy(
    _new: *const Context,
    _reclaim: Reclaim,
    _arg: usize,
) -> ! {
    naked_asm!(
        // Leave the dying stack
        "mov rsp, [rdi + 0x00]",
        // rbx survives the call and is reloaded from `new` below
        "mov rbx, rdi",
        // Below the saved RSP is free; align it for the call
        "and rsp, -16",
        "mov rax, rsi",
        "mov rdi, rdx",
        "call rax",
        // Restore new context (rbx last, it holds the pointer)
        "mov rsp, [rbx + 0x00]",
        "mov rbp, [rbx + 0x08]",
        "mov r12, [rbx + 0x18]",
        "mov r13, [rbx + 0x20]",
        "mov r14, [rbx + 0x28]",
        "mov r15, [rbx + 0x30]",
        "mov rbx, [rbx + 0x10]",
        "ret",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn layout_matches_assembly_offsets() {
        assert_eq!(offset_of!(Context, rsp), 0x00);
        assert_eq!(offset_of!(Context, rbp), 0x08);
        assert_eq!(offset_of!(Context, rbx), 0x10);
        assert_eq!(offset_of!(Context, r12), 0x18);
        assert_eq!(offset_of!(Context, r15), 0x30);
    }

    extern "C" fn never() -> ! {
        std::process::abort()
    }

    #[test]
    fn fresh_context_returns_into_entry() {
        let mut stack = vec![0u64; 8];
        let top = (stack.as_mut_ptr() as usize + 64) & !0xF;
        let ctx = unsafe { Context::new(top, never) };

        assert_eq!(ctx.stack_pointer(), top - 16);
        assert_eq!(ctx.stack_pointer() % 16, 0);
        let slot = unsafe { std::ptr::read(ctx.stack_pointer() as *const u64) };
        assert_eq!(slot, never as usize as u64);
    }
}
