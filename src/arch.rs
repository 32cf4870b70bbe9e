//! Architecture-specific register contexts and switch primitives.
//!
//! Each backend provides the same narrow surface:
//! - `Context`: the callee-saved register set of a suspended task
//! - `context_switch`: save the running task, resume another
//! - `context_switch_destroy`: resume another task and reclaim the old one
//!   from the new task's stack

#[cfg(target_arch = "x86_64")]
mod x86_64;
#[cfg(target_arch = "x86_64")]
pub use x86_64::*;

#[cfg(target_arch = "aarch64")]
mod aarch64;
#[cfg(target_arch = "aarch64")]
pub use aarch64::*;

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("coop-tasking only supports x86_64 and aarch64");

/// Callback run by `context_switch_destroy` once the stack pointer is on the
/// new task's stack. Receives the argument passed to the switch.
pub type Reclaim = extern "C" fn(usize);
