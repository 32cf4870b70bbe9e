//! Build-time configuration.

/// Maximum number of live tasks, the initializer included.
pub const TASK_COUNT_MAX: usize = 64;

/// Stack size for each created task (64KB), guard page included
pub const TASK_STACK_SIZE: usize = 64 * 1024;

/// Stack pointer alignment required by both supported ABIs.
pub const STACK_ALIGN: usize = 16;

/// Map the lowest page of every task stack inaccessible so overflows fault.
pub const STACK_GUARD: bool = true;

/// Environment variable read by [`crate::logging::init`].
pub const LOG_ENV: &str = "COOP_LOG";

// Task identities are u16.
const _: () = assert!(TASK_COUNT_MAX <= u16::MAX as usize + 1);
