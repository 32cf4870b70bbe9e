//! Cooperative multitasking on a single thread.
//!
//! Tasks are independently stacked execution contexts that hand the CPU to
//! each other only at explicit [`yield_now`] and [`terminate`] calls, in
//! round-robin order.
//!
//! Layers, leaves first:
//! - `arch`: register contexts and the switch / switch-and-destroy primitives
//! - `task`: the per-task record
//! - `table`: fixed-capacity task table owning records and stacks
//! - `queue`: the run queue rotation
//! - `scheduler`: the public interface

mod arch;
pub mod config;
mod error;
pub mod logging;
mod queue;
mod scheduler;
mod stack;
mod table;
mod task;

pub use config::{TASK_COUNT_MAX, TASK_STACK_SIZE};
pub use error::TaskError;
pub use scheduler::{create, current_id, has_started, setup, task_count, terminate, yield_now};
pub use task::TaskId;
