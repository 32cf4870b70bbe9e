//! Errors reported by the scheduler interface.

use std::fmt;

/// Why a task (or the scheduler itself) could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// `create` was called on a thread without a scheduler.
    NotSetUp,
    /// `setup` was called twice on the same thread.
    AlreadySetUp,
    /// Every task table slot is occupied.
    TableFull,
    /// The run queue is at capacity.
    QueueFull,
    /// The task stack (or its guard page) could not be set up.
    StackAlloc,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::NotSetUp => write!(f, "tasking has not been set up on this thread"),
            TaskError::AlreadySetUp => write!(f, "tasking is already set up on this thread"),
            TaskError::TableFull => write!(f, "task table is full"),
            TaskError::QueueFull => write!(f, "run queue is full"),
            TaskError::StackAlloc => write!(f, "failed to allocate task stack"),
        }
    }
}

impl std::error::Error for TaskError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase_sentence() {
        assert_eq!(TaskError::TableFull.to_string(), "task table is full");
        assert_eq!(
            TaskError::StackAlloc.to_string(),
            "failed to allocate task stack"
        );
    }

    #[test]
    fn usable_as_boxed_error() {
        let err: Box<dyn std::error::Error> = Box::new(TaskError::QueueFull);
        assert_eq!(err.to_string(), "run queue is full");
    }
}
