//! Per-task state.

use std::fmt;

use crate::arch::Context;
use crate::stack::Stack;

/// Identity of a live task, unique among tasks alive at the same time.
///
/// Identities are task table slot indices and are reused once a task has
/// terminated. The initializer task of a fresh scheduler is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u16);

impl TaskId {
    /// Identity of the initializer task.
    pub const INITIALIZER: TaskId = TaskId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(index <= u16::MAX as usize);
        TaskId(index as u16)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Body of a created task.
pub(crate) type Entry = Box<dyn FnOnce() + 'static>;

/// A task record
pub(crate) struct Task {
    /// Registers at the last suspension point; meaningless while running
    pub(crate) context: Context,
    id: TaskId,
    entry: Option<Entry>,
    stack: Option<Stack>,
    started: bool,
}

impl Task {
    /// Record for the task already running on the thread's own stack.
    pub(crate) fn initializer(id: TaskId) -> Self {
        Task {
            context: Context::default(),
            id,
            entry: None,
            stack: None,
            started: true,
        }
    }

    /// Record for a created task, ready to be resumed into `trampoline`.
    pub(crate) fn new(
        id: TaskId,
        entry: Entry,
        stack: Stack,
        trampoline: extern "C" fn() -> !,
    ) -> Self {
        // The stack is owned by this record, so stack_top outlives the context.
        let context = unsafe { Context::new(stack.top(), trampoline) };

        Task {
            context,
            id,
            entry: Some(entry),
            stack: Some(stack),
            started: false,
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started
    }

    /// Returns `true` the first time it is called for a created task.
    pub(crate) fn mark_started(&mut self) -> bool {
        !std::mem::replace(&mut self.started, true)
    }

    pub(crate) fn take_entry(&mut self) -> Option<Entry> {
        self.entry.take()
    }

    pub(crate) fn stack(&self) -> Option<&Stack> {
        self.stack.as_ref()
    }

    /// `None` for the initializer.
    pub(crate) fn stack_top(&self) -> Option<usize> {
        self.stack.as_ref().map(Stack::top)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("started", &self.started)
            .field("has_entry", &self.entry.is_some())
            .field("stack_top", &self.stack_top())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TASK_STACK_SIZE;

    extern "C" fn never() -> ! {
        std::process::abort()
    }

    #[test]
    fn initializer_is_started_without_stack() {
        let task = Task::initializer(TaskId::INITIALIZER);
        assert!(task.is_started());
        assert_eq!(task.stack_top(), None);
    }

    #[test]
    fn created_task_starts_once() {
        let stack = Stack::new(TASK_STACK_SIZE).unwrap();
        let top = stack.top();
        let mut task = Task::new(TaskId::from_index(3), Box::new(|| {}), stack, never);

        assert_eq!(task.id().as_u16(), 3);
        assert_eq!(task.stack_top(), Some(top));
        assert!(task.stack().unwrap().contains(task.context.stack_pointer()));
        assert!(!task.is_started());
        assert!(task.mark_started());
        assert!(!task.mark_started());
        assert!(task.take_entry().is_some());
        assert!(task.take_entry().is_none());
    }

    #[test]
    fn display_uses_hash_prefix() {
        assert_eq!(TaskId::from_index(12).to_string(), "#12");
    }
}
