//! Task table: fixed-capacity slots indexed by task identity.

use log::debug;

use crate::error::TaskError;
use crate::task::{Task, TaskId};

/// Owns every task record and, through them, every task stack.
///
/// The slot array is allocated once and never resized, so a record (and the
/// register context inside it) keeps its address for as long as it is live.
/// The switch primitives rely on this.
#[derive(Debug)]
pub(crate) struct TaskTable {
    slots: Box<[Option<Task>]>,
    live: usize,
}

/// A reserved, still empty slot returned by [`TaskTable::allocate`].
///
/// Dropping it without calling [`VacantSlot::insert`] leaves the slot free.
pub(crate) struct VacantSlot<'a> {
    slot: &'a mut Option<Task>,
    live: &'a mut usize,
    id: TaskId,
}

impl VacantSlot<'_> {
    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn insert(self, task: Task) {
        debug_assert_eq!(task.id(), self.id);
        *self.slot = Some(task);
        *self.live += 1;
    }
}

impl TaskTable {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        TaskTable {
            slots: (0..capacity).map(|_| None).collect(),
            live: 0,
        }
    }

    /// Reserve the lowest free slot.
    pub(crate) fn allocate(&mut self) -> Result<VacantSlot<'_>, TaskError> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(TaskError::TableFull)?;

        Ok(VacantSlot {
            slot: &mut self.slots[index],
            live: &mut self.live,
            id: TaskId::from_index(index),
        })
    }

    pub(crate) fn lookup(&self, id: TaskId) -> Option<&Task> {
        self.slots.get(id.index())?.as_ref()
    }

    pub(crate) fn lookup_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// Destroy the record and free its stack.
    ///
    /// Must not be called for the task that is currently executing.
    pub(crate) fn release(&mut self, id: TaskId) -> bool {
        let Some(task) = self.slots.get_mut(id.index()).and_then(Option::take) else {
            return false;
        };
        self.live -= 1;
        debug!(
            "released task {} (stack_top {:?})",
            task.id(),
            task.stack_top()
        );
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }
}
