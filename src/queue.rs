//! Run queue: the round-robin rotation of live tasks.

use crate::error::TaskError;
use crate::task::TaskId;

/// Fixed-capacity circular rotation of task identities with a current
/// position.
///
/// The occupied prefix `entries[..len]` is the scheduling order. Whenever the
/// queue is non-empty, `position < len`.
#[derive(Debug)]
pub(crate) struct RunQueue {
    entries: Box<[TaskId]>,
    len: usize,
    position: usize,
}

impl RunQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        RunQueue {
            entries: vec![TaskId::INITIALIZER; capacity].into_boxed_slice(),
            len: 0,
            position: 0,
        }
    }

    /// Append at the tail of the rotation. The current position does not
    /// move, so the new task runs after every task already queued behind the
    /// current one.
    pub(crate) fn add(&mut self, id: TaskId) -> Result<(), TaskError> {
        let slot = self.entries.get_mut(self.len).ok_or(TaskError::QueueFull)?;
        *slot = id;
        self.len += 1;
        Ok(())
    }

    pub(crate) fn current(&self) -> Option<TaskId> {
        self.entries[..self.len].get(self.position).copied()
    }

    /// Rotate to the next entry. A single entry rotates onto itself.
    pub(crate) fn advance(&mut self) {
        if self.len != 0 {
            self.position = (self.position + 1) % self.len;
        }
    }

    /// Swap-remove the current entry and return it.
    ///
    /// The last entry takes the vacated slot and the position stays put, so
    /// it now refers to that moved entry. Removing the tail entry wraps the
    /// position to the head. Callers handing the CPU on call [`advance`]
    /// afterwards, so the moved entry does not run again straight away.
    ///
    /// Aborts the process if the position is out of range: that can only
    /// mean the queue itself is corrupt.
    ///
    /// [`advance`]: RunQueue::advance
    pub(crate) fn remove_current(&mut self) -> TaskId {
        if self.position >= self.len {
            corrupt(self.position, self.len);
        }

        let removed = self.entries[self.position];
        self.len -= 1;
        if self.position < self.len {
            self.entries[self.position] = self.entries[self.len];
        } else {
            self.position = 0;
        }
        removed
    }

    /// Point the position at `id`. Returns `false` if `id` is not queued.
    pub(crate) fn set_current(&mut self, id: TaskId) -> bool {
        match self.entries[..self.len].iter().position(|&e| e == id) {
            Some(index) => {
                self.position = index;
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Occupied entries in rotation order, starting at index 0.
    pub(crate) fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.entries[..self.len].iter().copied()
    }
}

#[cold]
fn corrupt(position: usize, len: usize) -> ! {
    log::error!("run queue index {} out of range for {} entries", position, len);
    std::process::abort()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[usize]) -> Vec<TaskId> {
        raw.iter().map(|&i| TaskId::from_index(i)).collect()
    }

    fn queue_of(raw: &[usize]) -> RunQueue {
        let mut queue = RunQueue::with_capacity(8);
        for id in ids(raw) {
            queue.add(id).unwrap();
        }
        queue
    }

    #[test]
    fn remove_current_swaps_in_last_entry() {
        let mut queue = queue_of(&[5, 2, 9]);
        queue.advance();
        assert_eq!(queue.current(), Some(TaskId::from_index(2)));

        assert_eq!(queue.remove_current(), TaskId::from_index(2));
        assert_eq!(queue.iter().collect::<Vec<_>>(), ids(&[5, 9]));
        assert_eq!(queue.current(), Some(TaskId::from_index(9)));
    }

    #[test]
    fn remove_tail_wraps_to_head() {
        let mut queue = queue_of(&[1, 2, 3]);
        queue.advance();
        queue.advance();
        assert_eq!(queue.remove_current(), TaskId::from_index(3));
        assert_eq!(queue.current(), Some(TaskId::from_index(1)));
    }

    #[test]
    fn remove_then_advance_matches_terminate_handoff() {
        // tail removal wraps to 0, then advance: [0, 1, 2] at 2 -> [0, 1] at 1
        let mut queue = queue_of(&[0, 1, 2]);
        queue.advance();
        queue.advance();
        queue.remove_current();
        queue.advance();
        assert_eq!(queue.current(), Some(TaskId::from_index(1)));

        // head removal: [0, 1, 2] at 0 -> [2, 1] at 0 -> advance -> 1
        let mut queue = queue_of(&[0, 1, 2]);
        queue.remove_current();
        queue.advance();
        assert_eq!(queue.iter().collect::<Vec<_>>(), ids(&[2, 1]));
        assert_eq!(queue.current(), Some(TaskId::from_index(1)));
    }

    #[test]
    fn remove_last_remaining_entry_empties_queue() {
        let mut queue = queue_of(&[4]);
        assert_eq!(queue.remove_current(), TaskId::from_index(4));
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.current(), None);
    }

    #[test]
    fn advance_is_round_robin() {
        let mut queue = queue_of(&[0, 1, 2]);
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(queue.current().unwrap());
            queue.advance();
        }
        assert_eq!(seen, ids(&[0, 1, 2, 0, 1, 2]));
    }

    #[test]
    fn single_entry_rotates_onto_itself() {
        let mut queue = queue_of(&[7]);
        queue.advance();
        assert_eq!(queue.current(), Some(TaskId::from_index(7)));
    }

    #[test]
    fn add_after_current_joins_at_tail() {
        let mut queue = queue_of(&[0, 1]);
        queue.advance();
        queue.add(TaskId::from_index(2)).unwrap();
        assert_eq!(queue.current(), Some(TaskId::from_index(1)));
        queue.advance();
        assert_eq!(queue.current(), Some(TaskId::from_index(2)));
    }

    #[test]
    fn full_queue_rejects_add() {
        let mut queue = RunQueue::with_capacity(2);
        queue.add(TaskId::from_index(0)).unwrap();
        queue.add(TaskId::from_index(1)).unwrap();
        assert_eq!(queue.add(TaskId::from_index(2)), Err(TaskError::QueueFull));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn set_current_seeds_position() {
        let mut queue = queue_of(&[3, 6]);
        assert!(queue.set_current(TaskId::from_index(6)));
        assert_eq!(queue.current(), Some(TaskId::from_index(6)));
        assert!(!queue.set_current(TaskId::from_index(9)));
    }

    #[test]
    fn empty_queue_has_no_current() {
        let mut queue = RunQueue::with_capacity(4);
        queue.advance();
        assert_eq!(queue.current(), None);
    }
}
