//! Cooperative scheduler
//!
//! # Example
//!
//! ```no_run
//! use coop_tasking::{create, setup, terminate, yield_now};
//!
//! setup().expect("tasking already set up");
//!
//! create(|| {
//!     println!("Task 1");
//!     yield_now();
//!     println!("Task 1 done");
//! })
//! .unwrap();
//!
//! create(|| println!("Task 2")).unwrap();
//!
//! yield_now();
//! terminate();
//! ```
//!
//! The thread that calls [`setup`] becomes the initializer task. Every task,
//! the initializer included, runs until it calls [`yield_now`] or
//! [`terminate`]. Returning from a task body terminates the task. When the
//! last task terminates the process exits with status 0.
//!
//! Scheduler state is per thread: tasks created on one thread only ever run
//! on that thread.

use std::cell::UnsafeCell;
use std::process;

use log::{debug, trace, warn};

use crate::arch::{Context, context_switch, context_switch_destroy};
use crate::config::{TASK_COUNT_MAX, TASK_STACK_SIZE};
use crate::error::TaskError;
use crate::queue::RunQueue;
use crate::stack::Stack;
use crate::table::TaskTable;
use crate::task::{Entry, Task, TaskId};

thread_local! {
    static SCHEDULER: UnsafeCell<Option<Scheduler>> = const { UnsafeCell::new(None) };
}

/// Get a raw pointer to this thread's scheduler slot.
///
/// References derived from it must not be held across a context switch:
/// the task resumed next derives its own.
fn scheduler() -> *mut Option<Scheduler> {
    SCHEDULER.with(|s| s.get())
}

/// # Safety
/// The returned reference must be dropped before the next context switch.
unsafe fn scheduler_mut<'a>() -> Option<&'a mut Scheduler> {
    unsafe { (*scheduler()).as_mut() }
}

/// Per-thread scheduler state
#[derive(Debug)]
struct Scheduler {
    table: TaskTable,
    queue: RunQueue,
}

impl Scheduler {
    fn new(capacity: usize) -> Result<Self, TaskError> {
        let mut table = TaskTable::with_capacity(capacity);
        let mut queue = RunQueue::with_capacity(capacity);

        let slot = table.allocate()?;
        let id = slot.id();
        slot.insert(Task::initializer(id));
        queue.add(id)?;
        let seeded = queue.set_current(id);
        debug_assert!(seeded, "initializer missing from a fresh run queue");

        Ok(Scheduler { table, queue })
    }

    fn current(&self) -> TaskId {
        self.queue
            .current()
            .expect("run queue is empty while a task is running")
    }

    fn spawn(&mut self, entry: Entry) -> Result<TaskId, TaskError> {
        let slot = self.table.allocate()?;
        let id = slot.id();
        let stack = Stack::new(TASK_STACK_SIZE)?;
        debug!(
            "task {} stack {:#x}..{:#x} ({} bytes usable)",
            id,
            stack.bottom(),
            stack.top(),
            stack.usable()
        );
        // Queue before filling the slot: on failure both the reservation and
        // the stack are dropped and nothing is left half-created.
        self.queue.add(id)?;
        slot.insert(Task::new(id, entry, stack, task_entry));
        Ok(id)
    }

    /// Raw pointer to a live task's register context.
    ///
    /// The table never moves its slots, so the pointer stays valid until the
    /// task is released.
    fn context_ptr(&mut self, id: TaskId) -> *mut Context {
        let task = self
            .table
            .lookup_mut(id)
            .expect("queued task has no task record");
        &raw mut task.context
    }

    /// Pointer to the context of `id`, which is about to be resumed.
    fn resume_ptr(&mut self, id: TaskId) -> *const Context {
        let task = self
            .table
            .lookup_mut(id)
            .expect("queued task has no task record");
        if task.mark_started() {
            debug!("task {} starting", id);
        }
        debug_assert!(
            task.stack()
                .is_none_or(|s| s.contains(task.context.stack_pointer()))
        );
        &raw const task.context
    }

    /// Rotate the run queue. Returns the contexts to switch between, or
    /// `None` when the current task is alone.
    fn rotate(&mut self) -> Option<(*mut Context, *const Context)> {
        let old = self.current();
        self.queue.advance();
        let new = self.current();
        if old == new {
            return None;
        }

        trace!("switch {} -> {}", old, new);
        Some((self.context_ptr(old), self.resume_ptr(new)))
    }

    /// Unqueue the current task and rotate past the slot it vacated.
    /// Returns it with the context of the task to resume, or `None` when no
    /// other task exists.
    fn retire(&mut self) -> Option<(TaskId, *const Context)> {
        if self.queue.len() <= 1 {
            return None;
        }

        let dying = self.queue.remove_current();
        self.queue.advance();
        let next = self.current();
        debug!(
            "task {} terminating, resuming {} (queue: {:?})",
            dying,
            next,
            self.queue.iter().collect::<Vec<_>>()
        );
        Some((dying, self.resume_ptr(next)))
    }
}

/// Entry point for created tasks
///
/// Reached through `ret` from a manufactured context on the task's own
/// stack. Never returns: after the body finishes the task terminates.
/// A panic escaping the body aborts the process.
extern "C" fn task_entry() -> ! {
    let entry = {
        let sched =
            unsafe { scheduler_mut() }.expect("task started on a thread without a scheduler");
        let id = sched.current();
        sched.table.lookup_mut(id).and_then(Task::take_entry)
    };

    if let Some(f) = entry {
        f();
    }

    terminate()
}

/// Runs on the resumed task's stack, after the dying task's stack is
/// abandoned.
extern "C" fn reclaim(index: usize) {
    if let Some(sched) = unsafe { scheduler_mut() } {
        sched.table.release(TaskId::from_index(index));
    }
}

/// Turn the calling thread into the initializer task.
///
/// Fails if this thread already has a scheduler.
pub fn setup() -> Result<(), TaskError> {
    let slot = scheduler();
    unsafe {
        if (*slot).is_some() {
            return Err(TaskError::AlreadySetUp);
        }
        *slot = Some(Scheduler::new(TASK_COUNT_MAX)?);
    }
    debug!("tasking set up, initializer is task {}", TaskId::INITIALIZER);
    Ok(())
}

/// Create a task running `f` on a fresh stack.
///
/// The task joins the tail of the rotation and first runs when a yield
/// reaches it. Fails without side effects if the task table or run queue is
/// full or the stack cannot be allocated.
pub fn create<F>(f: F) -> Result<TaskId, TaskError>
where
    F: FnOnce() + 'static,
{
    let sched = unsafe { scheduler_mut() }.ok_or(TaskError::NotSetUp)?;
    match sched.spawn(Box::new(f)) {
        Ok(id) => {
            debug!("created task {}", id);
            Ok(id)
        }
        Err(e) => {
            warn!("task creation failed: {}", e);
            Err(e)
        }
    }
}

/// Hand the CPU to the next task in the rotation.
///
/// Returns when the rotation comes back to the caller. A no-op when the
/// caller is the only task.
///
/// # Panics
/// If [`setup`] has not been called on this thread.
pub fn yield_now() {
    let switch = {
        let sched = unsafe { scheduler_mut() }.expect("yield_now() called before setup()");
        sched.rotate()
    };

    if let Some((old, new)) = switch {
        unsafe { context_switch(old, new) };
    }
}

/// End the calling task.
///
/// The next task in the rotation is resumed and the caller's record and
/// stack are freed from that task's stack. Destructors of values still on
/// the caller's stack do not run. If the caller is the last task, the
/// process exits with status 0.
///
/// # Panics
/// If [`setup`] has not been called on this thread.
pub fn terminate() -> ! {
    let (dying, next) = {
        let sched = unsafe { scheduler_mut() }.expect("terminate() called before setup()");
        match sched.retire() {
            Some(handoff) => handoff,
            None => {
                debug!("last task {} terminated, exiting", sched.current());
                process::exit(0)
            }
        }
    };

    unsafe { context_switch_destroy(next, reclaim, dying.index()) }
}

/// Identity of the running task, or `None` before [`setup`].
pub fn current_id() -> Option<TaskId> {
    let sched = unsafe { scheduler_mut() }?;
    Some(sched.current())
}

/// Number of live tasks, the initializer included. `0` before [`setup`].
pub fn task_count() -> usize {
    match unsafe { scheduler_mut() } {
        Some(sched) => sched.table.len(),
        None => 0,
    }
}

/// Whether `id` names a live task that has been switched into at least once.
pub fn has_started(id: TaskId) -> bool {
    let Some(sched) = (unsafe { scheduler_mut() }) else {
        return false;
    };
    sched.table.lookup(id).is_some_and(Task::is_started)
}
