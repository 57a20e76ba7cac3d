//! Cancellable delayed tasks.
//!
//! DESIGN
//! ======
//! Every deferred action (the post-logout redirect in particular) goes through
//! a [`Scheduler`] and hands back a [`TaskHandle`] owned by whoever scheduled
//! it. Dropping or cancelling the handle guarantees the task never runs, so
//! teardown is deterministic.

#[cfg(test)]
#[path = "schedule_test.rs"]
mod schedule_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Ran,
    Cancelled,
}

/// Ownership token for a scheduled task. Cancels on drop.
#[derive(Debug)]
pub struct TaskHandle {
    state: Rc<Cell<TaskState>>,
}

impl TaskHandle {
    fn new() -> (Self, Rc<Cell<TaskState>>) {
        let state = Rc::new(Cell::new(TaskState::Pending));
        (Self { state: state.clone() }, state)
    }

    /// Prevent the task from running. No effect once it already ran.
    pub fn cancel(&self) {
        if self.state.get() == TaskState::Pending {
            self.state.set(TaskState::Cancelled);
        }
    }

    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    pub fn is_pending(&self) -> bool {
        self.state.get() == TaskState::Pending
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Wrap `task` so it only runs while its handle still reports `Pending`.
fn guarded(state: Rc<Cell<TaskState>>, task: Box<dyn FnOnce()>) -> impl FnOnce() {
    move || {
        if state.get() == TaskState::Pending {
            state.set(TaskState::Ran);
            task();
        }
    }
}

pub trait Scheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle;
}

/// `setTimeout` via `gloo-timers`. Outside the browser tasks never run and
/// the returned handle is already cancelled.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle {
        let (handle, state) = TaskHandle::new();
        #[cfg(feature = "hydrate")]
        {
            let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
            // The closure checks the shared state, so forgetting the timer
            // cannot resurrect a cancelled task.
            gloo_timers::callback::Timeout::new(millis, guarded(state, task)).forget();
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (delay, task);
            state.set(TaskState::Cancelled);
        }
        handle
    }
}

struct ScheduledTask {
    due: Duration,
    run: Box<dyn FnOnce()>,
}

/// Scheduler driven by an explicit virtual clock, for tests and headless hosts.
#[derive(Default)]
pub struct ManualScheduler {
    elapsed: Cell<Duration>,
    queue: RefCell<Vec<ScheduledTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks, including ones cancelled but not yet reached.
    pub fn queued(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Move virtual time forward and run every task that came due, in order.
    pub fn advance(&self, by: Duration) {
        let now = self.elapsed.get() + by;
        self.elapsed.set(now);

        let mut due = {
            let mut queue = self.queue.borrow_mut();
            let (due, rest): (Vec<_>, Vec<_>) = queue.drain(..).partition(|t| t.due <= now);
            *queue = rest;
            due
        };
        due.sort_by_key(|t| t.due);
        for task in due {
            (task.run)();
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TaskHandle {
        let (handle, state) = TaskHandle::new();
        let due = self.elapsed.get() + delay;
        self.queue.borrow_mut().push(ScheduledTask { due, run: Box::new(guarded(state, task)) });
        handle
    }
}
