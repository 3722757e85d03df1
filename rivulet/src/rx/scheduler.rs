//! Timer facility used by timer sources and delayed retries

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::trace;

/// Deferred unit of work
pub type Task = Box<dyn FnOnce()>;

/// Identifies a scheduled task for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Single-threaded timer facility
pub trait Scheduler {
    /// Run `task` once after `delay`
    fn schedule_once(&self, delay: Duration, task: Task) -> TaskHandle;

    /// Drop a pending task. Unknown or already-run handles are ignored.
    fn cancel(&self, handle: TaskHandle);
}

#[derive(Default)]
struct VirtualClock {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), Task>,
}

/// Deterministic scheduler driven by hand.
///
/// Time only moves when [`advance_by`](Self::advance_by) or
/// [`advance_to`](Self::advance_to) is called. Tasks due at the same instant run
/// in the order they were scheduled.
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    clock: Rc<RefCell<VirtualClock>>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.clock.borrow().queue.len()
    }

    pub fn advance_by(&self, delta: Duration) {
        let target = self.now().saturating_add(delta);
        self.advance_to(target);
    }

    /// Run every task due at or before `target`, then set the clock to `target`
    pub fn advance_to(&self, target: Duration) {
        while let Some(task) = self.pop_due(Some(target)) {
            task();
        }
        let mut clock = self.clock.borrow_mut();
        if clock.now < target {
            clock.now = target;
        }
    }

    /// Run tasks until the queue is empty. Never returns for periodic sources
    /// that are not cancelled.
    pub fn run_until_idle(&self) {
        while let Some(task) = self.pop_due(None) {
            task();
        }
    }

    fn pop_due(&self, limit: Option<Duration>) -> Option<Task> {
        let mut clock = self.clock.borrow_mut();
        let (&(due, id), _) = clock.queue.first_key_value()?;
        if limit.is_some_and(|limit| due > limit) {
            return None;
        }
        let task = clock.queue.remove(&(due, id))?;
        clock.now = due;
        trace!(at_ms = due.as_millis() as u64, task = id, "virtual task due");
        Some(task)
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule_once(&self, delay: Duration, task: Task) -> TaskHandle {
        let mut clock = self.clock.borrow_mut();
        clock.next_id += 1;
        let id = clock.next_id;
        let due = clock.now.saturating_add(delay);
        clock.queue.insert((due, id), task);
        TaskHandle(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        self.clock
            .borrow_mut()
            .queue
            .retain(|&(_, id), _| id != handle.0);
    }
}

#[derive(Default)]
struct TokioTasks {
    next_id: u64,
    handles: HashMap<TaskHandle, AbortHandle>,
}

/// Scheduler backed by `tokio::time::sleep` on the current `LocalSet`.
///
/// Must be used from inside a [`tokio::task::LocalSet`].
#[derive(Clone, Default)]
pub struct TokioScheduler {
    tasks: Rc<RefCell<TokioTasks>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run
    pub fn pending(&self) -> usize {
        self.tasks.borrow().handles.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, task: Task) -> TaskHandle {
        let handle = {
            let mut tasks = self.tasks.borrow_mut();
            tasks.next_id += 1;
            TaskHandle(tasks.next_id)
        };

        let registry = Rc::downgrade(&self.tasks);
        let join = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().handles.remove(&handle);
            }
            task();
        });

        self.tasks
            .borrow_mut()
            .handles
            .insert(handle, join.abort_handle());
        handle
    }

    fn cancel(&self, handle: TaskHandle) {
        let abort = self.tasks.borrow_mut().handles.remove(&handle);
        if let Some(abort) = abort {
            abort.abort();
        }
    }
}
