//! Cooperative millisecond scheduler.
//!
//! Run-to-completion task dispatcher polled once per main-loop iteration.
//! The scheduler owns a fixed table of [`PeriodicTask`]s; controllers keep
//! a [`TaskId`] handle to their own task.  When a task falls due the
//! scheduler invokes a [`SchedulerDelegate`] rather than a stored closure,
//! so the delegate can borrow controller state mutably while also being
//! handed the scheduler itself (to re-arm, delay or re-interval tasks).
//!
//! ```text
//!   main loop ──▶ Scheduler::tick(now_ms) ──▶ SchedulerDelegate::on_task_due
//!                        ▲                              │
//!                        └──── enable / disable / delay ┘
//! ```

use log::{debug, warn};

use crate::app::ports::SchedulerDelegate;
use crate::error::SchedulerError;

/// Maximum number of tasks (stack-allocated).
pub const MAX_TASKS: usize = 8;

/// Handle to a scheduled task.  Only the scheduler that issued it knows
/// what it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u8);

impl TaskId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ═══════════════════════════════════════════════════════════════
//  Task
// ═══════════════════════════════════════════════════════════════

/// A single periodic task.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    label: &'static str,
    interval_ms: u32,
    enabled: bool,
    /// Invocations since the last restart.  The first run after
    /// [`Scheduler::restart_immediately`] sees `1`.
    run_counter: u64,
    /// Clock value at which the task is next due.
    next_run_ms: u64,
}

impl PeriodicTask {
    /// A disarmed task with the given interval.
    pub fn new(label: &'static str, interval_ms: u32) -> Self {
        Self {
            label,
            interval_ms,
            enabled: false,
            run_counter: 0,
            next_run_ms: 0,
        }
    }

    /// Arm the task at registration; it first fires on the next tick.
    #[must_use]
    pub fn armed(mut self) -> Self {
        self.enabled = true;
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn run_counter(&self) -> u64 {
        self.run_counter
    }

    pub fn next_run_ms(&self) -> u64 {
        self.next_run_ms
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct Scheduler {
    tasks: heapless::Vec<PeriodicTask, MAX_TASKS>,
    /// Monotonic clock, advanced by [`tick`](Self::tick).
    now_ms: u64,
    /// Set while delegates run; guards against re-entrant ticks.
    ticking: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: heapless::Vec::new(),
            now_ms: 0,
            ticking: false,
        }
    }

    /// Register a task.  Armed tasks are due at the current clock value.
    pub fn schedule(&mut self, mut task: PeriodicTask) -> Result<TaskId, SchedulerError> {
        let id = TaskId(self.tasks.len() as u8);
        task.next_run_ms = self.now_ms;
        debug!(
            "Scheduler: '{}' at slot {} ({} ms, {})",
            task.label,
            id.0,
            task.interval_ms,
            if task.enabled { "armed" } else { "disarmed" }
        );
        self.tasks.push(task).map_err(|_| SchedulerError::Full)?;
        Ok(id)
    }

    /// Arm a task; it fires on the next tick.  Keeps its run counter.
    pub fn enable(&mut self, id: TaskId) {
        let now = self.now_ms;
        if let Some(task) = self.tasks.get_mut(id.index()) {
            task.enabled = true;
            task.next_run_ms = now;
        }
    }

    /// Disarm a task.  Returns `true` if it was armed.
    pub fn disable(&mut self, id: TaskId) -> bool {
        self.tasks
            .get_mut(id.index())
            .is_some_and(|task| core::mem::replace(&mut task.enabled, false))
    }

    /// Change the interval.  Takes effect immediately: the next run is
    /// one new interval from now, whether or not the task is armed.
    pub fn set_interval(&mut self, id: TaskId, interval_ms: u32) {
        let now = self.now_ms;
        if let Some(task) = self.tasks.get_mut(id.index()) {
            task.interval_ms = interval_ms;
            task.next_run_ms = now + u64::from(interval_ms);
        }
    }

    /// Reset the run counter and arm the task with zero delay.
    pub fn restart_immediately(&mut self, id: TaskId) {
        let now = self.now_ms;
        if let Some(task) = self.tasks.get_mut(id.index()) {
            task.run_counter = 0;
            task.enabled = true;
            task.next_run_ms = now;
        }
    }

    /// Push the next run of a task out to `delay_ms` from now.
    pub fn delay(&mut self, id: TaskId, delay_ms: u32) {
        let now = self.now_ms;
        if let Some(task) = self.tasks.get_mut(id.index()) {
            task.next_run_ms = now + u64::from(delay_ms);
        }
    }

    pub fn task(&self, id: TaskId) -> Option<&PeriodicTask> {
        self.tasks.get(id.index())
    }

    pub fn is_enabled(&self, id: TaskId) -> bool {
        self.task(id).is_some_and(PeriodicTask::is_enabled)
    }

    pub fn run_counter(&self, id: TaskId) -> u64 {
        self.task(id).map_or(0, PeriodicTask::run_counter)
    }

    pub fn interval_ms(&self, id: TaskId) -> u32 {
        self.task(id).map_or(0, PeriodicTask::interval_ms)
    }

    /// Current value of the scheduler clock.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Advance the clock to `now_ms` and run every armed task that is due.
    ///
    /// Tasks run in registration order, each at most once per tick.  A
    /// clock value lower than the previous one is ignored.  Returns the
    /// number of tasks that ran.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut impl SchedulerDelegate) -> usize {
        if self.ticking {
            warn!("Scheduler: re-entrant tick refused");
            return 0;
        }
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;
        self.ticking = true;

        let mut ran = 0;
        for index in 0..self.tasks.len() {
            let task = &mut self.tasks[index];
            if !task.enabled || task.next_run_ms > now {
                continue;
            }

            task.run_counter += 1;
            let interval = u64::from(task.interval_ms);
            let next = task.next_run_ms + interval;
            // Resync instead of bursting when the loop fell behind.
            task.next_run_ms = if next > now { next } else { now + interval };
            let run_counter = task.run_counter;

            delegate.on_task_due(self, TaskId(index as u8), run_counter);
            ran += 1;
        }

        self.ticking = false;
        ran
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
