//! Polled push-button with a hold-off window.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  No interrupt: a scheduler
//! task samples the level every `button_poll_ms`.
//!
//! ## Debounce
//!
//! Level-based.  A low sample counts as a press; the driver then pushes
//! its own task out by `hold_off_ms`, so a held button toggles at most
//! once per hold-off window and contact bounce is never sampled.
//!
//! ```text
//!   poll ─30ms─ poll ─30ms─ PRESS ──────── 1000ms ──────── poll ─30ms─ …
//! ```

use embedded_hal::digital::InputPin;
use log::debug;

use crate::error::SchedulerError;
use crate::scheduler::{PeriodicTask, Scheduler, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonDebounceState {
    /// Scheduler clock at the last accepted press.
    pub last_toggle_ms: Option<u64>,
    pub hold_off_ms: u32,
}

pub struct ButtonDebouncer<P> {
    pin: P,
    task: TaskId,
    state: ButtonDebounceState,
}

impl<P: InputPin> ButtonDebouncer<P> {
    /// Register an armed polling task.
    pub fn new(
        pin: P,
        poll_ms: u32,
        hold_off_ms: u32,
        sched: &mut Scheduler,
    ) -> Result<Self, SchedulerError> {
        let task = sched.schedule(PeriodicTask::new("button", poll_ms).armed())?;
        Ok(Self {
            pin,
            task,
            state: ButtonDebounceState {
                last_toggle_ms: None,
                hold_off_ms,
            },
        })
    }

    /// One poll.  Returns `true` when a press was accepted; the caller
    /// performs the toggle.
    pub fn on_tick(&mut self, sched: &mut Scheduler) -> bool {
        // A pin read error counts as released.
        if !self.pin.is_low().unwrap_or(false) {
            return false;
        }

        let now = sched.now_ms();
        self.state.last_toggle_ms = Some(now);
        sched.delay(self.task, self.state.hold_off_ms);
        debug!("button: press at {} ms, hold-off {} ms", now, self.state.hold_off_ms);
        true
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn state(&self) -> ButtonDebounceState {
        self.state
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }
}
