//! Actuator controllers — enabled/speed state bound to a scheduler task.
//!
//! The blinker and the sniffer are the same machine: an on/off switch, a
//! 1–10 speed, and a periodic task whose interval is `speed * scale_ms`.
//! [`ActuatorController`] owns that state and keeps three things in step:
//!
//! ```text
//!   ActuatorState ──▶ scheduler task (armed flag, interval)
//!        │
//!        └──────────▶ published characteristics (enable byte, speed byte)
//! ```
//!
//! The hardware effect itself lives behind the [`Actuator`] port.

use core::fmt;

use log::{info, warn};

use crate::config::ActuatorConfig;
use crate::error::{Error, WriteError};
use crate::gatt::Characteristic;
use crate::scheduler::{PeriodicTask, Scheduler, TaskId};

use super::ports::{Actuator, GattPort};

/// Slowest accepted speed step.
pub const SPEED_MIN: u8 = 1;
/// Fastest accepted speed step.
pub const SPEED_MAX: u8 = 10;

// ───────────────────────────────────────────────────────────────
// Speed
// ───────────────────────────────────────────────────────────────

/// A speed step known to lie in `SPEED_MIN..=SPEED_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Speed(u8);

impl Speed {
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Speed {
    type Error = WriteError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (SPEED_MIN..=SPEED_MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(WriteError::OutOfRange { value })
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Kind
// ───────────────────────────────────────────────────────────────

/// Which actuator a controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorKind {
    Blinker,
    Sniffer,
}

impl ActuatorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Blinker => "blinker",
            Self::Sniffer => "sniffer",
        }
    }

    /// The 1-byte on/off characteristic.
    pub const fn enable_characteristic(self) -> Characteristic {
        match self {
            Self::Blinker => Characteristic::BlinkerBlink,
            Self::Sniffer => Characteristic::SnifferStatus,
        }
    }

    /// The 1-byte speed characteristic.
    pub const fn speed_characteristic(self) -> Characteristic {
        match self {
            Self::Blinker => Characteristic::BlinkerSpeed,
            Self::Sniffer => Characteristic::SnifferSpeed,
        }
    }
}

impl fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ───────────────────────────────────────────────────────────────
// State
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub enabled: bool,
    pub speed: Speed,
    pub scale_ms: u32,
}

impl ActuatorState {
    /// Task period derived from the current speed.
    pub fn interval_ms(&self) -> u32 {
        u32::from(self.speed.get()) * self.scale_ms
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct ActuatorController<A> {
    kind: ActuatorKind,
    state: ActuatorState,
    task: TaskId,
    actuator: A,
}

impl<A: Actuator> ActuatorController<A> {
    /// Register a disarmed task for this actuator and start at the
    /// configured default speed.
    pub fn new(
        kind: ActuatorKind,
        cfg: &ActuatorConfig,
        actuator: A,
        sched: &mut Scheduler,
    ) -> Result<Self, Error> {
        let speed = Speed::try_from(cfg.default_speed)
            .map_err(|_| Error::Config("actuator default speed out of range"))?;
        let state = ActuatorState {
            enabled: false,
            speed,
            scale_ms: cfg.scale_ms,
        };
        let task = sched.schedule(PeriodicTask::new(kind.label(), state.interval_ms()))?;
        Ok(Self {
            kind,
            state,
            task,
            actuator,
        })
    }

    /// Publish the boot values of both characteristics.
    pub fn publish_initial(&self, gatt: &mut impl GattPort) {
        gatt.publish(
            self.kind.enable_characteristic(),
            &[u8::from(self.state.enabled)],
        );
        gatt.publish(self.kind.speed_characteristic(), &[self.state.speed.get()]);
    }

    /// Switch the actuator on or off.
    ///
    /// Returns `false`, publishing nothing, when already in the requested
    /// state.  Turning on restarts the task with zero delay; turning off
    /// disarms it and rests the hardware.
    pub fn set_enabled(
        &mut self,
        on: bool,
        notify: bool,
        sched: &mut Scheduler,
        gatt: &mut impl GattPort,
    ) -> bool {
        if on == self.state.enabled {
            return false;
        }
        self.state.enabled = on;

        if on {
            sched.restart_immediately(self.task);
        } else {
            sched.disable(self.task);
            self.actuator.rest();
        }

        let ch = self.kind.enable_characteristic();
        gatt.publish(ch, &[u8::from(on)]);
        if notify {
            gatt.notify(ch);
        }
        info!(
            "{}: {}",
            self.kind,
            if on { "enabled" } else { "disabled" }
        );
        true
    }

    /// Apply a raw speed byte.
    ///
    /// Out-of-range values change nothing and put the last valid speed
    /// back on the characteristic.
    pub fn set_speed(
        &mut self,
        raw: u8,
        sched: &mut Scheduler,
        gatt: &mut impl GattPort,
    ) -> Result<Speed, WriteError> {
        let speed = match Speed::try_from(raw) {
            Ok(speed) => speed,
            Err(e) => {
                warn!("{}: speed {} rejected ({})", self.kind, raw, e);
                self.revert_speed(gatt);
                return Err(e);
            }
        };

        self.state.speed = speed;
        let interval = self.state.interval_ms();
        sched.set_interval(self.task, interval);
        gatt.publish(self.kind.speed_characteristic(), &[speed.get()]);
        info!("{}: speed {} ({} ms)", self.kind, speed, interval);
        Ok(speed)
    }

    /// Republish the last accepted speed.
    pub fn revert_speed(&self, gatt: &mut impl GattPort) {
        gatt.publish(self.kind.speed_characteristic(), &[self.state.speed.get()]);
    }

    /// One run of the bound task.
    pub fn on_tick(&mut self, run_counter: u64, now_ms: u64, gatt: &mut impl GattPort) {
        self.actuator.on_tick(run_counter, now_ms, gatt);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn kind(&self) -> ActuatorKind {
        self.kind
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn speed(&self) -> Speed {
        self.state.speed
    }

    pub fn interval_ms(&self) -> u32 {
        self.state.interval_ms()
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
