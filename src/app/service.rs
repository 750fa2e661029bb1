//! Device service — the hexagonal core.
//!
//! [`DeviceService`] owns the scheduler, both actuator controllers and the
//! button.  It is the only code that mutates controller state: scheduler
//! ticks and client writes both arrive here on the main task.
//!
//! ```text
//!   EVENTS queue ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                    │      DeviceService        │
//!   main loop poll ─▶│ Scheduler · Blinker ·     │ ──▶ GattPort
//!                    │ Sniffer · Button          │
//!                    └──────────────────────────┘
//! ```

use embedded_hal::digital::InputPin;
use log::{debug, info, warn};

use crate::config::{bounded, DeviceConfig, IdentityString};
use crate::drivers::button::ButtonDebouncer;
use crate::error::{Error, WriteError};
use crate::events::{Event, GattWrite};
use crate::gatt::Characteristic;
use crate::scheduler::{Scheduler, TaskId};

use super::actuator::{ActuatorController, ActuatorKind};
use super::events::AppEvent;
use super::gateway::{self, WriteOutcome};
use super::ports::{Actuator, EventSink, GattPort, SchedulerDelegate};

// ───────────────────────────────────────────────────────────────
// Identity
// ───────────────────────────────────────────────────────────────

/// Strings served by the Device Information service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub manufacturer: IdentityString,
    pub model: IdentityString,
    pub serial: IdentityString,
}

impl DeviceIdentity {
    pub fn new(config: &DeviceConfig, serial: &str) -> Self {
        Self {
            manufacturer: config.manufacturer.clone(),
            model: config.device_name.clone(),
            serial: bounded(serial),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// DeviceService
// ───────────────────────────────────────────────────────────────

pub struct DeviceService<B, S, P> {
    sched: Scheduler,
    blinker: ActuatorController<B>,
    sniffer: ActuatorController<S>,
    button: ButtonDebouncer<P>,
    connected: bool,
}

impl<B, S, P> DeviceService<B, S, P>
where
    B: Actuator,
    S: Actuator,
    P: InputPin,
{
    /// Validate the config and register the blinker, button and sniffer
    /// tasks, in that order.  Both actuators start disabled.
    pub fn new(config: &DeviceConfig, blink: B, sniff: S, button_pin: P) -> Result<Self, Error> {
        config.validate()?;

        let mut sched = Scheduler::new();
        let blinker =
            ActuatorController::new(ActuatorKind::Blinker, &config.blinker, blink, &mut sched)?;
        let button = ButtonDebouncer::new(
            button_pin,
            config.button_poll_ms,
            config.button_hold_off_ms,
            &mut sched,
        )?;
        let sniffer =
            ActuatorController::new(ActuatorKind::Sniffer, &config.sniffer, sniff, &mut sched)?;

        Ok(Self {
            sched,
            blinker,
            sniffer,
            button,
            connected: false,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Publish identity strings and the boot values of every writable
    /// characteristic.
    pub fn start(
        &mut self,
        identity: &DeviceIdentity,
        gatt: &mut impl GattPort,
        sink: &mut impl EventSink,
    ) {
        gatt.publish(Characteristic::Manufacturer, identity.manufacturer.as_bytes());
        gatt.publish(Characteristic::ModelName, identity.model.as_bytes());
        gatt.publish(Characteristic::SerialNumber, identity.serial.as_bytes());
        self.blinker.publish_initial(gatt);
        self.sniffer.publish_initial(gatt);

        sink.emit(&AppEvent::Started);
        info!(
            "DeviceService started ({} tasks, serial {})",
            self.sched.len(),
            identity.serial
        );
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run every task due at `now_ms`.  Returns how many ran.
    pub fn poll(
        &mut self,
        now_ms: u64,
        gatt: &mut impl GattPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut dispatch = TaskDispatch {
            blinker: &mut self.blinker,
            sniffer: &mut self.sniffer,
            button: &mut self.button,
            gatt,
            sink,
        };
        self.sched.tick(now_ms, &mut dispatch)
    }

    /// Handle one event drained from the inbound queue.
    pub fn handle_event(
        &mut self,
        event: Event,
        gatt: &mut impl GattPort,
        sink: &mut impl EventSink,
    ) {
        match event {
            Event::ClientConnected => {
                self.connected = true;
                sink.emit(&AppEvent::ClientConnected);
            }
            Event::ClientDisconnected => {
                self.connected = false;
                sink.emit(&AppEvent::ClientDisconnected);
            }
            Event::CharacteristicWritten(write) => {
                // Rejections are already reported through the sink.
                let _ = self.handle_write(&write, gatt, sink);
            }
        }
    }

    /// Route a client write through the gateway and report the outcome.
    pub fn handle_write(
        &mut self,
        write: &GattWrite,
        gatt: &mut impl GattPort,
        sink: &mut impl EventSink,
    ) -> Result<WriteOutcome, WriteError> {
        let ch = write.characteristic;
        let Some(target) = gateway::route(ch) else {
            warn!("write to read-only {} dropped", ch);
            let error = WriteError::NotWritable(ch);
            sink.emit(&AppEvent::WriteRejected {
                characteristic: ch,
                error,
            });
            return Err(error);
        };

        if write.is_truncated() {
            debug!("{}: {}-byte write, first {} kept", ch, write.len, write.data.len());
        }

        let kind = target.kind();
        let result = match kind {
            ActuatorKind::Blinker => gateway::apply(
                &mut self.blinker,
                target.field(),
                &write.data,
                write.len,
                &mut self.sched,
                gatt,
            ),
            ActuatorKind::Sniffer => gateway::apply(
                &mut self.sniffer,
                target.field(),
                &write.data,
                write.len,
                &mut self.sched,
                gatt,
            ),
        };

        match result {
            Ok(WriteOutcome::Switched { changed, enabled }) => {
                if changed {
                    sink.emit(&AppEvent::ActuatorSwitched {
                        kind,
                        enabled,
                        notified: false,
                    });
                }
            }
            Ok(WriteOutcome::SpeedSet(speed)) => {
                sink.emit(&AppEvent::SpeedChanged {
                    kind,
                    speed,
                    interval_ms: self.interval_ms(kind),
                });
            }
            Err(error) => {
                sink.emit(&AppEvent::WriteRejected {
                    characteristic: ch,
                    error,
                });
            }
        }
        result
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn blinker(&self) -> &ActuatorController<B> {
        &self.blinker
    }

    pub fn sniffer(&self) -> &ActuatorController<S> {
        &self.sniffer
    }

    pub fn button(&self) -> &ButtonDebouncer<P> {
        &self.button
    }

    pub fn button_mut(&mut self) -> &mut ButtonDebouncer<P> {
        &mut self.button
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.sched
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Current task interval of either actuator.
    pub fn interval_ms(&self, kind: ActuatorKind) -> u32 {
        match kind {
            ActuatorKind::Blinker => self.blinker.interval_ms(),
            ActuatorKind::Sniffer => self.sniffer.interval_ms(),
        }
    }

    pub fn is_enabled(&self, kind: ActuatorKind) -> bool {
        match kind {
            ActuatorKind::Blinker => self.blinker.is_enabled(),
            ActuatorKind::Sniffer => self.sniffer.is_enabled(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Task dispatch
// ───────────────────────────────────────────────────────────────

/// Maps due tasks back to their owners for the length of one tick.
/// Holds disjoint borrows of the service so the scheduler itself can be
/// lent to each callback.
struct TaskDispatch<'a, B, S, P, G, E> {
    blinker: &'a mut ActuatorController<B>,
    sniffer: &'a mut ActuatorController<S>,
    button: &'a mut ButtonDebouncer<P>,
    gatt: &'a mut G,
    sink: &'a mut E,
}

impl<B, S, P, G, E> SchedulerDelegate for TaskDispatch<'_, B, S, P, G, E>
where
    B: Actuator,
    S: Actuator,
    P: InputPin,
    G: GattPort,
    E: EventSink,
{
    fn on_task_due(&mut self, sched: &mut Scheduler, task: TaskId, run_counter: u64) {
        let now = sched.now_ms();
        if task == self.blinker.task() {
            self.blinker.on_tick(run_counter, now, &mut *self.gatt);
        } else if task == self.sniffer.task() {
            self.sniffer.on_tick(run_counter, now, &mut *self.gatt);
        } else if task == self.button.task() {
            if self.button.on_tick(sched) {
                self.sink.emit(&AppEvent::ButtonPressed);
                let on = !self.blinker.is_enabled();
                self.blinker.set_enabled(on, true, sched, &mut *self.gatt);
                self.sink.emit(&AppEvent::ActuatorSwitched {
                    kind: ActuatorKind::Blinker,
                    enabled: on,
                    notified: true,
                });
            }
        } else {
            warn!("DeviceService: unknown task slot {}", task.index());
        }
    }
}
