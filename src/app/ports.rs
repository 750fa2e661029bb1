//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DeviceService (domain)
//! ```
//!
//! Driven adapters (GATT server, actuators, analog inputs, event sinks)
//! implement these traits.  The [`DeviceService`](super::service::DeviceService)
//! consumes them via generics, so the domain core never touches the BLE
//! stack or the pins directly.

use crate::gatt::{CharValue, Characteristic};
use crate::scheduler::{Scheduler, TaskId};

// ───────────────────────────────────────────────────────────────
// GATT port (driven adapter: domain ↔ BLE characteristic storage)
// ───────────────────────────────────────────────────────────────

/// The published side of every characteristic.
///
/// The domain writes values here and asks for notifications; clients only
/// ever see what went through this port.  Implementations must not call
/// back into the domain.
pub trait GattPort {
    /// Replace the stored value of `ch`.  Values longer than
    /// [`MAX_VALUE_LEN`](crate::gatt::MAX_VALUE_LEN) are truncated.
    fn publish(&mut self, ch: Characteristic, value: &[u8]);

    /// Push the stored value of `ch` to a subscribed client, if any.
    fn notify(&mut self, ch: Characteristic);

    /// Read back the stored value of `ch`.
    fn value(&self, ch: Characteristic) -> CharValue;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Periodic hardware effect bound to an
/// [`ActuatorController`](super::actuator::ActuatorController).
pub trait Actuator {
    /// One task run.  `run_counter` is 1 on the first run after enable.
    fn on_tick<G: GattPort>(&mut self, run_counter: u64, now_ms: u64, gatt: &mut G);

    /// Called when the controller disarms its task.  Leave the hardware
    /// in its idle state.
    fn rest(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Analog input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Single-channel analog reading in millivolts.
pub trait AnalogInput {
    /// `None` when the conversion failed.
    fn read_millivolts(&mut self) -> Option<u16>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a task falls due.
///
/// The [`Scheduler`] knows nothing about controllers or pins.  The
/// delegate maps a [`TaskId`] back to whoever owns it and is handed the
/// scheduler so it can re-arm, delay or disarm tasks from inside the run.
pub trait SchedulerDelegate {
    /// Called once per due task, in registration order.
    ///
    /// * `run_counter`: invocations since the task was last restarted.
    fn on_task_due(&mut self, sched: &mut Scheduler, task: TaskId, run_counter: u64);
}
