//! Outbound application events.
//!
//! The [`DeviceService`](super::service::DeviceService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the firmware logs them to serial.

use crate::error::WriteError;
use crate::gatt::Characteristic;

use super::actuator::{ActuatorKind, Speed};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Identity and initial values are published.
    Started,

    /// An actuator was switched on or off.
    ActuatorSwitched {
        kind: ActuatorKind,
        enabled: bool,
        /// Whether subscribers were notified of the change.
        notified: bool,
    },

    /// An actuator accepted a new speed.
    SpeedChanged {
        kind: ActuatorKind,
        speed: Speed,
        interval_ms: u32,
    },

    /// A client write was refused.
    WriteRejected {
        characteristic: Characteristic,
        error: WriteError,
    },

    /// The button passed debounce.
    ButtonPressed,

    ClientConnected,
    ClientDisconnected,
}
