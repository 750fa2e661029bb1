//! Characteristic write gateway.
//!
//! Every client write lands here before it may touch controller state.
//! The gateway routes the characteristic to its controller field, decodes
//! the single-byte payload, and either commits it or rejects it.
//!
//! | Field  | Malformed payload         | Bad value                  |
//! |--------|---------------------------|----------------------------|
//! | Enable | logged, nothing published | (any byte is valid)        |
//! | Speed  | last speed republished    | last speed republished     |

use log::warn;

use crate::error::WriteError;
use crate::gatt::Characteristic;
use crate::scheduler::Scheduler;

use super::actuator::{ActuatorController, ActuatorKind, Speed};
use super::ports::{Actuator, GattPort};

/// Which controller field a characteristic maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Enable,
    Speed,
}

/// Resolved destination of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Enable(ActuatorKind),
    Speed(ActuatorKind),
}

impl WriteTarget {
    pub fn kind(self) -> ActuatorKind {
        match self {
            Self::Enable(kind) | Self::Speed(kind) => kind,
        }
    }

    pub fn field(self) -> Field {
        match self {
            Self::Enable(_) => Field::Enable,
            Self::Speed(_) => Field::Speed,
        }
    }
}

/// What a committed write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// `changed` is `false` when the actuator was already in that state.
    Switched { changed: bool, enabled: bool },
    SpeedSet(Speed),
}

/// Map a characteristic to its controller field.  `None` for
/// characteristics clients may not write.
pub fn route(ch: Characteristic) -> Option<WriteTarget> {
    match ch {
        Characteristic::BlinkerBlink => Some(WriteTarget::Enable(ActuatorKind::Blinker)),
        Characteristic::BlinkerSpeed => Some(WriteTarget::Speed(ActuatorKind::Blinker)),
        Characteristic::SnifferStatus => Some(WriteTarget::Enable(ActuatorKind::Sniffer)),
        Characteristic::SnifferSpeed => Some(WriteTarget::Speed(ActuatorKind::Sniffer)),
        Characteristic::Manufacturer
        | Characteristic::ModelName
        | Characteristic::SerialNumber
        | Characteristic::SnifferVoltage
        | Characteristic::SnifferTimestamp => None,
    }
}

/// Exactly one byte.
pub fn decode_byte(payload: &[u8]) -> Result<u8, WriteError> {
    match payload {
        [b] => Ok(*b),
        _ => Err(WriteError::MalformedPayload { len: payload.len() }),
    }
}

/// One byte, nonzero meaning on.
pub fn decode_switch(payload: &[u8]) -> Result<bool, WriteError> {
    decode_byte(payload).map(|b| b != 0)
}

/// Validate `payload` and commit it to `field` of `ctrl`.
///
/// `declared_len` is the length the client actually sent; it differs
/// from `payload.len()` only when the transport truncated the copy.
pub fn apply<A: Actuator>(
    ctrl: &mut ActuatorController<A>,
    field: Field,
    payload: &[u8],
    declared_len: usize,
    sched: &mut Scheduler,
    gatt: &mut impl GattPort,
) -> Result<WriteOutcome, WriteError> {
    let payload = if declared_len == payload.len() {
        Ok(payload)
    } else {
        Err(WriteError::MalformedPayload { len: declared_len })
    };

    match field {
        Field::Enable => {
            let on = payload.and_then(decode_switch).inspect_err(|e| {
                warn!("{}: enable write dropped ({})", ctrl.kind(), e);
            })?;
            let changed = ctrl.set_enabled(on, false, sched, gatt);
            Ok(WriteOutcome::Switched {
                changed,
                enabled: on,
            })
        }
        Field::Speed => {
            let raw = payload.and_then(decode_byte).inspect_err(|e| {
                warn!("{}: speed write dropped ({})", ctrl.kind(), e);
                ctrl.revert_speed(gatt);
            })?;
            ctrl.set_speed(raw, sched, gatt).map(WriteOutcome::SpeedSet)
        }
    }
}
