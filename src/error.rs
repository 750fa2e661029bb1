//! Unified error types for the XFit firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping
//! bootstrap error handling uniform.  All variants are `Copy` so they can
//! be passed through the write gateway and event sink without allocation.

use core::fmt;

use crate::gatt::Characteristic;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A client write was rejected by the gateway.
    Write(WriteError),
    /// The cooperative scheduler refused an operation.
    Scheduler(SchedulerError),
    /// The BLE stack or another comms subsystem failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write(e) => write!(f, "write: {e}"),
            Self::Scheduler(e) => write!(f, "scheduler: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Characteristic write errors
// ---------------------------------------------------------------------------

/// Why an inbound characteristic write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// Payload was not exactly one byte long.
    MalformedPayload { len: usize },
    /// Byte decoded fine but lies outside the accepted range.
    OutOfRange { value: u8 },
    /// The characteristic has no write access.
    NotWritable(Characteristic),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload { len } => {
                write!(f, "malformed payload ({len} bytes, expected 1)")
            }
            Self::OutOfRange { value } => write!(f, "value {value} out of range"),
            Self::NotWritable(ch) => write!(f, "{ch} is not writable"),
        }
    }
}

impl From<WriteError> for Error {
    fn from(e: WriteError) -> Self {
        Self::Write(e)
    }
}

// ---------------------------------------------------------------------------
// Scheduler errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// Every task slot is taken.
    Full,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "task table full"),
        }
    }
}

impl From<SchedulerError> for Error {
    fn from(e: SchedulerError) -> Self {
        Self::Scheduler(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

/// BLE bring-up failures.  The `i32` is the raw `esp_err_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    ControllerInit(i32),
    ControllerEnable(i32),
    BluedroidInit(i32),
    BluedroidEnable(i32),
    CallbackRegister(i32),
    AppRegister(i32),
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ControllerInit(rc) => write!(f, "BT controller init failed (rc={rc})"),
            Self::ControllerEnable(rc) => write!(f, "BT controller enable failed (rc={rc})"),
            Self::BluedroidInit(rc) => write!(f, "Bluedroid init failed (rc={rc})"),
            Self::BluedroidEnable(rc) => write!(f, "Bluedroid enable failed (rc={rc})"),
            Self::CallbackRegister(rc) => write!(f, "GAP/GATTS callback register failed (rc={rc})"),
            Self::AppRegister(rc) => write!(f, "GATTS app register failed (rc={rc})"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
