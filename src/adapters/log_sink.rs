//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | identity and initial values published");
            }
            AppEvent::ActuatorSwitched {
                kind,
                enabled,
                notified,
            } => {
                info!(
                    "SWITCH | {} {}{}",
                    kind,
                    if *enabled { "on" } else { "off" },
                    if *notified { " (notified)" } else { "" }
                );
            }
            AppEvent::SpeedChanged {
                kind,
                speed,
                interval_ms,
            } => {
                info!("SPEED | {} speed={} interval={}ms", kind, speed, interval_ms);
            }
            AppEvent::WriteRejected {
                characteristic,
                error,
            } => {
                warn!("REJECT | {}: {}", characteristic, error);
            }
            AppEvent::ButtonPressed => {
                info!("BUTTON | pressed");
            }
            AppEvent::ClientConnected => {
                info!("LINK | client connected");
            }
            AppEvent::ClientDisconnected => {
                info!("LINK | client disconnected");
            }
        }
    }
}
