//! Device configuration parameters
//!
//! All tunable parameters for the XFit peripheral.  Settings are
//! compiled in and volatile: runtime changes arrive over BLE and are lost
//! on power-cycle.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::app::actuator::{SPEED_MAX, SPEED_MIN};

/// Longest identity string carried in the config.
pub const MAX_IDENTITY_LEN: usize = 32;

pub type IdentityString = heapless::String<MAX_IDENTITY_LEN>;

/// Timing parameters of one actuator controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Milliseconds per speed step: `interval_ms = speed * scale_ms`.
    pub scale_ms: u32,
    /// Speed at boot, 1–10.
    pub default_speed: u8,
}

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    // --- Identity ---
    /// Device Information manufacturer string
    pub manufacturer: IdentityString,
    /// Model number string, also the advertised GAP name
    pub device_name: IdentityString,

    // --- Button ---
    /// Button poll period (milliseconds)
    pub button_poll_ms: u32,
    /// Hold-off after an accepted press (milliseconds)
    pub button_hold_off_ms: u32,

    // --- Actuators ---
    pub blinker: ActuatorConfig,
    pub sniffer: ActuatorConfig,

    // --- Timing ---
    /// Main-loop sleep between scheduler polls (milliseconds)
    pub loop_interval_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // Identity
            manufacturer: bounded("Crabify corp."),
            device_name: bounded("XFit"),

            // Button
            button_poll_ms: 30,
            button_hold_off_ms: 1000,

            // Actuators
            blinker: ActuatorConfig {
                scale_ms: 100, // speed 5 → 500 ms
                default_speed: 5,
            },
            sniffer: ActuatorConfig {
                scale_ms: 10, // speed 5 → 50 ms
                default_speed: 5,
            },

            // Timing
            loop_interval_ms: 1,
        }
    }
}

impl DeviceConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError::ValidationFailed("device_name is empty"));
        }
        if self.button_poll_ms == 0 {
            return Err(ConfigError::ValidationFailed("button_poll_ms must be > 0"));
        }
        if self.loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("loop_interval_ms must be > 0"));
        }
        if self.blinker.scale_ms == 0 {
            return Err(ConfigError::ValidationFailed("blinker.scale_ms must be > 0"));
        }
        if self.sniffer.scale_ms == 0 {
            return Err(ConfigError::ValidationFailed("sniffer.scale_ms must be > 0"));
        }
        if !speed_in_range(self.blinker.default_speed) {
            return Err(ConfigError::ValidationFailed(
                "blinker.default_speed must be within 1..=10",
            ));
        }
        if !speed_in_range(self.sniffer.default_speed) {
            return Err(ConfigError::ValidationFailed(
                "sniffer.default_speed must be within 1..=10",
            ));
        }
        Ok(())
    }
}

fn speed_in_range(speed: u8) -> bool {
    (SPEED_MIN..=SPEED_MAX).contains(&speed)
}

/// Copy `s` into a fixed-capacity string, dropping whatever does not fit.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Errors from configuration checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
