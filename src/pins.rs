//! GPIO / peripheral pin assignments for the XFit board (ESP32 DevKit).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// User input
// ---------------------------------------------------------------------------

/// BOOT button.  Active-low, internal pull-up.
pub const BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// Blinker
// ---------------------------------------------------------------------------

/// On-board LED (`LED_BUILTIN` on DevKit boards).  Active HIGH.
pub const LED_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// Sniffer probe
// ---------------------------------------------------------------------------

/// Digital output: probe excitation.
pub const SNIFFER_OUT_GPIO: i32 = 4;
/// Analog pickup.  ADC1 channel 6 (input-only pin).
pub const SNIFFER_IN_GPIO: i32 = 34;
