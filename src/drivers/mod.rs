//! Actuator drivers, button debouncing and hardware initialisation.

pub mod blink_led;
pub mod button;
pub mod hw_init;
pub mod sniffer_probe;
