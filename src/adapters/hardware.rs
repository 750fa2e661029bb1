//! Hardware adapter — raw GPIO/ADC exposed through `embedded-hal` and
//! the [`AnalogInput`] port.
//!
//! The drivers are generic over `embedded_hal::digital` pins, so this is
//! the only module that binds them to ESP32 GPIO numbers.  On non-espidf
//! targets the underlying `hw_init` calls are simulation stubs.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::app::ports::AnalogInput;
use crate::drivers::hw_init;

// ── Digital output ────────────────────────────────────────────

/// Push-pull output configured by [`hw_init::init_peripherals`].
pub struct GpioOutput {
    gpio: i32,
    level: bool,
}

impl GpioOutput {
    pub fn new(gpio: i32) -> Self {
        Self { gpio, level: false }
    }

    /// Last level written.
    pub fn is_set_high(&self) -> bool {
        self.level
    }
}

impl ErrorType for GpioOutput {
    type Error = Infallible;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level = false;
        hw_init::gpio_write(self.gpio, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level = true;
        hw_init::gpio_write(self.gpio, true);
        Ok(())
    }
}

// ── Digital input ─────────────────────────────────────────────

/// Input configured by [`hw_init::init_peripherals`].
pub struct GpioInput {
    gpio: i32,
}

impl GpioInput {
    pub fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for GpioInput {
    type Error = Infallible;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(hw_init::gpio_read(self.gpio))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!hw_init::gpio_read(self.gpio))
    }
}

// ── Analog input ──────────────────────────────────────────────

/// One ADC1 oneshot channel.
pub struct AdcInput {
    channel: u32,
}

impl AdcInput {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }
}

impl AnalogInput for AdcInput {
    fn read_millivolts(&mut self) -> Option<u16> {
        hw_init::adc1_read(self.channel).map(hw_init::raw_to_millivolts)
    }
}
