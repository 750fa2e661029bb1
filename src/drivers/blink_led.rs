//! Square-wave LED driven by the blinker task.
//!
//! Each task run sets the pin to the parity of the run counter, so the
//! first run after enable lights the LED and the duty cycle is 50 %.

use embedded_hal::digital::{OutputPin, PinState};

use crate::app::ports::{Actuator, GattPort};

pub struct BlinkLed<P> {
    pin: P,
}

impl<P: OutputPin> BlinkLed<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: OutputPin> Actuator for BlinkLed<P> {
    fn on_tick<G: GattPort>(&mut self, run_counter: u64, _now_ms: u64, _gatt: &mut G) {
        self.pin.set_state(PinState::from(run_counter & 1 == 1)).ok();
    }

    fn rest(&mut self) {
        self.pin.set_low().ok();
    }
}
