//! Sniffer probe — pulsed excitation with an analog pickup.
//!
//! ## Hardware
//!
//! A digital output drives the probe excitation; the pickup is read on an
//! ADC channel.  Every task run flips the excitation by run-counter
//! parity, samples the pickup, and publishes:
//!
//! | Characteristic      | Encoding         |
//! |---------------------|------------------|
//! | `sniffer.voltage`   | `u16` LE, mV     |
//! | `sniffer.timestamp` | `u32` LE, ms     |
//!
//! Both are notified so a subscribed client receives a live trace.

use embedded_hal::digital::{OutputPin, PinState};
use log::debug;

use crate::app::ports::{Actuator, AnalogInput, GattPort};
use crate::gatt::Characteristic;

pub struct SnifferProbe<P, A> {
    excitation: P,
    pickup: A,
    last_reading_mv: Option<u16>,
}

impl<P: OutputPin, A: AnalogInput> SnifferProbe<P, A> {
    pub fn new(excitation: P, pickup: A) -> Self {
        Self {
            excitation,
            pickup,
            last_reading_mv: None,
        }
    }

    /// Most recent successful pickup reading.
    pub fn last_reading_mv(&self) -> Option<u16> {
        self.last_reading_mv
    }
}

impl<P: OutputPin, A: AnalogInput> Actuator for SnifferProbe<P, A> {
    fn on_tick<G: GattPort>(&mut self, run_counter: u64, now_ms: u64, gatt: &mut G) {
        self.excitation
            .set_state(PinState::from(run_counter & 1 == 1))
            .ok();

        let Some(mv) = self.pickup.read_millivolts() else {
            debug!(
                "sniffer: pickup read failed on run {} (last {:?} mV)",
                run_counter, self.last_reading_mv
            );
            return;
        };
        self.last_reading_mv = Some(mv);

        gatt.publish(Characteristic::SnifferVoltage, &mv.to_le_bytes());
        gatt.publish(
            Characteristic::SnifferTimestamp,
            &(now_ms as u32).to_le_bytes(),
        );
        gatt.notify(Characteristic::SnifferVoltage);
        gatt.notify(Characteristic::SnifferTimestamp);
    }

    fn rest(&mut self) {
        self.excitation.set_low().ok();
    }
}
