//! Mock hardware for integration tests.
//!
//! Pins share their level through `Rc<Cell<_>>` so a test keeps a handle
//! after the pin has been moved into the service.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use xfit::adapters::ble::BleGattServer;
use xfit::app::events::AppEvent;
use xfit::app::gateway::WriteOutcome;
use xfit::app::ports::{AnalogInput, EventSink};
use xfit::app::service::{DeviceIdentity, DeviceService};
use xfit::config::DeviceConfig;
use xfit::drivers::blink_led::BlinkLed;
use xfit::drivers::sniffer_probe::SnifferProbe;
use xfit::error::WriteError;
use xfit::events::{Event, GattWrite};
use xfit::gatt::Characteristic;

// ── Output pin ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockOutput {
    level: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
}

#[allow(dead_code)]
impl MockOutput {
    pub fn is_high(&self) -> bool {
        self.level.get()
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }
}

impl ErrorType for MockOutput {
    type Error = Infallible;
}

impl OutputPin for MockOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(false);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(true);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

// ── Button ────────────────────────────────────────────────────

/// Active-low button: `press()` pulls the line low.
#[derive(Clone, Default)]
pub struct MockButton {
    pressed: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl MockButton {
    pub fn press(&self) {
        self.pressed.set(true);
    }

    pub fn release(&self) {
        self.pressed.set(false);
    }
}

impl ErrorType for MockButton {
    type Error = Infallible;
}

impl InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pressed.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed.get())
    }
}

// ── Analog pickup ─────────────────────────────────────────────

#[derive(Clone)]
pub struct MockAnalog {
    reading: Rc<Cell<Option<u16>>>,
}

impl Default for MockAnalog {
    fn default() -> Self {
        Self {
            reading: Rc::new(Cell::new(Some(0))),
        }
    }
}

#[allow(dead_code)]
impl MockAnalog {
    /// `None` makes every read fail.
    pub fn set(&self, millivolts: Option<u16>) {
        self.reading.set(millivolts);
    }
}

impl AnalogInput for MockAnalog {
    fn read_millivolts(&mut self) -> Option<u16> {
        self.reading.get()
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type TestService =
    DeviceService<BlinkLed<MockOutput>, SnifferProbe<MockOutput, MockAnalog>, MockButton>;

/// A started service wired to mocks, plus handles onto every mock.
pub struct Rig {
    pub service: TestService,
    pub ble: BleGattServer,
    pub sink: RecordingSink,
    pub led: MockOutput,
    pub excitation: MockOutput,
    pub pickup: MockAnalog,
    pub button: MockButton,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(&DeviceConfig::default())
    }

    pub fn with_config(config: &DeviceConfig) -> Self {
        let led = MockOutput::default();
        let excitation = MockOutput::default();
        let pickup = MockAnalog::default();
        let button = MockButton::default();

        let mut service = DeviceService::new(
            config,
            BlinkLed::new(led.clone()),
            SnifferProbe::new(excitation.clone(), pickup.clone()),
            button.clone(),
        )
        .expect("default config is valid");
        let mut ble = BleGattServer::new();
        let mut sink = RecordingSink::default();
        service.start(&DeviceIdentity::new(config, "fecaef"), &mut ble, &mut sink);
        ble.start(&config.device_name).expect("sim start");

        Self {
            service,
            ble,
            sink,
            led,
            excitation,
            pickup,
            button,
        }
    }

    pub fn poll(&mut self, now_ms: u64) -> usize {
        self.service.poll(now_ms, &mut self.ble, &mut self.sink)
    }

    /// Poll every `step_ms` from `from_ms` through `to_ms` inclusive.
    pub fn run(&mut self, from_ms: u64, to_ms: u64, step_ms: u64) {
        let mut now = from_ms;
        while now <= to_ms {
            self.poll(now);
            now += step_ms;
        }
    }

    /// A client write as it would arrive from the BLE callback.  `None`
    /// when the stack itself refuses the write.
    pub fn client_write(
        &mut self,
        ch: Characteristic,
        data: &[u8],
    ) -> Option<Result<WriteOutcome, WriteError>> {
        let write = self.ble.client_write(ch, data)?;
        Some(self.deliver(&write))
    }

    pub fn deliver(&mut self, write: &GattWrite) -> Result<WriteOutcome, WriteError> {
        self.service.handle_write(write, &mut self.ble, &mut self.sink)
    }

    pub fn handle(&mut self, event: Event) {
        self.service.handle_event(event, &mut self.ble, &mut self.sink);
    }

    pub fn value(&self, ch: Characteristic) -> Vec<u8> {
        use xfit::app::ports::GattPort;
        self.ble.value(ch).to_vec()
    }
}
