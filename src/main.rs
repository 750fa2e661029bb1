//! XFit Firmware — Main Entry Point
//!
//! Hexagonal architecture with a cooperative scheduler on the main task.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioOutput/GpioInput/AdcInput   LogEventSink   Esp32Time      │
//! │  (embedded-hal + AnalogInput)    (EventSink)    (uptime)       │
//! │  BleGattServer ── Bluedroid callbacks ──▶ EVENTS queue         │
//! │  (GattPort)                                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │             DeviceService (pure logic)                 │    │
//! │  │  Scheduler · Blinker · Sniffer · Button · Gateway      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use xfit::adapters::ble::BleGattServer;
use xfit::adapters::device_id;
use xfit::adapters::hardware::{AdcInput, GpioInput, GpioOutput};
use xfit::adapters::log_sink::LogEventSink;
use xfit::adapters::time::Esp32TimeAdapter;
use xfit::app::service::{DeviceIdentity, DeviceService};
use xfit::config::DeviceConfig;
use xfit::drivers::blink_led::BlinkLed;
use xfit::drivers::hw_init;
use xfit::drivers::sniffer_probe::SnifferProbe;
use xfit::events;
use xfit::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  XFit v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    if let Err(e) = run() {
        // Nothing useful runs without the radio or the pins; stay parked
        // so the log stays readable.
        error!("XFit halted: {:#}", e);
        loop {
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(1_000);
        }
    }
    Ok(())
}

fn run() -> Result<()> {
    // ── 2. Configuration ──────────────────────────────────────
    let config = DeviceConfig::default();
    match serde_json::to_string(&config) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => warn!("Config not serialisable: {}", e),
    }

    // ── 3. Hardware ───────────────────────────────────────────
    hw_init::init_peripherals().map_err(xfit::error::Error::from)?;

    let blink = BlinkLed::new(GpioOutput::new(pins::LED_GPIO));
    let sniff = SnifferProbe::new(
        GpioOutput::new(pins::SNIFFER_OUT_GPIO),
        AdcInput::new(hw_init::ADC1_CH_SNIFFER),
    );
    let button = GpioInput::new(pins::BUTTON_GPIO);

    // ── 4. Device identity ────────────────────────────────────
    let mac = device_id::read_mac();
    let serial = device_id::chip_id(&mac);
    info!(
        "Device: {} (serial {})",
        device_id::full_name(&config.device_name, &mac),
        serial
    );
    let identity = DeviceIdentity::new(&config, &serial);

    // ── 5. Application core ───────────────────────────────────
    let mut service = DeviceService::new(&config, blink, sniff, button)?;
    let mut sink = LogEventSink::new();
    let mut ble = BleGattServer::new();

    // Values published before registration completes are synced as each
    // attribute is added.
    service.start(&identity, &mut ble, &mut sink);
    ble.start(&config.device_name)
        .map_err(xfit::error::Error::from)?;

    let clock = Esp32TimeAdapter::new();
    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        events::drain_events(|event| service.handle_event(event, &mut ble, &mut sink));
        service.poll(clock.uptime_ms(), &mut ble, &mut sink);
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(config.loop_interval_ms);
    }
}
