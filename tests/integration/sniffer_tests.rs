//! Sniffer: excitation toggling, pickup sampling and notifications.

use super::mock_hw::Rig;

use xfit::app::actuator::ActuatorKind;
use xfit::config::DeviceConfig;
use xfit::gatt::Characteristic;

fn voltage(rig: &Rig) -> Option<u16> {
    let v = rig.value(Characteristic::SnifferVoltage);
    (v.len() == 2).then(|| u16::from_le_bytes([v[0], v[1]]))
}

fn timestamp(rig: &Rig) -> Option<u32> {
    let v = rig.value(Characteristic::SnifferTimestamp);
    <[u8; 4]>::try_from(v.as_slice()).ok().map(u32::from_le_bytes)
}

#[test]
fn enabled_sniffer_samples_and_notifies() {
    let mut rig = Rig::new();
    rig.pickup.set(Some(1_234));
    rig.client_write(Characteristic::SnifferStatus, &[1]);
    assert_eq!(rig.value(Characteristic::SnifferStatus), vec![1]);

    rig.poll(0);
    assert!(rig.excitation.is_high());
    assert_eq!(voltage(&rig), Some(1_234));
    assert_eq!(timestamp(&rig), Some(0));
    assert_eq!(rig.service.sniffer().actuator().last_reading_mv(), Some(1_234));
    assert_eq!(
        rig.ble.take_notifications(),
        vec![
            Characteristic::SnifferVoltage,
            Characteristic::SnifferTimestamp
        ]
    );
}

#[test]
fn default_cadence_is_fifty_ms() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::SnifferStatus, &[1]);
    assert_eq!(rig.service.interval_ms(ActuatorKind::Sniffer), 50);

    rig.poll(0);
    rig.pickup.set(Some(900));
    rig.poll(49);
    assert_eq!(voltage(&rig), Some(0));
    rig.poll(50);
    assert!(!rig.excitation.is_high());
    assert_eq!(voltage(&rig), Some(900));
    assert_eq!(timestamp(&rig), Some(50));
}

#[test]
fn speed_write_retimes_sampling() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::SnifferStatus, &[1]);
    rig.poll(0);
    rig.client_write(Characteristic::SnifferSpeed, &[1]);
    assert_eq!(rig.service.interval_ms(ActuatorKind::Sniffer), 10);

    rig.ble.take_notifications();
    rig.run(10, 100, 10);
    let samples = rig
        .ble
        .notifications()
        .iter()
        .filter(|&&ch| ch == Characteristic::SnifferVoltage)
        .count();
    assert_eq!(samples, 10);
}

#[test]
fn failed_read_publishes_nothing() {
    let mut rig = Rig::new();
    rig.pickup.set(None);
    rig.client_write(Characteristic::SnifferStatus, &[1]);
    rig.poll(0);

    // Excitation still toggles.
    assert!(rig.excitation.is_high());
    assert!(rig.value(Characteristic::SnifferVoltage).is_empty());
    assert!(rig.value(Characteristic::SnifferTimestamp).is_empty());
    assert!(rig.ble.notifications().is_empty());
    assert_eq!(rig.service.sniffer().actuator().last_reading_mv(), None);
}

#[test]
fn disable_stops_sampling() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::SnifferStatus, &[1]);
    rig.poll(0);
    assert!(rig.excitation.is_high());

    rig.client_write(Characteristic::SnifferStatus, &[0]);
    assert!(!rig.excitation.is_high());

    rig.ble.take_notifications();
    rig.run(10, 500, 10);
    assert!(rig.ble.notifications().is_empty());
}

#[test]
fn timestamp_wraps_at_32_bits() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::SnifferStatus, &[1]);
    rig.poll(u64::from(u32::MAX) + 6);
    assert_eq!(timestamp(&rig), Some(5));
}

#[test]
fn scale_comes_from_config() {
    let mut config = DeviceConfig::default();
    config.sniffer.scale_ms = 20;
    config.sniffer.default_speed = 3;
    let mut rig = Rig::with_config(&config);
    assert_eq!(rig.value(Characteristic::SnifferSpeed), vec![3]);
    assert_eq!(rig.service.interval_ms(ActuatorKind::Sniffer), 60);

    rig.client_write(Characteristic::SnifferStatus, &[1]);
    rig.poll(0);
    rig.poll(59);
    assert!(rig.excitation.is_high());
    rig.poll(60);
    assert!(!rig.excitation.is_high());
}
