//! Write gateway: malformed, oversized and read-only writes, plus link
//! events arriving through the inbound queue.

use super::mock_hw::Rig;

use xfit::app::actuator::{ActuatorKind, Speed};
use xfit::app::events::AppEvent;
use xfit::app::gateway::WriteOutcome;
use xfit::error::WriteError;
use xfit::events::{Event, EventQueue, GattWrite};
use xfit::gatt::Characteristic;

#[test]
fn read_only_characteristics_refused_by_stack() {
    let mut rig = Rig::new();
    for ch in [
        Characteristic::Manufacturer,
        Characteristic::ModelName,
        Characteristic::SerialNumber,
        Characteristic::SnifferVoltage,
        Characteristic::SnifferTimestamp,
    ] {
        assert_eq!(rig.client_write(ch, &[1]), None, "{ch}");
    }
    assert_eq!(rig.value(Characteristic::ModelName), b"XFit".to_vec());
}

#[test]
fn read_only_write_reaching_service_is_rejected() {
    let mut rig = Rig::new();
    let write = GattWrite::new(Characteristic::SnifferVoltage, &[1]);
    let error = WriteError::NotWritable(Characteristic::SnifferVoltage);

    assert_eq!(rig.deliver(&write), Err(error));
    assert_eq!(
        rig.sink.last(),
        Some(&AppEvent::WriteRejected {
            characteristic: Characteristic::SnifferVoltage,
            error,
        })
    );
}

#[test]
fn malformed_enable_write_is_ignored() {
    let mut rig = Rig::new();

    for payload in [&[][..], &[1, 1][..]] {
        let outcome = rig.client_write(Characteristic::BlinkerBlink, payload);
        assert_eq!(
            outcome,
            Some(Err(WriteError::MalformedPayload { len: payload.len() }))
        );
    }
    assert!(!rig.service.is_enabled(ActuatorKind::Blinker));
    assert!(rig.ble.notifications().is_empty());
    rig.run(0, 1_000, 10);
    assert_eq!(rig.led.writes(), 0);
}

#[test]
fn prepared_speed_write_goes_through_gateway() {
    let mut rig = Rig::new();
    let write = rig
        .ble
        .client_long_write(Characteristic::BlinkerSpeed, &[3], 18)
        .unwrap();

    assert_eq!(
        rig.deliver(&write),
        Ok(WriteOutcome::SpeedSet(Speed::try_from(3).unwrap()))
    );
    assert_eq!(rig.service.interval_ms(ActuatorKind::Blinker), 300);
    assert_eq!(rig.value(Characteristic::BlinkerSpeed), vec![3]);
}

#[test]
fn long_speed_write_is_reverted() {
    let mut rig = Rig::new();
    let payload = [0x5a; 24];
    let write = rig
        .ble
        .client_long_write(Characteristic::BlinkerSpeed, &payload, 18)
        .unwrap();
    assert_eq!(rig.value(Characteristic::BlinkerSpeed), payload.to_vec());

    assert_eq!(
        rig.deliver(&write),
        Err(WriteError::MalformedPayload { len: 24 })
    );
    assert_eq!(rig.value(Characteristic::BlinkerSpeed), vec![5]);
    assert_eq!(rig.service.interval_ms(ActuatorKind::Blinker), 500);
}

#[test]
fn malformed_speed_write_is_reverted() {
    let mut rig = Rig::new();
    let outcome = rig.client_write(Characteristic::SnifferSpeed, &[2, 0]);
    assert_eq!(outcome, Some(Err(WriteError::MalformedPayload { len: 2 })));
    assert_eq!(rig.value(Characteristic::SnifferSpeed), vec![5]);
    assert_eq!(rig.service.interval_ms(ActuatorKind::Sniffer), 50);
}

#[test]
fn oversized_write_is_truncated_and_rejected() {
    let mut rig = Rig::new();
    let payload = [3u8; 20];
    let write = rig
        .ble
        .client_write(Characteristic::BlinkerSpeed, &payload)
        .unwrap();
    assert!(write.is_truncated());

    assert_eq!(
        rig.deliver(&write),
        Err(WriteError::MalformedPayload { len: 20 })
    );
    assert_eq!(rig.value(Characteristic::BlinkerSpeed), vec![5]);
}

#[test]
fn writes_and_link_events_drain_in_order() {
    let mut rig = Rig::new();
    let queue = EventQueue::new();

    assert!(queue.push(Event::ClientConnected));
    let write = rig.ble.client_write(Characteristic::BlinkerBlink, &[1]).unwrap();
    assert!(queue.push(Event::CharacteristicWritten(write)));
    assert!(queue.push(Event::ClientDisconnected));

    queue.drain(|event| rig.handle(event));
    assert!(queue.is_empty());

    assert!(!rig.service.is_connected());
    assert!(rig.service.is_enabled(ActuatorKind::Blinker));
    let tail: Vec<_> = rig.sink.events.iter().skip(1).copied().collect();
    assert_eq!(
        tail,
        vec![
            AppEvent::ClientConnected,
            AppEvent::ActuatorSwitched {
                kind: ActuatorKind::Blinker,
                enabled: true,
                notified: false,
            },
            AppEvent::ClientDisconnected,
        ]
    );
}

#[test]
fn connection_state_tracks_link_events() {
    let mut rig = Rig::new();
    rig.ble.sim_connect();
    rig.handle(Event::ClientConnected);
    assert!(rig.service.is_connected());
    assert!(rig.ble.is_connected());

    rig.ble.sim_disconnect();
    rig.handle(Event::ClientDisconnected);
    assert!(!rig.service.is_connected());
    assert!(rig.ble.is_advertising());
}

#[test]
fn full_queue_drops_newest_event() {
    let queue = EventQueue::new();
    for _ in 0..xfit::events::EVENT_QUEUE_DEPTH {
        assert!(queue.push(Event::ClientConnected));
    }
    assert!(!queue.push(Event::ClientDisconnected));
    assert_eq!(queue.len(), xfit::events::EVENT_QUEUE_DEPTH);

    let mut drained = Vec::new();
    queue.drain(|event| drained.push(event));
    assert!(drained.iter().all(|e| *e == Event::ClientConnected));
}
