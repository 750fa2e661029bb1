//! Blinker: enable/speed writes through the gateway and LED cadence.

use super::mock_hw::Rig;

use xfit::app::actuator::{ActuatorKind, Speed};
use xfit::app::events::AppEvent;
use xfit::app::gateway::WriteOutcome;
use xfit::error::WriteError;
use xfit::gatt::Characteristic;

#[test]
fn boots_disabled_with_default_speed_published() {
    let mut rig = Rig::new();

    assert_eq!(rig.value(Characteristic::BlinkerBlink), vec![0]);
    assert_eq!(rig.value(Characteristic::BlinkerSpeed), vec![5]);
    assert_eq!(rig.value(Characteristic::SerialNumber), b"fecaef".to_vec());
    assert_eq!(rig.sink.events.first(), Some(&AppEvent::Started));

    rig.run(0, 2_000, 10);
    assert_eq!(rig.led.writes(), 0, "disabled blinker must not drive the LED");
}

#[test]
fn enable_write_starts_blinking_immediately() {
    let mut rig = Rig::new();

    let outcome = rig.client_write(Characteristic::BlinkerBlink, &[1]);
    assert_eq!(
        outcome,
        Some(Ok(WriteOutcome::Switched {
            changed: true,
            enabled: true
        }))
    );
    assert_eq!(
        rig.sink.last(),
        Some(&AppEvent::ActuatorSwitched {
            kind: ActuatorKind::Blinker,
            enabled: true,
            notified: false,
        })
    );

    // First run is due right away; default interval is 5 × 100 ms.
    rig.poll(0);
    assert!(rig.led.is_high());
    rig.poll(499);
    assert!(rig.led.is_high());
    rig.poll(500);
    assert!(!rig.led.is_high());
    rig.poll(1_000);
    assert!(rig.led.is_high());
}

#[test]
fn client_enable_is_not_notified() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::BlinkerBlink, &[1]);
    assert!(!rig.ble.notifications().contains(&Characteristic::BlinkerBlink));
}

#[test]
fn repeated_enable_write_changes_nothing() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::BlinkerBlink, &[1]);
    let switched = |e: &AppEvent| matches!(e, AppEvent::ActuatorSwitched { .. });
    assert_eq!(rig.sink.count(switched), 1);

    let outcome = rig.client_write(Characteristic::BlinkerBlink, &[7]);
    assert_eq!(
        outcome,
        Some(Ok(WriteOutcome::Switched {
            changed: false,
            enabled: true
        }))
    );
    assert_eq!(rig.sink.count(switched), 1);
}

#[test]
fn disable_write_rests_the_led() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::BlinkerBlink, &[1]);
    rig.poll(0);
    assert!(rig.led.is_high());

    rig.client_write(Characteristic::BlinkerBlink, &[0]);
    assert!(!rig.led.is_high());
    assert!(!rig.service.is_enabled(ActuatorKind::Blinker));

    let writes = rig.led.writes();
    rig.run(10, 3_000, 10);
    assert_eq!(rig.led.writes(), writes);
}

#[test]
fn speed_write_changes_interval() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::BlinkerBlink, &[1]);
    rig.poll(0);
    assert!(rig.led.is_high());

    let outcome = rig.client_write(Characteristic::BlinkerSpeed, &[2]);
    let speed = Speed::try_from(2).unwrap();
    assert_eq!(outcome, Some(Ok(WriteOutcome::SpeedSet(speed))));
    assert_eq!(rig.service.interval_ms(ActuatorKind::Blinker), 200);
    assert_eq!(rig.value(Characteristic::BlinkerSpeed), vec![2]);
    assert_eq!(
        rig.sink.last(),
        Some(&AppEvent::SpeedChanged {
            kind: ActuatorKind::Blinker,
            speed,
            interval_ms: 200,
        })
    );

    rig.poll(199);
    assert!(rig.led.is_high());
    rig.poll(200);
    assert!(!rig.led.is_high());
    rig.poll(400);
    assert!(rig.led.is_high());
}

#[test]
fn speed_write_while_disabled_does_not_start() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::BlinkerSpeed, &[1]);
    assert_eq!(rig.service.interval_ms(ActuatorKind::Blinker), 100);

    rig.run(0, 1_000, 10);
    assert_eq!(rig.led.writes(), 0);
}

#[test]
fn out_of_range_speed_is_reverted() {
    let mut rig = Rig::new();

    for raw in [0u8, 11, 255] {
        let outcome = rig.client_write(Characteristic::BlinkerSpeed, &[raw]);
        assert_eq!(outcome, Some(Err(WriteError::OutOfRange { value: raw })));
        assert_eq!(rig.value(Characteristic::BlinkerSpeed), vec![5]);
        assert_eq!(
            rig.sink.last(),
            Some(&AppEvent::WriteRejected {
                characteristic: Characteristic::BlinkerSpeed,
                error: WriteError::OutOfRange { value: raw },
            })
        );
    }
    assert_eq!(rig.service.interval_ms(ActuatorKind::Blinker), 500);
}

/// Poll every `step_ms` and return the times the LED was driven.
fn led_edges(rig: &mut Rig, from_ms: u64, to_ms: u64, step_ms: u64) -> Vec<u64> {
    let mut edges = Vec::new();
    let mut now = from_ms;
    while now <= to_ms {
        let before = rig.led.writes();
        rig.poll(now);
        if rig.led.writes() != before {
            edges.push(now);
        }
        now += step_ms;
    }
    edges
}

#[test]
fn speed_write_every_byte_from_non_default_speed() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::BlinkerSpeed, &[7]);
    let mut current = 7u8;

    for v in 0..=u8::MAX {
        let outcome = rig.client_write(Characteristic::BlinkerSpeed, &[v]);
        if (1..=10).contains(&v) {
            assert_eq!(
                outcome,
                Some(Ok(WriteOutcome::SpeedSet(Speed::try_from(v).unwrap())))
            );
            current = v;
        } else {
            assert_eq!(outcome, Some(Err(WriteError::OutOfRange { value: v })));
        }
        assert_eq!(rig.value(Characteristic::BlinkerSpeed), vec![current], "v={v}");
        assert_eq!(
            rig.service.interval_ms(ActuatorKind::Blinker),
            u32::from(current) * 100,
            "v={v}"
        );
    }
}

#[test]
fn enable_retime_then_reject_scenario() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::BlinkerBlink, &[1]);
    assert_eq!(led_edges(&mut rig, 0, 1_500, 10), vec![0, 500, 1_000, 1_500]);

    // Retimed live, without disabling.
    rig.client_write(Characteristic::BlinkerSpeed, &[0x03]);
    assert!(rig.service.is_enabled(ActuatorKind::Blinker));
    assert_eq!(
        led_edges(&mut rig, 1_510, 2_400, 10),
        vec![1_800, 2_100, 2_400]
    );

    let outcome = rig.client_write(Characteristic::BlinkerSpeed, &[0x0b]);
    assert_eq!(outcome, Some(Err(WriteError::OutOfRange { value: 0x0b })));
    assert_eq!(rig.value(Characteristic::BlinkerSpeed), vec![0x03]);
    assert_eq!(rig.service.interval_ms(ActuatorKind::Blinker), 300);
    assert_eq!(led_edges(&mut rig, 2_410, 2_700, 10), vec![2_700]);
}

#[test]
fn malformed_enable_leaves_running_blinker_alone() {
    let mut rig = Rig::new();
    rig.client_write(Characteristic::BlinkerBlink, &[1]);

    let outcome = rig.client_write(Characteristic::BlinkerBlink, &[0, 0]);
    assert_eq!(outcome, Some(Err(WriteError::MalformedPayload { len: 2 })));
    assert!(rig.service.is_enabled(ActuatorKind::Blinker));
    assert!(rig.ble.notifications().is_empty());
}
