//! Button: debounce hold-off and the blinker toggle it drives.

use super::mock_hw::Rig;

use xfit::app::actuator::ActuatorKind;
use xfit::app::events::AppEvent;
use xfit::gatt::Characteristic;

fn presses(rig: &Rig) -> usize {
    rig.sink.count(|e| matches!(e, AppEvent::ButtonPressed))
}

#[test]
fn press_toggles_blinker_and_notifies() {
    let mut rig = Rig::new();
    rig.button.press();
    rig.poll(0);

    assert_eq!(presses(&rig), 1);
    assert!(rig.service.is_enabled(ActuatorKind::Blinker));
    assert_eq!(rig.value(Characteristic::BlinkerBlink), vec![1]);
    assert_eq!(rig.ble.notifications(), &[Characteristic::BlinkerBlink]);
    assert_eq!(
        rig.sink.last(),
        Some(&AppEvent::ActuatorSwitched {
            kind: ActuatorKind::Blinker,
            enabled: true,
            notified: true,
        })
    );

    // The blinker slot was already passed this tick; it runs on the next.
    assert!(!rig.led.is_high());
    rig.poll(10);
    assert!(rig.led.is_high());
}

#[test]
fn released_button_does_nothing() {
    let mut rig = Rig::new();
    rig.run(0, 3_000, 10);
    assert_eq!(presses(&rig), 0);
    assert!(!rig.service.is_enabled(ActuatorKind::Blinker));
    assert!(rig.ble.notifications().is_empty());
}

#[test]
fn held_button_toggles_once_per_hold_off() {
    let mut rig = Rig::new();
    rig.button.press();
    rig.run(0, 2_500, 10);

    // Accepted at 0, 1000 and 2000 ms.
    assert_eq!(presses(&rig), 3);
    assert!(rig.service.is_enabled(ActuatorKind::Blinker));
    assert_eq!(rig.service.button().state().last_toggle_ms, Some(2_000));
}

#[test]
fn polling_resumes_after_hold_off() {
    let mut rig = Rig::new();
    rig.button.press();
    rig.poll(0);
    rig.button.release();
    rig.run(10, 1_000, 10);
    assert_eq!(presses(&rig), 1);

    // Next poll after the hold-off is due at 1030 ms.
    rig.button.press();
    rig.poll(1_010);
    rig.poll(1_020);
    assert_eq!(presses(&rig), 1);
    rig.poll(1_030);
    assert_eq!(presses(&rig), 2);
    assert!(!rig.service.is_enabled(ActuatorKind::Blinker));
    assert!(!rig.led.is_high());
}

#[test]
fn button_does_not_touch_sniffer() {
    let mut rig = Rig::new();
    rig.button.press();
    rig.run(0, 1_500, 10);
    assert!(!rig.service.is_enabled(ActuatorKind::Sniffer));
    assert_eq!(rig.excitation.writes(), 0);
}
