//! End-to-end timing scenarios against the simulated platform.
//!
//! Times follow the classic windows: debounce 20 ms, long-press 1000 ms,
//! double-click 300 ms. The simulated tick is 1 ms, so a sample lands
//! exactly one debounce window after the last edge.

use button_gesture::{ActiveLevel, ButtonConfig, ButtonEvent, ButtonState};
use embedded_hal::digital::PinState;

use super::mock_platform::Harness;

const PIN: i32 = 4;

fn active_high_config() -> ButtonConfig {
    ButtonConfig {
        pin: PIN,
        active_level: ActiveLevel::High,
        debounce_ms: 20,
        long_press_ms: 1000,
        double_click_ms: 300,
    }
}

#[test]
fn single_short_click() {
    let h = Harness::new();
    let handle = h.create_button(active_high_config());
    h.init_level(PIN, PinState::Low);

    h.set_level(PIN, PinState::High); // t=0 edge up
    h.advance(30); // sample at t=20 confirms the press
    assert_eq!(h.events(), [ButtonEvent::Pressed]);
    assert_eq!(h.registry.get_state(handle), ButtonState::Pressed);
    assert!(h.registry.is_pressed(handle));

    h.advance(70); // t=100
    h.set_level(PIN, PinState::Low); // edge down
    h.advance(30); // sample at t=120 confirms the release
    assert_eq!(h.events(), [ButtonEvent::Pressed, ButtonEvent::Released]);
    assert_eq!(h.registry.get_state(handle), ButtonState::Idle);
    assert!(!h.registry.is_pressed(handle));

    h.advance(310); // double-click window closes at t=420
    assert_eq!(
        h.events(),
        [ButtonEvent::Pressed, ButtonEvent::Released, ButtonEvent::Click]
    );
    assert_eq!(h.registry.get_state(handle), ButtonState::Idle);
}

#[test]
fn long_press() {
    let h = Harness::new();
    let handle = h.create_button(active_high_config());
    h.init_level(PIN, PinState::Low);

    h.set_level(PIN, PinState::High);
    h.advance(30); // press confirmed at t=20, deadline armed for t=1020
    h.advance(1470); // t=1500, line held high throughout
    assert_eq!(h.events(), [ButtonEvent::Pressed, ButtonEvent::LongPress]);
    assert_eq!(h.registry.get_state(handle), ButtonState::LongPress);
    assert!(h.registry.is_pressed(handle));

    h.advance(500); // t=2000
    h.set_level(PIN, PinState::Low);
    h.advance(30); // release sampled at t=2020
    assert_eq!(
        h.events(),
        [
            ButtonEvent::Pressed,
            ButtonEvent::LongPress,
            ButtonEvent::Released
        ]
    );
    assert_eq!(h.registry.get_state(handle), ButtonState::Idle);

    h.advance(2000); // no deferred click after a long press
    assert_eq!(h.events().len(), 3);
}

#[test]
fn double_click() {
    let h = Harness::new();
    let handle = h.create_button(active_high_config());
    h.init_level(PIN, PinState::Low);

    h.set_level(PIN, PinState::High); // t=0
    h.advance(80); // press confirmed at t=20
    h.set_level(PIN, PinState::Low); // t=80
    h.advance(120); // release confirmed at t=100, window open until t=400
    h.set_level(PIN, PinState::High); // t=200, second press
    h.advance(80); // confirmed at t=220
    h.set_level(PIN, PinState::Low); // t=280
    h.advance(40); // confirmed at t=300

    assert_eq!(
        h.events(),
        [
            ButtonEvent::Pressed,
            ButtonEvent::Released,
            ButtonEvent::Pressed,
            ButtonEvent::Released,
            ButtonEvent::DoubleClick,
        ]
    );
    // Transient observability of the terminal state.
    assert_eq!(h.registry.get_state(handle), ButtonState::DoubleClick);
    assert!(!h.registry.is_pressed(handle));

    h.advance(1000); // the cancelled window must not produce a click
    assert_eq!(h.events().len(), 5);
}

#[test]
fn bounce_absorption() {
    let h = Harness::new();
    let handle = h.create_button(active_high_config());
    h.init_level(PIN, PinState::Low);

    // Ten alternating edges at 5 ms intervals starting t=0.
    let mut level = PinState::High;
    for _ in 0..10 {
        h.set_level(PIN, level);
        h.advance(5);
        level = match level {
            PinState::High => PinState::Low,
            PinState::Low => PinState::High,
        };
    }
    assert!(h.events().is_empty(), "no events during the bounce storm");

    // Stable high from t=50; the last edge keeps the sample at t=70.
    h.set_level(PIN, PinState::High);
    h.advance(50);
    assert_eq!(h.events(), [ButtonEvent::Pressed]);
    assert!(h.registry.is_pressed(handle));
}

#[test]
fn release_just_before_long_press_deadline() {
    let h = Harness::new();
    let handle = h.create_button(active_high_config());
    h.init_level(PIN, PinState::Low);

    h.set_level(PIN, PinState::High);
    h.advance(990); // press confirmed at t=20, deadline pending at t=1020
    h.set_level(PIN, PinState::Low); // t=990
    h.advance(30); // release sampled at t=1010 cancels the deadline

    assert_eq!(h.events(), [ButtonEvent::Pressed, ButtonEvent::Released]);

    h.advance(400); // window closes at t=1310
    assert_eq!(
        h.events(),
        [ButtonEvent::Pressed, ButtonEvent::Released, ButtonEvent::Click]
    );
    assert_eq!(h.registry.get_state(handle), ButtonState::Idle);
}

#[test]
fn active_low_click() {
    let pin = 9;
    let h = Harness::new();
    let config = ButtonConfig {
        pin,
        active_level: ActiveLevel::Low,
        ..active_high_config()
    };
    let handle = h.create_button(config);
    h.init_level(pin, PinState::High); // resting level with pull-up

    h.set_level(pin, PinState::Low); // t=0 press
    h.advance(30);
    assert_eq!(h.events(), [ButtonEvent::Pressed]);
    assert!(h.registry.is_pressed(handle));

    h.advance(70);
    h.set_level(pin, PinState::High); // t=100 release
    h.advance(30);
    h.advance(300); // click resolves at t=420

    assert_eq!(
        h.events(),
        [ButtonEvent::Pressed, ButtonEvent::Released, ButtonEvent::Click]
    );

    // Active-low wiring gets the pull-up.
    use button_gesture::ports::Pull;
    assert_eq!(h.sim.borrow().configured.get(&pin), Some(&Pull::Up));
}

#[test]
fn long_press_supersedes_double_click_chain() {
    let h = Harness::new();
    let handle = h.create_button(active_high_config());
    h.init_level(PIN, PinState::Low);

    h.set_level(PIN, PinState::High); // first click
    h.advance(80);
    h.set_level(PIN, PinState::Low);
    h.advance(120); // release at t=100, window open
    h.set_level(PIN, PinState::High); // t=200, second press — then held
    h.advance(1100); // long-press deadline at t=1220

    assert_eq!(
        h.events(),
        [
            ButtonEvent::Pressed,
            ButtonEvent::Released,
            ButtonEvent::Pressed,
            ButtonEvent::LongPress,
        ]
    );
    assert_eq!(h.registry.get_state(handle), ButtonState::LongPress);

    h.set_level(PIN, PinState::Low);
    h.advance(2000);

    let events = h.events();
    assert_eq!(events.last(), Some(&ButtonEvent::Released));
    assert!(!events.contains(&ButtonEvent::Click));
    assert!(!events.contains(&ButtonEvent::DoubleClick));
    assert_eq!(h.registry.get_state(handle), ButtonState::Idle);
}

#[test]
fn long_press_deadline_racing_release_stays_silent() {
    let h = Harness::new();
    let handle = h.create_button(active_high_config());
    h.init_level(PIN, PinState::Low);

    h.set_level(PIN, PinState::High);
    h.advance(1015); // press confirmed at t=20; deadline at t=1020
    h.set_level(PIN, PinState::Low); // t=1015, sample would land at t=1035
    h.advance(100);

    // The deadline dispatched at t=1020 re-samples the line, finds it
    // inactive, and corrects silently; the late debounce sample then has
    // nothing left to report.
    assert_eq!(h.events(), [ButtonEvent::Pressed]);
    assert!(!h.registry.is_pressed(handle));
    assert!(!h.events().contains(&ButtonEvent::LongPress));
}

#[test]
fn reads_have_no_observable_side_effects() {
    let h = Harness::new();
    let handle = h.create_button(active_high_config());
    h.init_level(PIN, PinState::Low);

    h.set_level(PIN, PinState::High);
    for _ in 0..8 {
        let _ = h.registry.get_state(handle);
        let _ = h.registry.is_pressed(handle);
        h.advance(10);
    }
    h.set_level(PIN, PinState::Low);
    for _ in 0..40 {
        let _ = h.registry.get_state(handle);
        let _ = h.registry.is_pressed(handle);
        h.advance(10);
    }

    assert_eq!(
        h.events(),
        [ButtonEvent::Pressed, ButtonEvent::Released, ButtonEvent::Click]
    );
}
