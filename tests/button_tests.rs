//! Integration tests for button debounce and click classification

use sr_control::hal::MockButton;
use sr_control::{Button, ButtonConfig, ButtonEvent, ButtonState, ContactType, InputType, LongClickMode};

/// Feed `(closed, time)` samples and collect the events.
fn run(state: &mut ButtonState, samples: &[(bool, u64)]) -> Vec<ButtonEvent> {
    samples.iter().map(|&(closed, t)| state.update(closed, t)).collect()
}

// ============================================================================
// Debounce
// ============================================================================

#[test]
fn press_is_reported_after_debounce_window() {
    let mut state = ButtonState::new(ButtonConfig::default().with_debounce_ms(50));

    let events = run(&mut state, &[(true, 0), (true, 20), (true, 50), (true, 60)]);
    assert_eq!(
        events,
        [
            ButtonEvent::Released,
            ButtonEvent::Released,
            ButtonEvent::Down,
            ButtonEvent::Pressed,
        ]
    );
    assert!(state.is_closed());
}

#[test]
fn bounce_back_inside_window_is_ignored() {
    let mut state = ButtonState::new(ButtonConfig::default().with_debounce_ms(50));

    let events = run(&mut state, &[(true, 0), (false, 10), (false, 60), (false, 70)]);
    assert!(events.iter().all(|e| *e == ButtonEvent::Released));
    assert!(!state.is_closed());
}

#[test]
fn zero_debounce_reports_edges_immediately() {
    let mut state = ButtonState::new(ButtonConfig::default());
    assert_eq!(state.update(true, 0), ButtonEvent::Down);
    assert_eq!(state.update(false, 1), ButtonEvent::Up);
}

// ============================================================================
// Clicks
// ============================================================================

#[test]
fn double_click_inside_window() {
    let mut state = ButtonState::new(ButtonConfig::default().with_double_click_ms(300));

    let events = run(
        &mut state,
        &[(true, 0), (false, 50), (true, 100), (false, 150), (false, 500)],
    );
    assert_eq!(
        events,
        [
            ButtonEvent::Down,
            ButtonEvent::Up,
            ButtonEvent::DoubleClick,
            ButtonEvent::Up,
            ButtonEvent::Released,
        ]
    );
}

#[test]
fn second_press_after_window_is_new_click() {
    let mut state = ButtonState::new(ButtonConfig::default().with_double_click_ms(300));

    let events = run(&mut state, &[(true, 0), (false, 50), (true, 400)]);
    assert_eq!(events[2], ButtonEvent::Down);
}

#[test]
fn virtual_click_confirms_single_click() {
    let mut state = ButtonState::new(
        ButtonConfig::default()
            .with_double_click_ms(300)
            .with_virtual_click(true),
    );

    let events = run(
        &mut state,
        &[(true, 0), (false, 50), (false, 100), (false, 301), (false, 310)],
    );
    assert_eq!(
        events,
        [
            ButtonEvent::Down,
            ButtonEvent::Up,
            ButtonEvent::Released,
            ButtonEvent::OneClick,
            ButtonEvent::Released,
        ]
    );
}

#[test]
fn no_virtual_click_after_double_click() {
    let mut state = ButtonState::new(ButtonConfig::default().with_virtual_click(true));

    let events = run(
        &mut state,
        &[(true, 0), (false, 50), (true, 100), (false, 150), (false, 1000)],
    );
    assert!(!events.contains(&ButtonEvent::OneClick));
}

// ============================================================================
// Long Clicks
// ============================================================================

#[test]
fn long_click_only_once() {
    let mut state = ButtonState::new(ButtonConfig::default().with_long_click_ms(800));

    let events = run(
        &mut state,
        &[(true, 0), (true, 799), (true, 800), (true, 900), (true, 2000), (false, 2010)],
    );
    assert_eq!(
        events,
        [
            ButtonEvent::Down,
            ButtonEvent::Pressed,
            ButtonEvent::LongClick,
            ButtonEvent::Pressed,
            ButtonEvent::Pressed,
            ButtonEvent::Up,
        ]
    );
}

#[test]
fn click_series_repeats_every_interval() {
    let mut state = ButtonState::new(
        ButtonConfig::default()
            .with_long_click_ms(800)
            .with_series_interval_ms(100)
            .with_long_click_mode(LongClickMode::ClickSeries),
    );

    let events = run(
        &mut state,
        &[
            (true, 0),
            (true, 400),
            (true, 800),
            (true, 850),
            (true, 900),
            (true, 950),
            (true, 1000),
        ],
    );
    assert_eq!(
        events,
        [
            ButtonEvent::Down,
            ButtonEvent::Pressed,
            ButtonEvent::LongClick,
            ButtonEvent::Pressed,
            ButtonEvent::LongClick,
            ButtonEvent::Pressed,
            ButtonEvent::LongClick,
        ]
    );
}

#[test]
fn continued_long_click_every_poll() {
    let mut state = ButtonState::new(
        ButtonConfig::default()
            .with_long_click_ms(500)
            .with_long_click_mode(LongClickMode::Continued),
    );

    let events = run(&mut state, &[(true, 0), (true, 500), (true, 501), (true, 502)]);
    assert_eq!(&events[1..], [ButtonEvent::LongClick; 3]);
}

#[test]
fn long_click_is_not_a_double_click_start() {
    let mut state = ButtonState::new(
        ButtonConfig::default()
            .with_long_click_ms(200)
            .with_double_click_ms(300),
    );

    // held past the long click, released and pressed again inside the window
    let events = run(&mut state, &[(true, 0), (true, 200), (false, 250), (true, 280)]);
    assert_eq!(events[1], ButtonEvent::LongClick);
    assert_eq!(events[3], ButtonEvent::Down);
}

#[test]
fn each_hold_gets_its_own_long_click() {
    // double click window longer than the long click timeout
    let mut state = ButtonState::new(
        ButtonConfig::default()
            .with_long_click_ms(500)
            .with_double_click_ms(800),
    );

    let events = run(
        &mut state,
        &[(true, 0), (true, 500), (false, 600), (false, 650), (true, 700)],
    );
    assert_eq!(
        events,
        [
            ButtonEvent::Down,
            ButtonEvent::LongClick,
            ButtonEvent::Up,
            ButtonEvent::Released,
            ButtonEvent::Down,
        ]
    );

    let second_hold: Vec<_> = (705..=1500)
        .step_by(5)
        .map(|t| state.update(true, t))
        .collect();
    let long_clicks = second_hold
        .iter()
        .filter(|e| **e == ButtonEvent::LongClick)
        .count();
    assert_eq!(long_clicks, 1);
    // 500 ms after the second press
    assert_eq!(second_hold[99], ButtonEvent::LongClick);
}

#[test]
fn click_series_restarts_on_new_press() {
    let mut state = ButtonState::new(
        ButtonConfig::default()
            .with_long_click_ms(500)
            .with_double_click_ms(800)
            .with_series_interval_ms(100)
            .with_long_click_mode(LongClickMode::ClickSeries),
    );

    run(&mut state, &[(true, 0), (true, 500), (false, 600), (true, 700)]);
    assert_eq!(state.update(true, 800), ButtonEvent::Pressed);
    assert_eq!(state.update(true, 1200), ButtonEvent::LongClick);
}

// ============================================================================
// Wiring
// ============================================================================

#[test]
fn pull_up_normally_open_reads_low_as_closed() {
    let mut button = Button::new(MockButton::new(true), ButtonConfig::default());
    assert_eq!(button.poll(0), ButtonEvent::Released);

    button.input_mut().level = false;
    assert_eq!(button.poll(10), ButtonEvent::Down);
    assert!(button.is_closed());
}

#[test]
fn pull_down_normally_closed_reads_low_as_closed() {
    let mut button = Button::with_wiring(
        MockButton::new(true),
        InputType::PullDown,
        ContactType::NormallyClosed,
        ButtonConfig::default(),
    );
    assert!(!button.read_contacts());

    button.input_mut().level = false;
    assert!(button.read_contacts());
    assert_eq!(button.poll(0), ButtonEvent::Down);
}

#[test]
fn reset_drops_pending_click() {
    let mut button = Button::new(
        MockButton::new(false),
        ButtonConfig::default().with_virtual_click(true),
    );
    assert_eq!(button.poll(0), ButtonEvent::Down);
    button.input_mut().level = true;
    assert_eq!(button.poll(50), ButtonEvent::Up);

    button.reset();
    assert_eq!(button.last_event(), ButtonEvent::Released);
    assert_eq!(button.poll(1000), ButtonEvent::Released);
}
