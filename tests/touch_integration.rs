//! End-to-end touch tests.
//!
//! Raw multi-touch reports go through a scripted source, the event loop and
//! the dispatcher, and come out as queued menu actions.

use recovery_input_lib::codes::{
    ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_TRACKING_ID, BTN_TOUCH, EV_ABS, EV_KEY, EV_SYN,
    HIGHLIGHT_DOWN, HIGHLIGHT_UP, INVOKE_ITEM, SYN_REPORT,
};
use recovery_input_lib::platform::{LogUi, ScreenLayout};
use recovery_input_lib::source::ScriptedSource;
use recovery_input_lib::{
    run_event_loop, Config, EventDispatcher, InputError, RawEvent, RecoveryInput,
};
use std::sync::Arc;
use std::time::Duration;

fn layout() -> ScreenLayout {
    ScreenLayout {
        top_offset: 0,
        visible_count: 5,
        row_height: 40,
        selection_offset: 0,
        selection_count: 5,
    }
}

fn touch_config() -> Config {
    let mut config = Config::default();
    config.touch.enabled = true;
    config
}

fn frame(id: i32, x: i32, y: i32) -> Vec<RawEvent> {
    vec![
        RawEvent::new(EV_ABS, ABS_MT_TRACKING_ID, id),
        RawEvent::new(EV_ABS, ABS_MT_POSITION_X, x),
        RawEvent::new(EV_ABS, ABS_MT_POSITION_Y, y),
        RawEvent::new(EV_SYN, SYN_REPORT, 0),
    ]
}

fn lift() -> Vec<RawEvent> {
    vec![
        RawEvent::new(EV_ABS, ABS_MT_TRACKING_ID, -1),
        RawEvent::new(EV_KEY, BTN_TOUCH, 0),
        RawEvent::new(EV_SYN, SYN_REPORT, 0),
    ]
}

/// Run `events` through the full pipeline and return the queued actions
fn run(config: &Config, events: Vec<RawEvent>) -> (RecoveryInput, Vec<i32>) {
    let input = RecoveryInput::builder(config.clone())
        .ui(Arc::new(LogUi::new(layout())))
        .build()
        .unwrap();
    let mut dispatcher = EventDispatcher::new(input.clone(), config);
    let mut source = ScriptedSource::new(events);

    let result = run_event_loop(&mut source, &mut dispatcher);
    assert!(matches!(result, Err(InputError::Disconnected)));

    let actions =
        std::iter::from_fn(|| input.wait_key_timeout(Duration::from_millis(5))).collect();
    (input, actions)
}

#[test]
fn test_tap_selects_menu_row() {
    let mut events = vec![RawEvent::new(EV_KEY, BTN_TOUCH, 1)];
    events.extend(frame(0, 200, 120));
    events.extend(lift());

    let (input, actions) = run(&touch_config(), events);
    assert_eq!(actions, vec![INVOKE_ITEM]);
    assert_eq!(input.touch_selection(), Some(3));
}

#[test]
fn test_drag_down_scrolls_twice() {
    let mut events = Vec::new();
    for y in [100, 125, 150] {
        events.extend(frame(0, 200, y));
    }
    events.extend(lift());

    let (input, actions) = run(&touch_config(), events);
    assert_eq!(actions, vec![HIGHLIGHT_DOWN, HIGHLIGHT_DOWN]);
    assert_eq!(input.touch_selection(), None);
}

#[test]
fn test_reversal_discards_queued_scrolls() {
    let mut events = Vec::new();
    for y in [300, 325, 350] {
        events.extend(frame(0, 200, y));
    }
    // Back up past the threshold: the two queued downs are flushed
    events.extend(frame(0, 200, 320));
    events.extend(lift());

    let (_, actions) = run(&touch_config(), events);
    assert_eq!(actions, vec![HIGHLIGHT_UP]);
}

#[test]
fn test_touch_disabled_ignores_abs_events() {
    let mut events = frame(0, 200, 120);
    events.extend(lift());

    let (input, actions) = run(&Config::default(), events);
    // Only BTN_TOUCH release without a press: nothing is registered
    assert!(actions.is_empty());
    assert_eq!(input.touch_selection(), None);
}

#[test]
fn test_tap_with_builtin_ui_uses_configured_layout() {
    let config = touch_config();
    let input = RecoveryInput::builder(config.clone()).build().unwrap();
    let mut dispatcher = EventDispatcher::new(input.clone(), &config);

    let mut events = frame(0, 200, 120);
    events.extend(lift());
    let mut source = ScriptedSource::new(events);
    assert!(matches!(
        run_event_loop(&mut source, &mut dispatcher),
        Err(InputError::Disconnected)
    ));

    assert_eq!(
        input.wait_key_timeout(Duration::from_millis(20)),
        Some(INVOKE_ITEM)
    );
    assert_eq!(input.touch_selection(), Some(3));
}

#[test]
fn test_off_screen_reports_do_not_disturb_gestures() {
    let mut events = Vec::new();
    for y in [1, 2_000_000_000, -2_000_000_000] {
        events.extend(frame(0, 200, y));
    }
    events.extend(lift());

    // Rejected reports leave the finger where it landed, so this is a tap
    let (input, actions) = run(&touch_config(), events);
    assert_eq!(actions, vec![INVOKE_ITEM]);
    assert_eq!(input.touch_selection(), Some(0));
}
