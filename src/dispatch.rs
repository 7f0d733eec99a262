//! Per-event routing on the dispatch thread
//!
//! Each raw event goes to the touch recognizer first (when touch is
//! enabled), then the trackball accumulator, then key handling.

use crate::codes::{
    EV_KEY, EV_REL, EV_SYN, KEY_DOWN, KEY_MAX, KEY_PRESS, KEY_RELEASE, KEY_UP, REL_Y,
};
use crate::config::Config;
use crate::service::RecoveryInput;
use crate::source::RawEvent;
use crate::touch::TouchRecognizer;

/// Turns relative Y motion into synthetic up/down key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Trackball {
    sum: i32,
    threshold: i32,
}

impl Trackball {
    fn new(threshold: i32) -> Self {
        Self { sum: 0, threshold }
    }

    fn feed(&mut self, delta: i32) -> Option<u16> {
        self.sum = self.sum.saturating_add(delta);
        let key = if self.sum > self.threshold {
            KEY_DOWN
        } else if self.sum < -self.threshold {
            KEY_UP
        } else {
            return None;
        };
        self.sum = 0;
        Some(key)
    }

    fn reset(&mut self) {
        self.sum = 0;
    }
}

/// State owned by the single dispatch thread
pub struct EventDispatcher {
    input: RecoveryInput,
    touch: Option<TouchRecognizer>,
    trackball: Trackball,
}

impl EventDispatcher {
    pub fn new(input: RecoveryInput, config: &Config) -> Self {
        let touch = config
            .touch
            .enabled
            .then(|| TouchRecognizer::from_config(&config.touch));
        Self {
            input,
            touch,
            trackball: Trackball::new(config.input.trackball_threshold),
        }
    }

    pub fn touch_enabled(&self) -> bool {
        self.touch.is_some()
    }

    pub fn dispatch(&mut self, event: &RawEvent) {
        if let Some(touch) = self.touch.as_mut() {
            let input = &self.input;
            let outcome = touch.handle_event(event, || input.screen_layout());

            if outcome.cancel_pending {
                tracing::debug!("Scroll direction reversed, flushing queued actions");
                input.flush_keys();
            }
            if let Some(action) = outcome.action {
                input.push_touch_action(action, outcome.selection);
            }
            if outcome.consumed {
                return;
            }
        }

        match event.kind {
            EV_SYN => {}
            EV_REL => {
                if event.code == REL_Y {
                    if let Some(key) = self.trackball.feed(event.value) {
                        self.input.process_key(key, true);
                        self.input.process_key(key, false);
                    }
                }
            }
            kind => {
                self.trackball.reset();
                if kind == EV_KEY {
                    self.dispatch_key(event.code, event.value);
                }
            }
        }
    }

    fn dispatch_key(&self, code: u16, value: i32) {
        if code > KEY_MAX {
            return;
        }
        match value {
            KEY_PRESS => self.input.process_key(code, true),
            KEY_RELEASE => self.input.process_key(code, false),
            // auto-repeat
            _ => {}
        }
    }
}
