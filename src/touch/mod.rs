//! Touch gesture recognizer
//!
//! Turns multi-touch absolute reports into menu navigation:
//! - a finger moving vertically past the scroll threshold produces a
//!   highlight-up or highlight-down action per threshold step;
//! - a finger lifted at the same Y it landed on is a tap, mapped through the
//!   menu geometry to an "invoke item" action.
//!
//! The recognizer is owned by the dispatch thread and is never shared.

pub mod rotation;

pub use rotation::{DisplaySize, ScreenAxis};

use crate::codes::{
    ActionCode, ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_TRACKING_ID, BTN_TOOL_FINGER,
    BTN_TOUCH, EV_ABS, EV_KEY, EV_SYN, HIGHLIGHT_DOWN, HIGHLIGHT_UP, INVOKE_ITEM, SYN_REPORT,
};
use crate::config::{Rotation, TouchConfig};
use crate::platform::ScreenLayout;
use crate::source::RawEvent;

/// Number of per-finger history slots
pub const MAX_SLOTS: usize = 5;

/// Updates in one frame (tracking id, X and Y) that mark a moving finger
const MOVING_FRAME_UPDATES: u32 = 3;

/// Screen-space touch position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchPoint {
    pub x: i32,
    pub y: i32,
    pub tracking_id: i32,
}

/// What the recognizer made of one raw event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchOutcome {
    /// The event belonged to the touchscreen and must not reach key handling
    pub consumed: bool,
    /// Navigation action to queue
    pub action: Option<ActionCode>,
    /// Menu index chosen by a tap
    pub selection: Option<i32>,
    /// The scroll direction reversed; queued actions are stale
    pub cancel_pending: bool,
}

impl TouchOutcome {
    fn consumed() -> Self {
        Self {
            consumed: true,
            ..Self::default()
        }
    }
}

/// Per-gesture touch accumulator
#[derive(Debug)]
pub struct TouchRecognizer {
    rotation: Rotation,
    display: DisplaySize,
    scroll_threshold: i32,
    last: TouchPoint,
    first: TouchPoint,
    history: [TouchPoint; MAX_SLOTS],
    updates: u32,
    move_pile: i32,
}

impl TouchRecognizer {
    pub fn new(rotation: Rotation, display: DisplaySize, scroll_threshold: i32) -> Self {
        Self {
            rotation,
            display,
            scroll_threshold,
            last: TouchPoint::default(),
            first: TouchPoint::default(),
            history: [TouchPoint::default(); MAX_SLOTS],
            updates: 0,
            move_pile: 0,
        }
    }

    pub fn from_config(config: &TouchConfig) -> Self {
        Self::new(
            config.rotation,
            DisplaySize {
                width: config.display_width,
                height: config.display_height,
            },
            config.scroll_threshold_px,
        )
    }

    /// Feed one raw event. `layout` is only queried when a tap completes.
    pub fn handle_event<F>(&mut self, event: &RawEvent, layout: F) -> TouchOutcome
    where
        F: FnOnce() -> ScreenLayout,
    {
        match event.kind {
            EV_ABS => {
                self.accumulate(event.code, event.value);
                TouchOutcome::consumed()
            }
            EV_KEY if event.code == BTN_TOUCH || event.code == BTN_TOOL_FINGER => {
                TouchOutcome::consumed()
            }
            EV_SYN => {
                let outcome = self.evaluate(layout);
                if event.code == SYN_REPORT && event.value == 0 {
                    self.updates = 0;
                }
                outcome
            }
            _ => TouchOutcome::default(),
        }
    }

    /// Most recent accumulated position
    pub fn last_point(&self) -> TouchPoint {
        self.last
    }

    fn accumulate(&mut self, code: u16, value: i32) {
        match code {
            ABS_MT_TRACKING_ID => {
                // -1 releases the slot and is not a position update
                if value >= 0 {
                    self.last.tracking_id = value;
                    self.updates += 1;
                }
            }
            ABS_MT_POSITION_X if value != 0 => {
                let mapped = rotation::map_position_x(self.rotation, self.display, value);
                self.store(mapped);
            }
            ABS_MT_POSITION_Y if value != 0 => {
                let mapped = rotation::map_position_y(self.rotation, self.display, value);
                self.store(mapped);
            }
            _ => {}
        }
    }

    /// Record a mapped position. Values off the display are dropped.
    fn store(&mut self, (axis, value): (ScreenAxis, i32)) {
        let limit = match axis {
            ScreenAxis::X => self.display.width,
            ScreenAxis::Y => self.display.height,
        };
        if !(0..=limit).contains(&value) {
            tracing::debug!("Ignoring out-of-range touch position {:?}={}", axis, value);
            return;
        }
        match axis {
            ScreenAxis::X => self.last.x = value,
            ScreenAxis::Y => self.last.y = value,
        }
        self.updates += 1;
    }

    fn evaluate<F>(&mut self, layout: F) -> TouchOutcome
    where
        F: FnOnce() -> ScreenLayout,
    {
        let mut outcome = TouchOutcome::default();

        if self.updates == MOVING_FRAME_UPDATES {
            self.track_motion(&mut outcome);
        }

        if self.updates == 0 && self.last.y != 0 {
            if self.first.y == self.last.y {
                if let Some(index) = layout().item_at(self.last.y) {
                    tracing::debug!("Tap at y={} selects item {}", self.last.y, index);
                    outcome.action = Some(INVOKE_ITEM);
                    outcome.selection = Some(index);
                }
            }
            self.reset();
        }

        outcome
    }

    fn track_motion(&mut self, outcome: &mut TouchOutcome) {
        if self.first.y == 0 {
            self.first.y = self.last.y;
        }

        let slot = self.last.tracking_id.rem_euclid(MAX_SLOTS as i32) as usize;
        let anchor = self.history[slot].y;
        if anchor == 0 {
            self.history[slot].y = self.last.y;
            return;
        }

        let delta = self.last.y.saturating_sub(anchor);
        if delta.signum() * self.move_pile.signum() < 0 {
            self.move_pile = 0;
            outcome.cancel_pending = true;
        } else {
            self.move_pile = self.move_pile.saturating_add(delta);
        }

        if delta > self.scroll_threshold {
            outcome.action = Some(HIGHLIGHT_DOWN);
            self.history[slot].y = self.last.y;
        } else if delta < -self.scroll_threshold {
            outcome.action = Some(HIGHLIGHT_UP);
            self.history[slot].y = self.last.y;
        }
    }

    /// Clear every accumulator together
    fn reset(&mut self) {
        self.last = TouchPoint::default();
        self.first = TouchPoint::default();
        self.history = [TouchPoint::default(); MAX_SLOTS];
        self.move_pile = 0;
    }
}
