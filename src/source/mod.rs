//! Raw input event sources
//!
//! An [`EventSource`] yields decoded Linux input events one at a time.
//! [`run_event_loop`] drains a source into an [`EventDispatcher`] on the
//! calling thread, which becomes the single dispatch thread.

pub mod evdev;

pub use self::evdev::EvdevSource;

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::dispatch::EventDispatcher;

/// Event source errors
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input device I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("No input devices found in {0}")]
    NoDevices(PathBuf),

    #[error("Input source disconnected")]
    Disconnected,

    #[error("Failed to spawn input thread: {0}")]
    Spawn(#[source] io::Error),
}

/// One decoded `input_event`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub const fn new(kind: u16, code: u16, value: i32) -> Self {
        Self { kind, code, value }
    }
}

/// A stream of raw input events
pub trait EventSource {
    /// Block until an event is available or `timeout` elapses.
    ///
    /// `None` waits indefinitely. Returns `Ok(false)` on timeout and an error
    /// once the source can never produce another event.
    fn wait_for_event(&mut self, timeout: Option<Duration>) -> Result<bool, InputError>;

    /// Take the next ready event without blocking
    fn next_event(&mut self) -> Option<RawEvent>;
}

/// Dispatch events from `source` until it fails.
///
/// Each event is fully handled before the next one is read.
pub fn run_event_loop<S>(source: &mut S, dispatcher: &mut EventDispatcher) -> Result<(), InputError>
where
    S: EventSource + ?Sized,
{
    loop {
        if !source.wait_for_event(None)? {
            continue;
        }
        while let Some(event) = source.next_event() {
            dispatcher.dispatch(&event);
        }
    }
}

/// Replays a fixed list of events, then reports disconnection
#[derive(Debug, Default, Clone)]
pub struct ScriptedSource {
    events: VecDeque<RawEvent>,
}

impl ScriptedSource {
    pub fn new(events: impl IntoIterator<Item = RawEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for ScriptedSource {
    fn wait_for_event(&mut self, _timeout: Option<Duration>) -> Result<bool, InputError> {
        if self.events.is_empty() {
            Err(InputError::Disconnected)
        } else {
            Ok(true)
        }
    }

    fn next_event(&mut self) -> Option<RawEvent> {
        self.events.pop_front()
    }
}
