//! Key debounce and long-press tracking
//!
//! A key is "registered" when it is pressed and then released with no other
//! key press in between. Each press bumps a generation counter so that a
//! long-press timer started for an earlier press can tell it is stale.

pub mod timer;

pub use timer::LongPressTimer;

use crate::codes::KEY_MAX;

/// A completed press/release pair handed to the key policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredKey {
    /// Raw key code
    pub code: u16,
    /// Whether the long-press timer fired before the release
    pub long_press: bool,
}

/// Live key state: which codes are held and which press is being timed
#[derive(Debug)]
pub struct KeyTracker {
    pressed: Vec<bool>,
    last_down: Option<u16>,
    generation: u64,
    long_press: bool,
}

impl Default for KeyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyTracker {
    pub fn new() -> Self {
        Self {
            pressed: vec![false; KEY_MAX as usize + 1],
            last_down: None,
            generation: 0,
            long_press: false,
        }
    }

    /// Record a key-down and return the generation of this press.
    ///
    /// The new press supersedes whatever key was being timed before.
    /// Returns `None` for codes above `KEY_MAX`.
    pub fn press(&mut self, code: u16) -> Option<u64> {
        let slot = self.pressed.get_mut(code as usize)?;
        *slot = true;
        self.generation += 1;
        self.last_down = Some(code);
        self.long_press = false;
        Some(self.generation)
    }

    /// Record a key-up.
    ///
    /// Returns the registered key if `code` is the press currently being
    /// timed. The timed press is cleared either way.
    pub fn release(&mut self, code: u16) -> Option<RegisteredKey> {
        let slot = self.pressed.get_mut(code as usize)?;
        *slot = false;

        let registered = (self.last_down == Some(code)).then_some(RegisteredKey {
            code,
            long_press: self.long_press,
        });
        self.last_down = None;
        registered
    }

    /// Mark the timed press as long if it is still the press of `generation`.
    ///
    /// Returns `true` when the mark was applied.
    pub fn mark_long(&mut self, code: u16, generation: u64) -> bool {
        if self.last_down == Some(code) && self.generation == generation {
            self.long_press = true;
            return true;
        }
        false
    }

    /// Whether `code` is currently held down
    pub fn is_pressed(&self, code: u16) -> bool {
        self.pressed.get(code as usize).copied().unwrap_or(false)
    }

    /// The key currently being timed, if any
    pub fn timed_key(&self) -> Option<u16> {
        self.last_down
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{KEY_POWER, KEY_VOLUMEDOWN, KEY_VOLUMEUP};

    #[test]
    fn test_press_release_registers_short() {
        let mut tracker = KeyTracker::new();
        tracker.press(KEY_POWER);
        assert!(tracker.is_pressed(KEY_POWER));

        let registered = tracker.release(KEY_POWER);
        assert_eq!(
            registered,
            Some(RegisteredKey {
                code: KEY_POWER,
                long_press: false
            })
        );
        assert!(!tracker.is_pressed(KEY_POWER));
        assert_eq!(tracker.timed_key(), None);
    }

    #[test]
    fn test_long_press_mark_applies_to_current_generation() {
        let mut tracker = KeyTracker::new();
        let generation = tracker.press(KEY_VOLUMEUP).unwrap();

        assert!(tracker.mark_long(KEY_VOLUMEUP, generation));
        let registered = tracker.release(KEY_VOLUMEUP).unwrap();
        assert!(registered.long_press);
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let mut tracker = KeyTracker::new();
        let first = tracker.press(KEY_VOLUMEUP).unwrap();
        tracker.press(KEY_VOLUMEDOWN);
        tracker.release(KEY_VOLUMEDOWN);

        // The first key's timer wakes up after another key came and went
        assert!(!tracker.mark_long(KEY_VOLUMEUP, first));

        // Releasing the first key does not register: another key intervened
        assert_eq!(tracker.release(KEY_VOLUMEUP), None);
    }

    #[test]
    fn test_same_key_repress_supersedes_timer() {
        let mut tracker = KeyTracker::new();
        let first = tracker.press(KEY_POWER).unwrap();
        tracker.release(KEY_POWER);
        let second = tracker.press(KEY_POWER).unwrap();

        assert!(second > first);
        assert!(!tracker.mark_long(KEY_POWER, first));
        assert!(tracker.mark_long(KEY_POWER, second));
    }

    #[test]
    fn test_out_of_range_codes() {
        let mut tracker = KeyTracker::new();
        assert_eq!(tracker.press(KEY_MAX + 1), None);
        assert_eq!(tracker.release(KEY_MAX + 1), None);
        assert!(!tracker.is_pressed(KEY_MAX + 1));
        assert_eq!(tracker.generation(), 0);
    }
}
