//! Default key policy for devices with power, volume-up and volume-down keys
//!
//! - Hold power and press volume-up (or press home) to toggle the text log.
//! - Press power seven times in a row to reboot.
//! - Alternate volume-up and volume-down seven times to mount /system.
//! - Anything else is queued for the menu.

use super::{KeyAction, KeyPolicy, KeySnapshot};
use crate::config::HotkeyConfig;
use crate::keys::RegisteredKey;

/// Streak-counting hotkey classifier
#[derive(Debug, Clone)]
pub struct DefaultKeyPolicy {
    bindings: HotkeyConfig,
    consecutive_power: u32,
    consecutive_alternate: u32,
    previous_key: Option<u16>,
}

impl Default for DefaultKeyPolicy {
    fn default() -> Self {
        Self::new(HotkeyConfig::default())
    }
}

impl DefaultKeyPolicy {
    pub fn new(bindings: HotkeyConfig) -> Self {
        Self {
            bindings,
            consecutive_power: 0,
            consecutive_alternate: 0,
            previous_key: None,
        }
    }

    pub fn consecutive_power_presses(&self) -> u32 {
        self.consecutive_power
    }

    pub fn consecutive_alternate_presses(&self) -> u32 {
        self.consecutive_alternate
    }

    pub fn previous_key(&self) -> Option<u16> {
        self.previous_key
    }

    fn evaluate(&mut self, keys: &KeySnapshot<'_>, code: u16) -> KeyAction {
        let b = &self.bindings;

        if (keys.is_pressed(b.toggle_modifier) && code == b.toggle_key) || code == b.alt_toggle {
            return KeyAction::ToggleVisibility;
        }

        if code == b.power {
            if keys.reboot_enabled() {
                self.consecutive_power += 1;
                if self.consecutive_power >= b.combo_presses {
                    tracing::info!("Power pressed {} times, rebooting", self.consecutive_power);
                    return KeyAction::Reboot;
                }
            }
        } else {
            self.consecutive_power = 0;
        }

        if self.alternates(code) {
            self.consecutive_alternate += 1;
            if self.consecutive_alternate >= self.bindings.combo_presses {
                self.consecutive_alternate = 0;
                return KeyAction::PrivilegedMount;
            }
        } else {
            self.consecutive_alternate = 0;
        }

        KeyAction::Enqueue(code as i32)
    }

    /// Volume keys alternate when each differs from the one before, or
    /// when nothing has been registered yet.
    fn alternates(&self, code: u16) -> bool {
        let (up, down) = (self.bindings.volume_up, self.bindings.volume_down);
        match self.previous_key {
            None => code == up || code == down,
            Some(prev) => (code == up && prev == down) || (code == down && prev == up),
        }
    }
}

impl KeyPolicy for DefaultKeyPolicy {
    fn classify(&mut self, keys: &KeySnapshot<'_>, key: RegisteredKey) -> KeyAction {
        let action = self.evaluate(keys, key.code);
        self.previous_key = Some(key.code);
        tracing::debug!(
            "Classified key {} (long={}) as {:?}",
            key.code,
            key.long_press,
            action
        );
        action
    }
}
