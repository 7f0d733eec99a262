//! Hotkey classification
//!
//! Every registered key is passed through a [`KeyPolicy`] which decides what
//! the key means: a visibility toggle, an immediate reboot, a privileged
//! mount, an ordinary queued key, or nothing at all. The policy is chosen
//! when the input service is built; devices with unusual buttons supply
//! their own policy, everything else uses [`DefaultKeyPolicy`].

pub mod default_policy;

pub use default_policy::DefaultKeyPolicy;

use crate::codes::ActionCode;
use crate::keys::{KeyTracker, RegisteredKey};

/// Result of classifying a registered key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Drop the key
    Ignore,
    /// Flip the text log overlay
    ToggleVisibility,
    /// Reboot the device (only honoured while reboot is enabled)
    Reboot,
    /// Queue the code for the foreground consumer
    Enqueue(ActionCode),
    /// Mount the system partition
    PrivilegedMount,
}

/// Read-only view of live key state handed to a policy.
///
/// Policies run with the input lock held, so the view is consistent with
/// the key being classified.
#[derive(Debug, Clone, Copy)]
pub struct KeySnapshot<'a> {
    keys: &'a KeyTracker,
    reboot_enabled: bool,
}

impl<'a> KeySnapshot<'a> {
    pub fn new(keys: &'a KeyTracker, reboot_enabled: bool) -> Self {
        Self {
            keys,
            reboot_enabled,
        }
    }

    /// Whether `code` is held down right now
    pub fn is_pressed(&self, code: u16) -> bool {
        self.keys.is_pressed(code)
    }

    /// Whether the reboot combo is currently allowed
    pub fn reboot_enabled(&self) -> bool {
        self.reboot_enabled
    }
}

/// Device policy deciding what registered keys and long presses do.
///
/// Both methods are called with the input lock held and must not call back
/// into the input service.
pub trait KeyPolicy: Send {
    /// Classify a completed press/release pair
    fn classify(&mut self, keys: &KeySnapshot<'_>, key: RegisteredKey) -> KeyAction;

    /// Called when a key has been held past the long-press threshold
    fn on_long_press(&mut self, _keys: &KeySnapshot<'_>, _code: u16) -> KeyAction {
        KeyAction::Ignore
    }
}
