//! Collaborators the input core calls but does not implement
//!
//! Rendering, privileged system operations and cable detection live outside
//! the input core. They are injected as trait objects when the input
//! service is built; [`linux`] provides the defaults used on a device.

pub mod linux;

pub use linux::{CommandSystem, LogUi, SysfsUsbState};

use serde::{Deserialize, Serialize};

/// Menu geometry reported by the renderer, used to map a tap to a menu row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenLayout {
    /// Rows above the first menu row
    pub top_offset: i32,
    /// Number of menu rows that fit on screen
    pub visible_count: i32,
    /// Height of one row in pixels
    pub row_height: i32,
    /// Index of the first menu item shown
    pub selection_offset: i32,
    /// Number of selectable menu items
    pub selection_count: i32,
}

/// One full-height menu of 40px rows on a 1280px portrait panel
impl Default for ScreenLayout {
    fn default() -> Self {
        Self {
            top_offset: 0,
            visible_count: 32,
            row_height: 40,
            selection_offset: 0,
            selection_count: 32,
        }
    }
}

impl ScreenLayout {
    /// Map a screen Y coordinate to a menu item index.
    ///
    /// Returns `None` when the row is off the visible menu or past the last
    /// selectable item.
    pub fn item_at(&self, y: i32) -> Option<i32> {
        if self.row_height <= 0 {
            return None;
        }
        let index = y / self.row_height - self.top_offset + self.selection_offset;
        let selectable = index >= 0
            && index < self.visible_count
            && index < self.selection_offset + self.selection_count;
        selectable.then_some(index)
    }
}

/// Rendering and log collaborator
pub trait RecoveryUi: Send + Sync {
    /// Append a line to the on-screen log
    fn print(&self, text: &str);

    /// Show or hide the text log overlay
    fn show_text(&self, visible: bool);

    /// Whether the text log overlay is showing
    fn is_text_visible(&self) -> bool;

    /// Current menu geometry
    fn screen_layout(&self) -> ScreenLayout;
}

/// Privileged operations triggered by hotkey combos.
///
/// Failures are reported to the caller, which logs them; they never affect
/// input processing.
pub trait SystemActions: Send + Sync {
    fn reboot(&self) -> anyhow::Result<()>;

    fn mount_system(&self) -> anyhow::Result<()>;
}

/// Reports whether a host cable is attached. While it is, `wait_key`
/// never times out.
pub trait ConnectivityCheck: Send + Sync {
    fn is_connected(&self) -> bool;
}
