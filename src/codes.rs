//! Linux input event constants and synthesized action codes
//!
//! Values mirror `linux/input-event-codes.h`. Only the subset the recovery
//! input core inspects is listed here; any other code passes through as a
//! plain number.

// Event types
pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;

// Synchronisation codes
pub const SYN_REPORT: u16 = 0x00;

// Relative axis
pub const REL_Y: u16 = 0x01;

// Multi-touch absolute axes
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;

// Key values
pub const KEY_RELEASE: i32 = 0;
pub const KEY_PRESS: i32 = 1;
pub const KEY_REPEAT: i32 = 2;

// Key codes
pub const KEY_HOME: u16 = 102;
pub const KEY_UP: u16 = 103;
pub const KEY_DOWN: u16 = 108;
pub const KEY_VOLUMEDOWN: u16 = 114;
pub const KEY_VOLUMEUP: u16 = 115;
pub const KEY_POWER: u16 = 116;
pub const BTN_TOOL_FINGER: u16 = 0x145;
pub const BTN_TOUCH: u16 = 0x14a;

/// Highest key code the kernel reports
pub const KEY_MAX: u16 = 0x2ff;

/// Codes pulled from the action queue by the foreground menu loop.
///
/// Non-negative values are raw key codes; negative values are actions
/// synthesized by the touch recognizer.
pub type ActionCode = i32;

/// Move the menu highlight one row up
pub const HIGHLIGHT_UP: ActionCode = -2;
/// Move the menu highlight one row down
pub const HIGHLIGHT_DOWN: ActionCode = -3;
/// Invoke the currently selected menu item
pub const INVOKE_ITEM: ActionCode = -4;
