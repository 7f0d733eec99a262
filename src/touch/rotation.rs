//! Digitizer-to-screen axis remapping for rotated displays

use crate::config::Rotation;

/// Screen axis a digitizer value lands on after rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAxis {
    X,
    Y,
}

/// Display size used to mirror coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySize {
    pub width: i32,
    pub height: i32,
}

/// Map a raw `ABS_MT_POSITION_X` value onto the rotated screen
pub fn map_position_x(rotation: Rotation, size: DisplaySize, value: i32) -> (ScreenAxis, i32) {
    match rotation {
        Rotation::None => (ScreenAxis::X, value),
        Rotation::Clockwise90 => (ScreenAxis::Y, size.height.saturating_sub(value)),
        Rotation::UpsideDown => (ScreenAxis::X, size.width.saturating_sub(value)),
        Rotation::Clockwise270 => (ScreenAxis::Y, value),
    }
}

/// Map a raw `ABS_MT_POSITION_Y` value onto the rotated screen
pub fn map_position_y(rotation: Rotation, size: DisplaySize, value: i32) -> (ScreenAxis, i32) {
    match rotation {
        Rotation::None => (ScreenAxis::Y, value),
        Rotation::Clockwise90 => (ScreenAxis::X, value),
        Rotation::UpsideDown => (ScreenAxis::Y, size.height.saturating_sub(value)),
        Rotation::Clockwise270 => (ScreenAxis::X, size.width.saturating_sub(value)),
    }
}
