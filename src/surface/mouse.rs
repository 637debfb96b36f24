//! Mouse translation: buttons, flipped positions, packed scroll modifiers.

use std::os::raw::c_int;

use crate::engine::ffi;
use crate::host::event::{HostScrollEvent, MomentumPhase, MouseButton, Point};

/// Engine button code
pub fn button_code(button: MouseButton) -> c_int {
    match button {
        MouseButton::Left => ffi::MOUSE_LEFT,
        MouseButton::Right => ffi::MOUSE_RIGHT,
        MouseButton::Middle => ffi::MOUSE_MIDDLE,
    }
}

/// Convert a bottom-left-origin location into the engine's top-left space
pub fn flip(location: Point, view_height: f64) -> Point {
    Point::new(location.x, view_height - location.y)
}

fn momentum_code(phase: MomentumPhase) -> c_int {
    match phase {
        MomentumPhase::None => 0,
        MomentumPhase::Began => 1,
        MomentumPhase::Stationary => 2,
        MomentumPhase::Changed => 3,
        MomentumPhase::Ended => 4,
        MomentumPhase::Cancelled => 5,
        MomentumPhase::MayBegin => 6,
    }
}

/// Pack precision (bit 0) and momentum (bits 1..=3)
pub fn scroll_mods(precise: bool, momentum: MomentumPhase) -> ffi::ghostty_input_scroll_mods_t {
    let mut mods = 0;
    if precise {
        mods |= 0b1;
    }
    mods | (momentum_code(momentum) << 1)
}

/// Deltas and packed modifiers for a scroll event.
///
/// Precise devices report small deltas, so they are doubled to keep
/// trackpad scrolling at a comfortable speed.
pub fn scroll(event: &HostScrollEvent) -> (f64, f64, ffi::ghostty_input_scroll_mods_t) {
    let (mut dx, mut dy) = (event.delta_x, event.delta_y);
    if event.precise {
        dx *= 2.0;
        dy *= 2.0;
    }
    (dx, dy, scroll_mods(event.precise, event.momentum))
}
