//! Host-side input events and geometry.
//!
//! These mirror what an AppKit-style host delivers: logical-point geometry
//! with a bottom-left origin, raw modifier flags including the
//! device-dependent left/right bits, and the characters a key produced.

use bitflags::bitflags;

/// A point in logical (unscaled) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A size in logical (unscaled) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A rectangle in logical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Rect at the origin covering `size`
    pub const fn from_size(size: Size) -> Self {
        Self {
            origin: Point::new(0.0, 0.0),
            size,
        }
    }
}

bitflags! {
    /// Raw host modifier flags (`NSEvent.modifierFlags`).
    ///
    /// The high bits are the device-independent modifiers; the low bits are
    /// the device-dependent masks that tell left and right keys apart.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u64 {
        const DEVICE_LEFT_CONTROL  = 0x0000_0001;
        const DEVICE_LEFT_SHIFT    = 0x0000_0002;
        const DEVICE_RIGHT_SHIFT   = 0x0000_0004;
        const DEVICE_LEFT_COMMAND  = 0x0000_0008;
        const DEVICE_RIGHT_COMMAND = 0x0000_0010;
        const DEVICE_LEFT_OPTION   = 0x0000_0020;
        const DEVICE_RIGHT_OPTION  = 0x0000_0040;
        const DEVICE_RIGHT_CONTROL = 0x0000_2000;

        const CAPS_LOCK   = 1 << 16;
        const SHIFT       = 1 << 17;
        const CONTROL     = 1 << 18;
        const OPTION      = 1 << 19;
        const COMMAND     = 1 << 20;
        const NUMERIC_PAD = 1 << 21;
        const HELP        = 1 << 22;
        const FUNCTION    = 1 << 23;
    }
}

/// A key down, key up, or flags-changed event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostKeyEvent {
    /// Hardware-dependent virtual key code
    pub key_code: u16,
    pub modifier_flags: ModifierFlags,
    /// Characters produced with the current modifiers applied
    pub characters: Option<String>,
    /// Characters produced with no modifiers applied at all
    pub unmodified_characters: Option<String>,
    /// Auto-repeat key down
    pub is_repeat: bool,
}

impl HostKeyEvent {
    pub fn new(key_code: u16, modifier_flags: ModifierFlags) -> Self {
        Self {
            key_code,
            modifier_flags,
            ..Self::default()
        }
    }

    pub fn with_characters(mut self, characters: &str, unmodified: &str) -> Self {
        self.characters = Some(characters.to_string());
        self.unmodified_characters = Some(unmodified.to_string());
        self
    }

    pub fn repeating(mut self) -> Self {
        self.is_repeat = true;
        self
    }
}

/// Mouse buttons the surface forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// A mouse motion or button event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostMouseEvent {
    /// Location in the view's coordinates, origin bottom-left
    pub location: Point,
    pub modifier_flags: ModifierFlags,
}

impl HostMouseEvent {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            location: Point::new(x, y),
            modifier_flags: ModifierFlags::empty(),
        }
    }
}

/// Scroll gesture momentum phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MomentumPhase {
    #[default]
    None,
    Began,
    Stationary,
    Changed,
    Ended,
    Cancelled,
    MayBegin,
}

/// A scroll wheel or trackpad scroll event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostScrollEvent {
    pub location: Point,
    pub delta_x: f64,
    pub delta_y: f64,
    /// Deltas come from a precise device (trackpad, magic mouse)
    pub precise: bool,
    pub momentum: MomentumPhase,
    pub modifier_flags: ModifierFlags,
}
