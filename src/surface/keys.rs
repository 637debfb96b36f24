//! Keyboard translation
//!
//! Converts host key events into engine key events: action, raw key code,
//! sided modifier bitmask, unshifted codepoint and the text payload.

use std::ops::RangeInclusive;
use std::os::raw::c_int;

use bitflags::bitflags;

use crate::engine::ffi;
use crate::host::event::{HostKeyEvent, ModifierFlags};

/// Codepoints the host reserves for non-printing function keys
const FUNCTION_KEY_RANGE: RangeInclusive<u32> = 0xF700..=0xF8FF;

bitflags! {
    /// Engine modifier bitmask (`ghostty_input_mods_e`)
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Mods: c_int {
        const SHIFT       = 1 << 0;
        const CTRL        = 1 << 1;
        const ALT         = 1 << 2;
        const SUPER       = 1 << 3;
        const CAPS        = 1 << 4;
        const NUM         = 1 << 5;
        const SHIFT_RIGHT = 1 << 6;
        const CTRL_RIGHT  = 1 << 7;
        const ALT_RIGHT   = 1 << 8;
        const SUPER_RIGHT = 1 << 9;
    }
}

impl From<ModifierFlags> for Mods {
    fn from(flags: ModifierFlags) -> Self {
        let mut mods = Mods::empty();
        if flags.contains(ModifierFlags::SHIFT) {
            mods |= Mods::SHIFT;
        }
        if flags.contains(ModifierFlags::CONTROL) {
            mods |= Mods::CTRL;
        }
        if flags.contains(ModifierFlags::OPTION) {
            mods |= Mods::ALT;
        }
        if flags.contains(ModifierFlags::COMMAND) {
            mods |= Mods::SUPER;
        }
        if flags.contains(ModifierFlags::CAPS_LOCK) {
            mods |= Mods::CAPS;
        }

        // Sidedness comes from the device-dependent bits only
        if flags.contains(ModifierFlags::DEVICE_RIGHT_SHIFT) {
            mods |= Mods::SHIFT_RIGHT;
        }
        if flags.contains(ModifierFlags::DEVICE_RIGHT_CONTROL) {
            mods |= Mods::CTRL_RIGHT;
        }
        if flags.contains(ModifierFlags::DEVICE_RIGHT_OPTION) {
            mods |= Mods::ALT_RIGHT;
        }
        if flags.contains(ModifierFlags::DEVICE_RIGHT_COMMAND) {
            mods |= Mods::SUPER_RIGHT;
        }
        mods
    }
}

impl Mods {
    /// Modifiers that text translation may have consumed
    fn consumed(self) -> Mods {
        self - (Mods::CTRL | Mods::CTRL_RIGHT | Mods::SUPER | Mods::SUPER_RIGHT)
    }
}

/// Key action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
    Repeat,
}

impl KeyAction {
    pub fn code(self) -> c_int {
        match self {
            KeyAction::Press => ffi::ACTION_PRESS,
            KeyAction::Release => ffi::ACTION_RELEASE,
            KeyAction::Repeat => ffi::ACTION_REPEAT,
        }
    }
}

/// A translated key event, ready to be handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInput {
    pub action: KeyAction,
    pub mods: Mods,
    pub consumed_mods: Mods,
    pub keycode: u32,
    pub text: Option<String>,
    pub unshifted_codepoint: u32,
}

/// Translate a key down or key up event.
///
/// Releases never carry text.
pub fn translate(event: &HostKeyEvent, action: KeyAction) -> KeyInput {
    let mods = Mods::from(event.modifier_flags);
    let text = match action {
        KeyAction::Release => None,
        _ => event.characters.as_deref().and_then(key_text),
    };
    KeyInput {
        action,
        mods,
        consumed_mods: mods.consumed(),
        keycode: u32::from(event.key_code),
        text,
        unshifted_codepoint: unshifted_codepoint(event),
    }
}

/// Action for a key down event, honoring auto-repeat
pub fn key_down_action(event: &HostKeyEvent) -> KeyAction {
    if event.is_repeat {
        KeyAction::Repeat
    } else {
        KeyAction::Press
    }
}

/// Translate a bare modifier press or release.
///
/// Returns `None` for key codes that are not modifier keys.
pub fn flags_changed(event: &HostKeyEvent) -> Option<KeyInput> {
    let (modifier, side) = modifier_key(event.key_code)?;
    let mods = Mods::from(event.modifier_flags);

    // The modifier is down if its bit is set and, for sided keys, the
    // device bit for this particular key is set too.
    let down = mods.contains(modifier)
        && side.map_or(true, |side| event.modifier_flags.contains(side));
    let action = if down {
        KeyAction::Press
    } else {
        KeyAction::Release
    };

    Some(KeyInput {
        action,
        mods,
        consumed_mods: Mods::empty(),
        keycode: u32::from(event.key_code),
        text: None,
        unshifted_codepoint: 0,
    })
}

/// Modifier bit and device bit for a modifier key code
fn modifier_key(key_code: u16) -> Option<(Mods, Option<ModifierFlags>)> {
    let entry = match key_code {
        0x39 => (Mods::CAPS, None),
        0x38 => (Mods::SHIFT, Some(ModifierFlags::DEVICE_LEFT_SHIFT)),
        0x3C => (Mods::SHIFT, Some(ModifierFlags::DEVICE_RIGHT_SHIFT)),
        0x3B => (Mods::CTRL, Some(ModifierFlags::DEVICE_LEFT_CONTROL)),
        0x3E => (Mods::CTRL, Some(ModifierFlags::DEVICE_RIGHT_CONTROL)),
        0x3A => (Mods::ALT, Some(ModifierFlags::DEVICE_LEFT_OPTION)),
        0x3D => (Mods::ALT, Some(ModifierFlags::DEVICE_RIGHT_OPTION)),
        0x37 => (Mods::SUPER, Some(ModifierFlags::DEVICE_LEFT_COMMAND)),
        0x36 => (Mods::SUPER, Some(ModifierFlags::DEVICE_RIGHT_COMMAND)),
        _ => return None,
    };
    Some(entry)
}

/// Text payload for the characters a key produced.
///
/// Nothing is text when the first scalar is a control character or a
/// function-key codepoint.
pub fn key_text(characters: &str) -> Option<String> {
    let cp = u32::from(characters.chars().next()?);
    if cp < 0x20 || FUNCTION_KEY_RANGE.contains(&cp) {
        return None;
    }
    Some(characters.to_string())
}

fn unshifted_codepoint(event: &HostKeyEvent) -> u32 {
    event
        .unmodified_characters
        .as_deref()
        .and_then(|s| s.chars().next())
        .map_or(0, u32::from)
}
