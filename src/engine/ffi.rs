//! C ABI mirrors of the Ghostty embedding API.
//!
//! Only the subset of `ghostty.h` the embedding layer consumes is declared
//! here. Layouts follow the header; field names keep the C spelling where it
//! helps when cross-reading the header.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_void};

pub type ghostty_app_t = *mut c_void;
pub type ghostty_config_t = *mut c_void;
pub type ghostty_surface_t = *mut c_void;

/// Platform discriminator for `SurfaceConfig::platform_tag`
pub const PLATFORM_INVALID: c_int = 0;
pub const PLATFORM_MACOS: c_int = 1;
pub const PLATFORM_IOS: c_int = 2;

/// Surface context kinds
pub const SURFACE_CONTEXT_WINDOW: c_int = 0;
pub const SURFACE_CONTEXT_TAB: c_int = 1;
pub const SURFACE_CONTEXT_SPLIT: c_int = 2;

/// Clipboard locations
pub const CLIPBOARD_STANDARD: c_int = 0;
pub const CLIPBOARD_SELECTION: c_int = 1;

/// Clipboard confirmation request kinds
pub const CLIPBOARD_REQUEST_PASTE: c_int = 0;
pub const CLIPBOARD_REQUEST_OSC_52_READ: c_int = 1;
pub const CLIPBOARD_REQUEST_OSC_52_WRITE: c_int = 2;

/// Key actions
pub const ACTION_RELEASE: c_int = 0;
pub const ACTION_PRESS: c_int = 1;
pub const ACTION_REPEAT: c_int = 2;

/// Mouse button states
pub const MOUSE_RELEASE: c_int = 0;
pub const MOUSE_PRESS: c_int = 1;

/// Mouse buttons
pub const MOUSE_UNKNOWN: c_int = 0;
pub const MOUSE_LEFT: c_int = 1;
pub const MOUSE_RIGHT: c_int = 2;
pub const MOUSE_MIDDLE: c_int = 3;

/// Packed scroll modifiers: bit 0 precision, bits 1..=3 momentum phase
pub type ghostty_input_scroll_mods_t = c_int;

/// `ghostty_platform_macos_s`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PlatformMacos {
    pub nsview: *mut c_void,
}

/// `ghostty_platform_ios_s`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PlatformIos {
    pub uiview: *mut c_void,
}

/// `ghostty_platform_u`
#[repr(C)]
#[derive(Clone, Copy)]
pub union Platform {
    pub macos: PlatformMacos,
    pub ios: PlatformIos,
}

/// `ghostty_surface_config_s`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct SurfaceConfig {
    pub platform_tag: c_int,
    pub platform: Platform,
    pub userdata: *mut c_void,
    pub scale_factor: f64,
    pub font_size: f32,
    pub working_directory: *const c_char,
    pub command: *const c_char,
    pub initial_input: *const c_char,
    pub wait_after_command: bool,
    pub context: c_int,
}

/// `ghostty_input_key_s`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct InputKey {
    pub action: c_int,
    pub mods: c_int,
    pub consumed_mods: c_int,
    pub keycode: u32,
    pub text: *const c_char,
    pub unshifted_codepoint: u32,
    pub composing: bool,
}

/// `ghostty_text_s`, filled by `ghostty_surface_read_selection`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Text {
    pub tl_px_x: f64,
    pub tl_px_y: f64,
    pub offset_start: u32,
    pub offset_len: u32,
    pub text: *const c_char,
    pub text_len: usize,
}

impl Default for Text {
    fn default() -> Self {
        Self {
            tl_px_x: 0.0,
            tl_px_y: 0.0,
            offset_start: 0,
            offset_len: 0,
            text: std::ptr::null(),
            text_len: 0,
        }
    }
}

/// `ghostty_clipboard_content_s`
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ClipboardContent {
    pub mime: *const c_char,
    pub data: *const c_char,
}

/// `ghostty_target_s`. Only the surface arm of the union is ever read.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ActionTarget {
    pub tag: c_int,
    pub surface: ghostty_surface_t,
}

/// `ghostty_action_s`. The payload union is opaque to this layer.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct Action {
    pub tag: c_int,
    pub payload: [u64; 3],
}

pub type WakeupCb = unsafe extern "C" fn(userdata: *mut c_void);
pub type ActionCb =
    unsafe extern "C" fn(app: ghostty_app_t, target: ActionTarget, action: Action) -> bool;
pub type ReadClipboardCb =
    unsafe extern "C" fn(userdata: *mut c_void, location: c_int, state: *mut c_void);
pub type ConfirmReadClipboardCb = unsafe extern "C" fn(
    userdata: *mut c_void,
    content: *const c_char,
    state: *mut c_void,
    request: c_int,
);
pub type WriteClipboardCb = unsafe extern "C" fn(
    userdata: *mut c_void,
    location: c_int,
    content: *const ClipboardContent,
    len: usize,
    confirm: bool,
);
pub type CloseSurfaceCb = unsafe extern "C" fn(userdata: *mut c_void, process_alive: bool);

/// `ghostty_runtime_config_s`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct RuntimeConfig {
    pub userdata: *mut c_void,
    pub supports_selection_clipboard: bool,
    pub wakeup_cb: WakeupCb,
    pub action_cb: ActionCb,
    pub read_clipboard_cb: ReadClipboardCb,
    pub confirm_read_clipboard_cb: ConfirmReadClipboardCb,
    pub write_clipboard_cb: WriteClipboardCb,
    pub close_surface_cb: CloseSurfaceCb,
}
