//! Native engine boundary.
//!
//! Every call into the terminal engine goes through [`NativeEngine`]. The
//! real implementation forwards to `libghostty` (feature `ghostty`); tests
//! substitute a recording fake. Native handles are wrapped in single-owner
//! types whose `Drop` calls the matching free function exactly once.

use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr::{self, NonNull};
use std::rc::Rc;

use once_cell::sync::OnceCell;

use super::ffi;

macro_rules! raw_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonNull<c_void>);

        impl $name {
            /// Wrap a pointer returned by the engine; `None` if it is null
            pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
                NonNull::new(ptr).map(Self)
            }

            pub fn as_ptr(self) -> *mut c_void {
                self.0.as_ptr()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:p})"), self.0)
            }
        }
    };
}

raw_handle!(
    /// Borrowed `ghostty_app_t`
    RawApp
);
raw_handle!(
    /// Borrowed `ghostty_config_t`
    RawConfig
);
raw_handle!(
    /// Borrowed `ghostty_surface_t`
    RawSurface
);

/// The engine's C entry points, one method per function.
///
/// Methods taking a raw handle require that the handle is live (not yet
/// freed). Pointers embedded in the `ffi` structs must stay valid for the
/// duration of the call.
pub trait NativeEngine {
    /// `ghostty_init`; zero means success
    fn init(&self, args: &[CString]) -> c_int;

    fn config_new(&self) -> Option<RawConfig>;
    fn config_load_default_files(&self, config: RawConfig);
    fn config_load_recursive_files(&self, config: RawConfig);
    fn config_finalize(&self, config: RawConfig);
    fn config_free(&self, config: RawConfig);

    fn app_new(&self, runtime: &ffi::RuntimeConfig, config: RawConfig) -> Option<RawApp>;
    fn app_free(&self, app: RawApp);
    fn app_tick(&self, app: RawApp);
    fn app_set_focus(&self, app: RawApp, focused: bool);

    fn surface_new(&self, app: RawApp, config: &ffi::SurfaceConfig) -> Option<RawSurface>;
    fn surface_free(&self, surface: RawSurface);
    fn surface_key(&self, surface: RawSurface, event: ffi::InputKey) -> bool;
    fn surface_text(&self, surface: RawSurface, text: &[u8]);
    fn surface_mouse_pos(&self, surface: RawSurface, x: f64, y: f64, mods: c_int);
    fn surface_mouse_button(&self, surface: RawSurface, state: c_int, button: c_int, mods: c_int)
        -> bool;
    fn surface_mouse_scroll(
        &self,
        surface: RawSurface,
        dx: f64,
        dy: f64,
        mods: ffi::ghostty_input_scroll_mods_t,
    );
    /// Fills `out` and returns true when a selection exists. A filled
    /// buffer must be handed back through [`NativeEngine::surface_free_text`].
    fn surface_read_selection(&self, surface: RawSurface, out: &mut ffi::Text) -> bool;
    fn surface_free_text(&self, surface: RawSurface, text: &mut ffi::Text);
    fn surface_has_selection(&self, surface: RawSurface) -> bool;
    fn surface_set_focus(&self, surface: RawSurface, focused: bool);
    fn surface_set_content_scale(&self, surface: RawSurface, x: f64, y: f64);
    fn surface_set_size(&self, surface: RawSurface, width: u32, height: u32);
    fn surface_process_exited(&self, surface: RawSurface) -> bool;
    fn surface_complete_clipboard_request(
        &self,
        surface: RawSurface,
        content: &CStr,
        state: *mut c_void,
        confirmed: bool,
    );
}

/// Owns a `ghostty_config_t`
pub struct OwnedConfig {
    native: Rc<dyn NativeEngine>,
    raw: RawConfig,
}

impl OwnedConfig {
    pub fn new(native: Rc<dyn NativeEngine>, raw: RawConfig) -> Self {
        Self { native, raw }
    }

    pub fn raw(&self) -> RawConfig {
        self.raw
    }
}

impl Drop for OwnedConfig {
    fn drop(&mut self) {
        self.native.config_free(self.raw);
    }
}

/// Owns a `ghostty_app_t`
pub struct OwnedApp {
    native: Rc<dyn NativeEngine>,
    raw: RawApp,
}

impl OwnedApp {
    pub fn new(native: Rc<dyn NativeEngine>, raw: RawApp) -> Self {
        Self { native, raw }
    }

    pub fn raw(&self) -> RawApp {
        self.raw
    }
}

impl Drop for OwnedApp {
    fn drop(&mut self) {
        self.native.app_free(self.raw);
    }
}

/// Owns a `ghostty_surface_t`
pub struct OwnedSurface {
    native: Rc<dyn NativeEngine>,
    raw: RawSurface,
}

impl OwnedSurface {
    pub fn new(native: Rc<dyn NativeEngine>, raw: RawSurface) -> Self {
        Self { native, raw }
    }

    pub fn raw(&self) -> RawSurface {
        self.raw
    }
}

impl Drop for OwnedSurface {
    fn drop(&mut self) {
        self.native.surface_free(self.raw);
    }
}

/// Process arguments in C `argv` form.
///
/// The engine adopts the argv it is initialized with as the process
/// arguments and never copies it, so the strings and the pointer array must
/// live until the process exits.
pub struct ProcessArgv {
    args: Vec<CString>,
    // NULL-terminated; points into `args`, whose heap buffers never move
    argv: Vec<*mut c_char>,
}

// SAFETY: the pointers only refer to the immutable `CString` buffers owned
// by the same value, and nothing writes through them.
unsafe impl Send for ProcessArgv {}
unsafe impl Sync for ProcessArgv {}

static PROCESS_ARGV: OnceCell<ProcessArgv> = OnceCell::new();

impl ProcessArgv {
    pub fn new(args: &[CString]) -> Self {
        let args = args.to_vec();
        let mut argv: Vec<*mut c_char> = args.iter().map(|a| a.as_ptr() as *mut c_char).collect();
        argv.push(ptr::null_mut());
        Self { args, argv }
    }

    /// The process-wide argv. The first call fixes it; later calls return
    /// the same arguments regardless of `args`.
    pub fn process(args: &[CString]) -> &'static ProcessArgv {
        PROCESS_ARGV.get_or_init(|| ProcessArgv::new(args))
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }

    pub fn argv(&self) -> *mut *mut c_char {
        self.argv.as_ptr() as *mut *mut c_char
    }
}

/// Backend used when the binary is built without `libghostty`.
///
/// Initialization always fails, so the engine settles in the error state
/// and every surface created from it is unhealthy.
#[derive(Debug, Default)]
pub struct UnavailableEngine;

impl NativeEngine for UnavailableEngine {
    fn init(&self, _args: &[CString]) -> c_int {
        -1
    }

    fn config_new(&self) -> Option<RawConfig> {
        None
    }
    fn config_load_default_files(&self, _config: RawConfig) {}
    fn config_load_recursive_files(&self, _config: RawConfig) {}
    fn config_finalize(&self, _config: RawConfig) {}
    fn config_free(&self, _config: RawConfig) {}

    fn app_new(&self, _runtime: &ffi::RuntimeConfig, _config: RawConfig) -> Option<RawApp> {
        None
    }
    fn app_free(&self, _app: RawApp) {}
    fn app_tick(&self, _app: RawApp) {}
    fn app_set_focus(&self, _app: RawApp, _focused: bool) {}

    fn surface_new(&self, _app: RawApp, _config: &ffi::SurfaceConfig) -> Option<RawSurface> {
        None
    }
    fn surface_free(&self, _surface: RawSurface) {}
    fn surface_key(&self, _surface: RawSurface, _event: ffi::InputKey) -> bool {
        false
    }
    fn surface_text(&self, _surface: RawSurface, _text: &[u8]) {}
    fn surface_mouse_pos(&self, _surface: RawSurface, _x: f64, _y: f64, _mods: c_int) {}
    fn surface_mouse_button(
        &self,
        _surface: RawSurface,
        _state: c_int,
        _button: c_int,
        _mods: c_int,
    ) -> bool {
        false
    }
    fn surface_mouse_scroll(
        &self,
        _surface: RawSurface,
        _dx: f64,
        _dy: f64,
        _mods: ffi::ghostty_input_scroll_mods_t,
    ) {
    }
    fn surface_read_selection(&self, _surface: RawSurface, _out: &mut ffi::Text) -> bool {
        false
    }
    fn surface_free_text(&self, _surface: RawSurface, _text: &mut ffi::Text) {}
    fn surface_has_selection(&self, _surface: RawSurface) -> bool {
        false
    }
    fn surface_set_focus(&self, _surface: RawSurface, _focused: bool) {}
    fn surface_set_content_scale(&self, _surface: RawSurface, _x: f64, _y: f64) {}
    fn surface_set_size(&self, _surface: RawSurface, _width: u32, _height: u32) {}
    fn surface_process_exited(&self, _surface: RawSurface) -> bool {
        true
    }
    fn surface_complete_clipboard_request(
        &self,
        _surface: RawSurface,
        _content: &CStr,
        _state: *mut c_void,
        _confirmed: bool,
    ) {
    }
}
