//! `NativeEngine` over the linked `libghostty`.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};

use super::ffi::{self, ghostty_app_t, ghostty_config_t, ghostty_surface_t};
use super::native::{NativeEngine, ProcessArgv, RawApp, RawConfig, RawSurface};

#[link(name = "ghostty")]
extern "C" {
    fn ghostty_init(argc: usize, argv: *mut *mut c_char) -> c_int;

    fn ghostty_config_new() -> ghostty_config_t;
    fn ghostty_config_free(config: ghostty_config_t);
    fn ghostty_config_load_default_files(config: ghostty_config_t);
    fn ghostty_config_load_recursive_files(config: ghostty_config_t);
    fn ghostty_config_finalize(config: ghostty_config_t);

    fn ghostty_app_new(runtime: *const ffi::RuntimeConfig, config: ghostty_config_t) -> ghostty_app_t;
    fn ghostty_app_free(app: ghostty_app_t);
    fn ghostty_app_tick(app: ghostty_app_t);
    fn ghostty_app_set_focus(app: ghostty_app_t, focused: bool);

    fn ghostty_surface_new(app: ghostty_app_t, config: *const ffi::SurfaceConfig) -> ghostty_surface_t;
    fn ghostty_surface_free(surface: ghostty_surface_t);
    fn ghostty_surface_key(surface: ghostty_surface_t, event: ffi::InputKey) -> bool;
    fn ghostty_surface_text(surface: ghostty_surface_t, text: *const c_char, len: usize);
    fn ghostty_surface_mouse_pos(surface: ghostty_surface_t, x: f64, y: f64, mods: c_int);
    fn ghostty_surface_mouse_button(
        surface: ghostty_surface_t,
        state: c_int,
        button: c_int,
        mods: c_int,
    ) -> bool;
    fn ghostty_surface_mouse_scroll(
        surface: ghostty_surface_t,
        dx: f64,
        dy: f64,
        mods: ffi::ghostty_input_scroll_mods_t,
    );
    fn ghostty_surface_read_selection(surface: ghostty_surface_t, text: *mut ffi::Text) -> bool;
    fn ghostty_surface_free_text(surface: ghostty_surface_t, text: *mut ffi::Text);
    fn ghostty_surface_has_selection(surface: ghostty_surface_t) -> bool;
    fn ghostty_surface_set_focus(surface: ghostty_surface_t, focused: bool);
    fn ghostty_surface_set_content_scale(surface: ghostty_surface_t, x: f64, y: f64);
    fn ghostty_surface_set_size(surface: ghostty_surface_t, width: u32, height: u32);
    fn ghostty_surface_process_exited(surface: ghostty_surface_t) -> bool;
    fn ghostty_surface_complete_clipboard_request(
        surface: ghostty_surface_t,
        content: *const c_char,
        state: *mut c_void,
        confirmed: bool,
    );
}

/// The linked engine library
#[derive(Debug, Default)]
pub struct GhosttyLib;

// SAFETY (all methods): raw handles passed in are live per the trait
// contract, and every pointer argument outlives its call.
impl NativeEngine for GhosttyLib {
    fn init(&self, args: &[CString]) -> c_int {
        // The engine keeps argv for the rest of the process
        let argv = ProcessArgv::process(args);
        unsafe { ghostty_init(argv.argc(), argv.argv()) }
    }

    fn config_new(&self) -> Option<RawConfig> {
        RawConfig::from_ptr(unsafe { ghostty_config_new() })
    }

    fn config_load_default_files(&self, config: RawConfig) {
        unsafe { ghostty_config_load_default_files(config.as_ptr()) }
    }

    fn config_load_recursive_files(&self, config: RawConfig) {
        unsafe { ghostty_config_load_recursive_files(config.as_ptr()) }
    }

    fn config_finalize(&self, config: RawConfig) {
        unsafe { ghostty_config_finalize(config.as_ptr()) }
    }

    fn config_free(&self, config: RawConfig) {
        unsafe { ghostty_config_free(config.as_ptr()) }
    }

    fn app_new(&self, runtime: &ffi::RuntimeConfig, config: RawConfig) -> Option<RawApp> {
        RawApp::from_ptr(unsafe { ghostty_app_new(runtime, config.as_ptr()) })
    }

    fn app_free(&self, app: RawApp) {
        unsafe { ghostty_app_free(app.as_ptr()) }
    }

    fn app_tick(&self, app: RawApp) {
        unsafe { ghostty_app_tick(app.as_ptr()) }
    }

    fn app_set_focus(&self, app: RawApp, focused: bool) {
        unsafe { ghostty_app_set_focus(app.as_ptr(), focused) }
    }

    fn surface_new(&self, app: RawApp, config: &ffi::SurfaceConfig) -> Option<RawSurface> {
        RawSurface::from_ptr(unsafe { ghostty_surface_new(app.as_ptr(), config) })
    }

    fn surface_free(&self, surface: RawSurface) {
        unsafe { ghostty_surface_free(surface.as_ptr()) }
    }

    fn surface_key(&self, surface: RawSurface, event: ffi::InputKey) -> bool {
        unsafe { ghostty_surface_key(surface.as_ptr(), event) }
    }

    fn surface_text(&self, surface: RawSurface, text: &[u8]) {
        unsafe { ghostty_surface_text(surface.as_ptr(), text.as_ptr().cast(), text.len()) }
    }

    fn surface_mouse_pos(&self, surface: RawSurface, x: f64, y: f64, mods: c_int) {
        unsafe { ghostty_surface_mouse_pos(surface.as_ptr(), x, y, mods) }
    }

    fn surface_mouse_button(
        &self,
        surface: RawSurface,
        state: c_int,
        button: c_int,
        mods: c_int,
    ) -> bool {
        unsafe { ghostty_surface_mouse_button(surface.as_ptr(), state, button, mods) }
    }

    fn surface_mouse_scroll(
        &self,
        surface: RawSurface,
        dx: f64,
        dy: f64,
        mods: ffi::ghostty_input_scroll_mods_t,
    ) {
        unsafe { ghostty_surface_mouse_scroll(surface.as_ptr(), dx, dy, mods) }
    }

    fn surface_read_selection(&self, surface: RawSurface, out: &mut ffi::Text) -> bool {
        unsafe { ghostty_surface_read_selection(surface.as_ptr(), out) }
    }

    fn surface_free_text(&self, surface: RawSurface, text: &mut ffi::Text) {
        unsafe { ghostty_surface_free_text(surface.as_ptr(), text) }
    }

    fn surface_has_selection(&self, surface: RawSurface) -> bool {
        unsafe { ghostty_surface_has_selection(surface.as_ptr()) }
    }

    fn surface_set_focus(&self, surface: RawSurface, focused: bool) {
        unsafe { ghostty_surface_set_focus(surface.as_ptr(), focused) }
    }

    fn surface_set_content_scale(&self, surface: RawSurface, x: f64, y: f64) {
        unsafe { ghostty_surface_set_content_scale(surface.as_ptr(), x, y) }
    }

    fn surface_set_size(&self, surface: RawSurface, width: u32, height: u32) {
        unsafe { ghostty_surface_set_size(surface.as_ptr(), width, height) }
    }

    fn surface_process_exited(&self, surface: RawSurface) -> bool {
        unsafe { ghostty_surface_process_exited(surface.as_ptr()) }
    }

    fn surface_complete_clipboard_request(
        &self,
        surface: RawSurface,
        content: &CStr,
        state: *mut c_void,
        confirmed: bool,
    ) {
        unsafe {
            ghostty_surface_complete_clipboard_request(
                surface.as_ptr(),
                content.as_ptr(),
                state,
                confirmed,
            )
        }
    }
}
