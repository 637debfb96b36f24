//! Recording fake of the native engine for tests.

use std::cell::{Cell, RefCell};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use super::dispatch::{MainDispatcher, MainTask};
use super::ffi;
use super::native::{NativeEngine, RawApp, RawConfig, RawSurface};

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceNewRecord {
    pub surface: Option<RawSurface>,
    pub platform_tag: c_int,
    pub view: usize,
    pub userdata: usize,
    pub scale_factor: f64,
    pub font_size: f32,
    pub working_directory: Option<String>,
    pub command: Option<String>,
    pub initial_input: Option<String>,
    pub wait_after_command: bool,
    pub context: c_int,
    /// Raw addresses of the three string buffers, in field order
    pub buffer_ptrs: [usize; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyRecord {
    pub surface: RawSurface,
    pub action: c_int,
    pub mods: c_int,
    pub consumed_mods: c_int,
    pub keycode: u32,
    pub text: Option<String>,
    pub unshifted_codepoint: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init(Vec<String>),
    ConfigNew(RawConfig),
    ConfigLoadDefault(RawConfig),
    ConfigLoadRecursive(RawConfig),
    ConfigFinalize(RawConfig),
    ConfigFree(RawConfig),
    AppNew { supports_selection_clipboard: bool },
    AppFree(RawApp),
    AppTick(RawApp),
    AppSetFocus(RawApp, bool),
    SurfaceNew(SurfaceNewRecord),
    SurfaceFree(RawSurface),
    Key(KeyRecord),
    Text(RawSurface, String),
    MousePos(RawSurface, f64, f64, c_int),
    MouseButton(RawSurface, c_int, c_int, c_int),
    MouseScroll(RawSurface, f64, f64, c_int),
    ReadSelection(RawSurface),
    FreeText(RawSurface),
    HasSelection(RawSurface),
    SetFocus(RawSurface, bool),
    SetContentScale(RawSurface, f64, f64),
    SetSize(RawSurface, u32, u32),
    ProcessExited(RawSurface),
    CompleteClipboard {
        surface: RawSurface,
        content: String,
        state: usize,
        confirmed: bool,
    },
}

impl Call {
    /// True for calls that take a surface handle (everything after creation)
    pub fn is_surface_call(&self) -> bool {
        matches!(
            self,
            Call::SurfaceNew(_)
                | Call::SurfaceFree(_)
                | Call::Key(_)
                | Call::Text(..)
                | Call::MousePos(..)
                | Call::MouseButton(..)
                | Call::MouseScroll(..)
                | Call::ReadSelection(_)
                | Call::FreeText(_)
                | Call::HasSelection(_)
                | Call::SetFocus(..)
                | Call::SetContentScale(..)
                | Call::SetSize(..)
                | Call::ProcessExited(_)
                | Call::CompleteClipboard { .. }
        )
    }
}

/// In-process stand-in for `libghostty`
pub struct FakeEngine {
    calls: RefCell<Vec<Call>>,
    next_handle: Cell<usize>,
    pub fail_init: Cell<bool>,
    pub fail_config: Cell<bool>,
    pub fail_app: Cell<bool>,
    pub fail_surface: Cell<bool>,
    pub process_exited: Cell<bool>,
    selection: RefCell<Option<CString>>,
    runtime: Cell<Option<ffi::RuntimeConfig>>,
    /// Buffers of each live surface, re-read when the surface is freed
    live_buffers: RefCell<Vec<(RawSurface, [usize; 3])>>,
    /// Strings read back from the buffers at free time
    pub buffers_at_free: RefCell<Vec<[Option<String>; 3]>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            next_handle: Cell::new(0x1000),
            fail_init: Cell::new(false),
            fail_config: Cell::new(false),
            fail_app: Cell::new(false),
            fail_surface: Cell::new(false),
            process_exited: Cell::new(false),
            selection: RefCell::new(None),
            runtime: Cell::new(None),
            live_buffers: RefCell::new(Vec::new()),
            buffers_at_free: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn surface_calls(&self) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.is_surface_call())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn set_selection(&self, text: Option<&str>) {
        *self.selection.borrow_mut() = text.and_then(|t| CString::new(t).ok());
    }

    /// Runtime config captured by the last `app_new`
    pub fn runtime(&self) -> Option<ffi::RuntimeConfig> {
        self.runtime.get()
    }

    pub fn key_events(&self) -> Vec<KeyRecord> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Key(k) => Some(k.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn handle(&self) -> *mut c_void {
        let next = self.next_handle.get();
        self.next_handle.set(next + 0x10);
        next as *mut c_void
    }
}

unsafe fn opt_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

impl NativeEngine for FakeEngine {
    fn init(&self, args: &[CString]) -> c_int {
        self.record(Call::Init(
            args.iter().map(|a| a.to_string_lossy().into_owned()).collect(),
        ));
        if self.fail_init.get() {
            1
        } else {
            0
        }
    }

    fn config_new(&self) -> Option<RawConfig> {
        if self.fail_config.get() {
            return None;
        }
        let config = RawConfig::from_ptr(self.handle())?;
        self.record(Call::ConfigNew(config));
        Some(config)
    }

    fn config_load_default_files(&self, config: RawConfig) {
        self.record(Call::ConfigLoadDefault(config));
    }

    fn config_load_recursive_files(&self, config: RawConfig) {
        self.record(Call::ConfigLoadRecursive(config));
    }

    fn config_finalize(&self, config: RawConfig) {
        self.record(Call::ConfigFinalize(config));
    }

    fn config_free(&self, config: RawConfig) {
        self.record(Call::ConfigFree(config));
    }

    fn app_new(&self, runtime: &ffi::RuntimeConfig, _config: RawConfig) -> Option<RawApp> {
        self.record(Call::AppNew {
            supports_selection_clipboard: runtime.supports_selection_clipboard,
        });
        if self.fail_app.get() {
            return None;
        }
        self.runtime.set(Some(*runtime));
        RawApp::from_ptr(self.handle())
    }

    fn app_free(&self, app: RawApp) {
        self.record(Call::AppFree(app));
    }

    fn app_tick(&self, app: RawApp) {
        self.record(Call::AppTick(app));
    }

    fn app_set_focus(&self, app: RawApp, focused: bool) {
        self.record(Call::AppSetFocus(app, focused));
    }

    fn surface_new(&self, _app: RawApp, config: &ffi::SurfaceConfig) -> Option<RawSurface> {
        let surface = if self.fail_surface.get() {
            None
        } else {
            RawSurface::from_ptr(self.handle())
        };
        let buffer_ptrs = [
            config.working_directory as usize,
            config.command as usize,
            config.initial_input as usize,
        ];
        // SAFETY: the surface config strings are valid for this call.
        let record = unsafe {
            SurfaceNewRecord {
                surface,
                platform_tag: config.platform_tag,
                view: config.platform.macos.nsview as usize,
                userdata: config.userdata as usize,
                scale_factor: config.scale_factor,
                font_size: config.font_size,
                working_directory: opt_string(config.working_directory),
                command: opt_string(config.command),
                initial_input: opt_string(config.initial_input),
                wait_after_command: config.wait_after_command,
                context: config.context,
                buffer_ptrs,
            }
        };
        self.record(Call::SurfaceNew(record));
        if let Some(surface) = surface {
            self.live_buffers.borrow_mut().push((surface, buffer_ptrs));
        }
        surface
    }

    fn surface_free(&self, surface: RawSurface) {
        self.record(Call::SurfaceFree(surface));
        let mut live = self.live_buffers.borrow_mut();
        if let Some(pos) = live.iter().position(|(s, _)| *s == surface) {
            let (_, ptrs) = live.remove(pos);
            // SAFETY: the owning surface must keep its buffers alive until
            // after the native handle is freed; this read checks exactly that.
            let strings = unsafe {
                [
                    opt_string(ptrs[0] as *const c_char),
                    opt_string(ptrs[1] as *const c_char),
                    opt_string(ptrs[2] as *const c_char),
                ]
            };
            self.buffers_at_free.borrow_mut().push(strings);
        }
    }

    fn surface_key(&self, surface: RawSurface, event: ffi::InputKey) -> bool {
        // SAFETY: the key text is valid for this call.
        let text = unsafe { opt_string(event.text) };
        self.record(Call::Key(KeyRecord {
            surface,
            action: event.action,
            mods: event.mods,
            consumed_mods: event.consumed_mods,
            keycode: event.keycode,
            text,
            unshifted_codepoint: event.unshifted_codepoint,
        }));
        true
    }

    fn surface_text(&self, surface: RawSurface, text: &[u8]) {
        self.record(Call::Text(
            surface,
            String::from_utf8_lossy(text).into_owned(),
        ));
    }

    fn surface_mouse_pos(&self, surface: RawSurface, x: f64, y: f64, mods: c_int) {
        self.record(Call::MousePos(surface, x, y, mods));
    }

    fn surface_mouse_button(
        &self,
        surface: RawSurface,
        state: c_int,
        button: c_int,
        mods: c_int,
    ) -> bool {
        self.record(Call::MouseButton(surface, state, button, mods));
        true
    }

    fn surface_mouse_scroll(
        &self,
        surface: RawSurface,
        dx: f64,
        dy: f64,
        mods: ffi::ghostty_input_scroll_mods_t,
    ) {
        self.record(Call::MouseScroll(surface, dx, dy, mods));
    }

    fn surface_read_selection(&self, surface: RawSurface, out: &mut ffi::Text) -> bool {
        self.record(Call::ReadSelection(surface));
        match self.selection.borrow().as_ref() {
            Some(text) => {
                out.text = text.as_ptr();
                out.text_len = text.as_bytes().len();
                true
            }
            None => false,
        }
    }

    fn surface_free_text(&self, surface: RawSurface, text: &mut ffi::Text) {
        self.record(Call::FreeText(surface));
        text.text = std::ptr::null();
        text.text_len = 0;
    }

    fn surface_has_selection(&self, surface: RawSurface) -> bool {
        self.record(Call::HasSelection(surface));
        self.selection.borrow().is_some()
    }

    fn surface_set_focus(&self, surface: RawSurface, focused: bool) {
        self.record(Call::SetFocus(surface, focused));
    }

    fn surface_set_content_scale(&self, surface: RawSurface, x: f64, y: f64) {
        self.record(Call::SetContentScale(surface, x, y));
    }

    fn surface_set_size(&self, surface: RawSurface, width: u32, height: u32) {
        self.record(Call::SetSize(surface, width, height));
    }

    fn surface_process_exited(&self, surface: RawSurface) -> bool {
        self.record(Call::ProcessExited(surface));
        self.process_exited.get()
    }

    fn surface_complete_clipboard_request(
        &self,
        surface: RawSurface,
        content: &CStr,
        state: *mut c_void,
        confirmed: bool,
    ) {
        self.record(Call::CompleteClipboard {
            surface,
            content: content.to_string_lossy().into_owned(),
            state: state as usize,
            confirmed,
        });
    }
}

/// Dispatcher that records scheduled work instead of running it
#[derive(Default)]
pub struct RecordingDispatcher {
    tasks: Mutex<Vec<(MainTask, ThreadId)>>,
}

impl RecordingDispatcher {
    pub fn tasks(&self) -> Vec<(MainTask, ThreadId)> {
        self.tasks.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

impl MainDispatcher for RecordingDispatcher {
    fn dispatch(&self, task: MainTask) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push((task, thread::current().id()));
        }
    }
}
