//! Engine callback router.
//!
//! The engine calls back through a fixed table of C function pointers, each
//! receiving the opaque userdata registered with it. App-level callbacks get
//! a pointer to [`AppCallbacks`]; surface-level callbacks get a pointer to the
//! surface's [`SurfaceCallbacks`]. Neither pointer holds a reference: the
//! owners free the native handle before releasing the context, so the engine
//! can never call back into a dead context.

use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::dispatch::{MainDispatcher, MainTask};
use super::ffi;
use super::native::{NativeEngine, RawSurface};
use crate::host::clipboard::Pasteboard;

const MIME_TEXT_PLAIN: &[u8] = b"text/plain";

/// Userdata for app-level callbacks
pub struct AppCallbacks {
    dispatcher: Arc<dyn MainDispatcher>,
}

impl AppCallbacks {
    pub fn new(dispatcher: Arc<dyn MainDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Build the runtime callback table pointing at `self`.
    ///
    /// `self` must stay at a stable address and outlive the app created
    /// with the returned table.
    pub fn runtime_config(&self, supports_selection_clipboard: bool) -> ffi::RuntimeConfig {
        ffi::RuntimeConfig {
            userdata: self as *const AppCallbacks as *mut c_void,
            supports_selection_clipboard,
            wakeup_cb: wakeup,
            action_cb: action,
            read_clipboard_cb: read_clipboard,
            confirm_read_clipboard_cb: confirm_read_clipboard,
            write_clipboard_cb: write_clipboard,
            close_surface_cb: close_surface,
        }
    }
}

/// Userdata for one surface's callbacks
pub struct SurfaceCallbacks {
    native: Rc<dyn NativeEngine>,
    pasteboard: Rc<dyn Pasteboard>,
    surface: Cell<Option<RawSurface>>,
    close_requested: Cell<bool>,
}

impl SurfaceCallbacks {
    pub fn new(native: Rc<dyn NativeEngine>, pasteboard: Rc<dyn Pasteboard>) -> Self {
        Self {
            native,
            pasteboard,
            surface: Cell::new(None),
            close_requested: Cell::new(false),
        }
    }

    /// Bind (or unbind, with `None`) the native surface requests complete on
    pub fn bind(&self, surface: Option<RawSurface>) {
        self.surface.set(surface);
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested.get()
    }

    /// Userdata pointer for this context
    pub fn userdata(self: &Rc<Self>) -> *mut c_void {
        Rc::as_ptr(self) as *mut c_void
    }

    fn complete_request(&self, content: &str, state: *mut c_void, confirmed: bool) {
        let Some(surface) = self.surface.get() else {
            trace!("clipboard request for unbound surface ignored");
            return;
        };
        let content = match CString::new(content) {
            Ok(c) => c,
            Err(_) => CString::new(content.replace('\0', "")).unwrap_or_default(),
        };
        self.native
            .surface_complete_clipboard_request(surface, &content, state, confirmed);
    }

    fn read_clipboard(&self, location: c_int, state: *mut c_void) {
        let content = self.pasteboard.read_text().unwrap_or_default();
        debug!(
            "clipboard read (location {}): {} bytes",
            location,
            content.len()
        );
        self.complete_request(&content, state, false);
    }

    fn confirm_read_clipboard(&self, content: &str, state: *mut c_void, request: c_int) {
        debug!("clipboard read confirmed (request {})", request);
        self.complete_request(content, state, true);
    }

    fn write_clipboard(&self, items: &[ffi::ClipboardContent]) {
        let text = items.iter().find_map(|item| {
            if item.mime.is_null() || item.data.is_null() {
                return None;
            }
            // SAFETY: non-null entries are NUL-terminated strings owned by
            // the engine for the duration of the callback.
            let mime = unsafe { CStr::from_ptr(item.mime) };
            if mime.to_bytes() != MIME_TEXT_PLAIN {
                return None;
            }
            // SAFETY: as above.
            Some(unsafe { CStr::from_ptr(item.data) }.to_string_lossy().into_owned())
        });

        match text {
            Some(text) => {
                debug!("clipboard write: {} bytes", text.len());
                if let Err(e) = self.pasteboard.write_text(&text) {
                    warn!("clipboard write failed: {}", e);
                }
            }
            None => trace!("clipboard write without text/plain ignored"),
        }
    }

    fn close(&self, process_alive: bool) {
        info!("engine requested surface close (process alive: {})", process_alive);
        self.close_requested.set(true);
    }
}

unsafe fn app_context<'a>(userdata: *mut c_void) -> Option<&'a AppCallbacks> {
    (userdata as *const AppCallbacks).as_ref()
}

unsafe fn surface_context<'a>(userdata: *mut c_void) -> Option<&'a SurfaceCallbacks> {
    (userdata as *const SurfaceCallbacks).as_ref()
}

/// May run on any engine thread; only ever queues a tick.
unsafe extern "C" fn wakeup(userdata: *mut c_void) {
    if let Some(ctx) = app_context(userdata) {
        ctx.dispatcher.dispatch(MainTask::Tick);
    }
}

unsafe extern "C" fn action(
    _app: ffi::ghostty_app_t,
    target: ffi::ActionTarget,
    action: ffi::Action,
) -> bool {
    trace!("unhandled action {} (target {})", action.tag, target.tag);
    false
}

unsafe extern "C" fn read_clipboard(userdata: *mut c_void, location: c_int, state: *mut c_void) {
    if let Some(ctx) = surface_context(userdata) {
        ctx.read_clipboard(location, state);
    }
}

unsafe extern "C" fn confirm_read_clipboard(
    userdata: *mut c_void,
    content: *const c_char,
    state: *mut c_void,
    request: c_int,
) {
    let Some(ctx) = surface_context(userdata) else {
        return;
    };
    let content = if content.is_null() {
        String::new()
    } else {
        CStr::from_ptr(content).to_string_lossy().into_owned()
    };
    ctx.confirm_read_clipboard(&content, state, request);
}

unsafe extern "C" fn write_clipboard(
    userdata: *mut c_void,
    _location: c_int,
    content: *const ffi::ClipboardContent,
    len: usize,
    _confirm: bool,
) {
    let Some(ctx) = surface_context(userdata) else {
        return;
    };
    if content.is_null() || len == 0 {
        return;
    }
    ctx.write_clipboard(std::slice::from_raw_parts(content, len));
}

unsafe extern "C" fn close_surface(userdata: *mut c_void, process_alive: bool) {
    if let Some(ctx) = surface_context(userdata) {
        ctx.close(process_alive);
    }
}
