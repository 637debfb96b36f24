//! Terminal surfaces.
//!
//! A [`Surface`] is one terminal pane backed by a native engine surface. It
//! translates host input into engine calls and keeps the engine's view of
//! size, scale and focus in sync with the host.
//!
//! - **config**: `SurfaceConfig`, `RenderTarget` and the owned C buffers
//! - **keys**: keyboard and modifier translation
//! - **mouse**: button, position and scroll translation
//!
//! # Ownership
//!
//! ```text
//! Surface
//! ├── OwnedSurface      (freed first)
//! ├── SurfaceCallbacks  (callback userdata, outlives the native surface)
//! ├── SurfaceBuffers    (C strings the native surface was created with)
//! └── EngineCore        (keeps the native app alive)
//! ```
//!
//! When creation fails the surface is unhealthy: it has no native handle and
//! every operation returns a neutral value without calling the engine.

pub mod config;
pub mod keys;
pub mod mouse;

use std::cell::RefCell;
use std::ffi::CString;
use std::ptr;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info, trace, warn};

use crate::engine::callbacks::SurfaceCallbacks;
use crate::engine::ffi;
use crate::engine::handle::{EngineCore, EngineSettings};
use crate::engine::native::{NativeEngine, OwnedSurface, RawSurface};
use crate::host::clipboard::Pasteboard;
use crate::host::event::{
    HostKeyEvent, HostMouseEvent, HostScrollEvent, MouseButton, Rect, Size,
};
use crate::host::view::{HostId, HostLink};

pub use config::{Platform, RenderTarget, SurfaceBuffers, SurfaceConfig};
pub use keys::{KeyAction, KeyInput, Mods};

/// Unique identifier for a surface
pub type SurfaceId = u64;

/// A surface shared between its host container and other holders
pub type SharedSurface = Rc<RefCell<Surface>>;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Device-pixel framebuffer size for logical `size` at `scale`, never 0
pub fn framebuffer_size(size: Size, scale: f64) -> (u32, u32) {
    fn scaled(v: f64, scale: f64) -> u32 {
        let px = (v * scale).round();
        if px.is_nan() || px < 1.0 {
            1
        } else if px >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            px as u32
        }
    }
    (scaled(size.width, scale), scaled(size.height, scale))
}

/// One terminal pane
pub struct Surface {
    id: SurfaceId,
    // Field order is drop order: the native surface must be gone before the
    // callback context and buffers it points at, and before the app.
    native_surface: Option<OwnedSurface>,
    callbacks: Rc<SurfaceCallbacks>,
    buffers: SurfaceBuffers,
    _core: Option<Rc<EngineCore>>,
    native: Rc<dyn NativeEngine>,
    pasteboard: Rc<dyn Pasteboard>,
    title: String,
    focused: bool,
    scale_factor: f64,
    frame: Rect,
    tracking_area: Option<Rect>,
    framebuffer: Option<(u32, u32)>,
    superview: Option<HostLink>,
}

impl Surface {
    pub(crate) fn new(
        native: Rc<dyn NativeEngine>,
        core: Option<Rc<EngineCore>>,
        pasteboard: Rc<dyn Pasteboard>,
        config: &SurfaceConfig,
        target: RenderTarget,
        settings: &EngineSettings,
    ) -> Self {
        let id = NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed);
        let callbacks = Rc::new(SurfaceCallbacks::new(native.clone(), pasteboard.clone()));
        let buffers = SurfaceBuffers::from_config(config);

        let native_surface = match core.as_ref() {
            Some(core) => {
                let raw_config = ffi::SurfaceConfig {
                    platform_tag: target.platform_tag(),
                    platform: target.ffi_platform(),
                    userdata: callbacks.userdata(),
                    scale_factor: target.scale_factor,
                    font_size: config.font_size.unwrap_or(settings.default_font_size),
                    working_directory: buffers.working_directory(),
                    command: buffers.command(),
                    initial_input: buffers.initial_input(),
                    wait_after_command: config.wait_after_command,
                    context: ffi::SURFACE_CONTEXT_WINDOW,
                };
                match native.surface_new(core.app(), &raw_config) {
                    Some(raw) => {
                        info!("Surface {} created", id);
                        callbacks.bind(Some(raw));
                        Some(OwnedSurface::new(native.clone(), raw))
                    }
                    None => {
                        error!("Surface {} creation failed", id);
                        None
                    }
                }
            }
            None => {
                warn!("Surface {} created without a live engine", id);
                None
            }
        };

        Self {
            id,
            native_surface,
            callbacks,
            buffers,
            _core: core,
            native,
            pasteboard,
            title: settings.default_title.clone(),
            focused: false,
            scale_factor: target.scale_factor,
            frame: Rect::default(),
            tracking_area: None,
            framebuffer: None,
            superview: None,
        }
    }

    pub fn into_shared(self) -> SharedSurface {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Whether the native surface exists
    pub fn is_healthy(&self) -> bool {
        self.native_surface.is_some()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Whether the surface's child process is still running
    pub fn process_running(&self) -> bool {
        match self.raw() {
            Some(raw) => !self.native.surface_process_exited(raw),
            None => false,
        }
    }

    /// The engine asked for this surface to be closed
    pub fn close_requested(&self) -> bool {
        self.callbacks.close_requested()
    }

    /// The container currently hosting this surface
    pub fn superview(&self) -> Option<HostId> {
        self.superview.as_ref().map(|link| link.id)
    }

    pub(crate) fn set_superview(&mut self, host: Option<HostLink>) {
        self.superview = host;
    }

    pub(crate) fn take_superview(&mut self) -> Option<HostLink> {
        self.superview.take()
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Last framebuffer size pushed to the engine
    pub fn framebuffer(&self) -> Option<(u32, u32)> {
        self.framebuffer
    }

    /// Region mouse motion is tracked in, reinstalled on every layout
    pub fn tracking_area(&self) -> Option<Rect> {
        self.tracking_area
    }

    pub fn buffers(&self) -> &SurfaceBuffers {
        &self.buffers
    }

    fn raw(&self) -> Option<RawSurface> {
        let raw = self.native_surface.as_ref().map(OwnedSurface::raw);
        if raw.is_none() {
            trace!("surface {} is inert, call ignored", self.id);
        }
        raw
    }

    // Text

    /// Push UTF-8 text into the terminal as if typed
    pub fn send_text(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(raw) = self.raw() {
            self.native.surface_text(raw, text.as_bytes());
        }
    }

    /// Push text followed by a newline
    pub fn send_command(&self, command: &str) {
        self.send_text(&format!("{}\n", command));
    }

    /// Current selection, or an empty string
    pub fn selected_text(&self) -> String {
        let Some(raw) = self.raw() else {
            return String::new();
        };
        let mut text = ffi::Text::default();
        if !self.native.surface_read_selection(raw, &mut text) {
            return String::new();
        }

        let selected = if text.text.is_null() || text.text_len == 0 {
            String::new()
        } else {
            // SAFETY: the engine filled `text` with `text_len` valid bytes
            // that stay alive until `surface_free_text`.
            let bytes = unsafe { std::slice::from_raw_parts(text.text.cast::<u8>(), text.text_len) };
            String::from_utf8_lossy(bytes).into_owned()
        };
        self.native.surface_free_text(raw, &mut text);
        selected
    }

    pub fn has_selection(&self) -> bool {
        match self.raw() {
            Some(raw) => self.native.surface_has_selection(raw),
            None => false,
        }
    }

    // Clipboard

    /// Copy the selection to the clipboard. Returns true if anything was copied.
    pub fn copy(&self) -> bool {
        let text = self.selected_text();
        if text.is_empty() {
            return false;
        }
        match self.pasteboard.write_text(&text) {
            Ok(()) => true,
            Err(e) => {
                warn!("Copy failed: {}", e);
                false
            }
        }
    }

    /// Paste the clipboard's string content, if any
    pub fn paste(&self) {
        if let Some(text) = self.pasteboard.read_text() {
            self.send_text(&text);
        }
    }

    /// The engine owns selection; the host does not impose one.
    pub fn select_all(&self) {}

    // Size

    /// Apply a new frame: reinstall mouse tracking and resize
    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
        self.layout();
    }

    /// Layout pass
    pub fn layout(&mut self) {
        self.tracking_area = Some(Rect::from_size(self.frame.size));
        self.push_size();
    }

    /// Logical size changed outside of layout
    pub fn update_size(&mut self, size: Size) {
        self.frame.size = size;
        self.push_size();
    }

    /// Backing scale changed (e.g. moved to another display)
    pub fn set_backing_scale(&mut self, scale: f64) {
        self.scale_factor = scale;
        if let Some(raw) = self.raw() {
            // Scale first: the framebuffer size depends on it
            self.native.surface_set_content_scale(raw, scale, scale);
        }
        self.push_size();
    }

    fn push_size(&mut self) {
        let size = framebuffer_size(self.frame.size, self.scale_factor);
        if self.framebuffer == Some(size) {
            return;
        }
        if let Some(raw) = self.raw() {
            self.native.surface_set_size(raw, size.0, size.1);
            self.framebuffer = Some(size);
        }
    }

    // Focus

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Give the engine focus without taking keyboard focus in the host
    pub fn focus(&mut self) {
        self.set_native_focus(true);
    }

    /// First-responder hooks; the engine's focus follows the view's
    pub fn become_first_responder(&mut self) -> bool {
        self.set_native_focus(true);
        true
    }

    pub fn resign_first_responder(&mut self) -> bool {
        self.set_native_focus(false);
        true
    }

    fn set_native_focus(&mut self, focused: bool) {
        self.focused = focused;
        if let Some(raw) = self.raw() {
            self.native.surface_set_focus(raw, focused);
        }
    }

    // Keyboard

    pub fn key_down(&self, event: &HostKeyEvent) -> bool {
        self.send_key(keys::translate(event, keys::key_down_action(event)))
    }

    pub fn key_up(&self, event: &HostKeyEvent) -> bool {
        self.send_key(keys::translate(event, KeyAction::Release))
    }

    /// A bare modifier key went down or up
    pub fn flags_changed(&self, event: &HostKeyEvent) -> bool {
        match keys::flags_changed(event) {
            Some(input) => self.send_key(input),
            None => false,
        }
    }

    fn send_key(&self, input: KeyInput) -> bool {
        let Some(raw) = self.raw() else {
            return false;
        };
        // Must outlive the native call below
        let text = input.text.as_deref().and_then(|t| CString::new(t).ok());
        let event = ffi::InputKey {
            action: input.action.code(),
            mods: input.mods.bits(),
            consumed_mods: input.consumed_mods.bits(),
            keycode: input.keycode,
            text: text.as_ref().map_or(ptr::null(), |t| t.as_ptr()),
            unshifted_codepoint: input.unshifted_codepoint,
            composing: false,
        };
        self.native.surface_key(raw, event)
    }

    // Mouse

    pub fn mouse_moved(&self, event: &HostMouseEvent) {
        self.send_mouse_pos(event);
    }

    pub fn mouse_dragged(&self, event: &HostMouseEvent) {
        self.send_mouse_pos(event);
    }

    pub fn mouse_down(&self, button: MouseButton, event: &HostMouseEvent) -> bool {
        self.send_mouse_button(ffi::MOUSE_PRESS, button, event)
    }

    pub fn mouse_up(&self, button: MouseButton, event: &HostMouseEvent) -> bool {
        self.send_mouse_button(ffi::MOUSE_RELEASE, button, event)
    }

    pub fn scroll_wheel(&self, event: &HostScrollEvent) {
        let Some(raw) = self.raw() else {
            return;
        };
        let pos = mouse::flip(event.location, self.frame.size.height);
        let mods = Mods::from(event.modifier_flags).bits();
        self.native.surface_mouse_pos(raw, pos.x, pos.y, mods);
        let (dx, dy, scroll_mods) = mouse::scroll(event);
        self.native.surface_mouse_scroll(raw, dx, dy, scroll_mods);
    }

    fn send_mouse_pos(&self, event: &HostMouseEvent) {
        if let Some(raw) = self.raw() {
            let pos = mouse::flip(event.location, self.frame.size.height);
            let mods = Mods::from(event.modifier_flags).bits();
            self.native.surface_mouse_pos(raw, pos.x, pos.y, mods);
        }
    }

    fn send_mouse_button(&self, state: i32, button: MouseButton, event: &HostMouseEvent) -> bool {
        let Some(raw) = self.raw() else {
            return false;
        };
        self.send_mouse_pos(event);
        let mods = Mods::from(event.modifier_flags).bits();
        self.native
            .surface_mouse_button(raw, state, mouse::button_code(button), mods)
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.callbacks.bind(None);
        if self.native_surface.take().is_some() {
            debug!("Surface {} released", self.id);
        }
    }
}
