//! Engine handle
//!
//! Owns the process-wide engine: the native app, its finalized configuration
//! and the app-level callback table. Surfaces are created through it.

use std::cell::{Cell, RefCell};
use std::ffi::CString;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use super::callbacks::AppCallbacks;
use super::dispatch::MainDispatcher;
use super::native::{NativeEngine, OwnedApp, OwnedConfig, RawApp};
use crate::config::Config;
use crate::host::clipboard::Pasteboard;
use crate::surface::{RenderTarget, SharedSurface, Surface, SurfaceConfig};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine initialization failed with code {0}")]
    Init(i32),

    #[error("Failed to create engine configuration")]
    ConfigCreation,

    #[error("Failed to create engine app")]
    AppCreation,

    #[error("Failed to create surface")]
    SurfaceCreation,

    #[error("Engine is not ready")]
    NotReady,
}

/// Engine lifecycle state. `Ready` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
    Error,
}

/// Engine-wide settings, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Process arguments handed to native init
    pub args: Vec<String>,
    pub load_recursive_files: bool,
    pub supports_selection_clipboard: bool,
    /// Font size for surfaces whose config leaves it unset
    pub default_font_size: f32,
    pub default_wait_after_command: bool,
    pub default_title: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            args: std::env::args().collect(),
            load_recursive_files: config.engine.load_recursive_files,
            supports_selection_clipboard: config.engine.supports_selection_clipboard,
            default_font_size: config.surface.font_size,
            default_wait_after_command: config.surface.wait_after_command,
            default_title: config.surface.title.clone(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// Host services the engine needs
pub struct HostServices {
    /// Queue onto the host's main thread
    pub dispatcher: Arc<dyn MainDispatcher>,
    pub pasteboard: Rc<dyn Pasteboard>,
    /// Whether the host application is active at startup
    pub app_active: bool,
}

/// A live native app together with what it borrows.
///
/// Field order is drop order: the app goes first, then the configuration it
/// was built from, then the callback context its table points at.
pub(crate) struct EngineCore {
    app: OwnedApp,
    _config: OwnedConfig,
    _callbacks: Box<AppCallbacks>,
}

impl EngineCore {
    pub(crate) fn app(&self) -> RawApp {
        self.app.raw()
    }
}

/// Handle to the embedded engine.
///
/// Created in the `Loading` state; [`EngineHandle::initialize`] moves it to
/// `Ready` or `Error` exactly once. Surfaces keep the native app alive, so it
/// is released once the handle and every surface created from it are gone.
pub struct EngineHandle {
    shared_surface: RefCell<Weak<RefCell<Surface>>>,
    core: OnceCell<Rc<EngineCore>>,
    native: Rc<dyn NativeEngine>,
    dispatcher: Arc<dyn MainDispatcher>,
    pasteboard: Rc<dyn Pasteboard>,
    settings: EngineSettings,
    readiness: Cell<Readiness>,
    app_active: Cell<bool>,
}

impl EngineHandle {
    pub fn new(native: Rc<dyn NativeEngine>, host: HostServices, settings: EngineSettings) -> Self {
        Self {
            shared_surface: RefCell::new(Weak::new()),
            core: OnceCell::new(),
            native,
            dispatcher: host.dispatcher,
            pasteboard: host.pasteboard,
            settings,
            readiness: Cell::new(Readiness::Loading),
            app_active: Cell::new(host.app_active),
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.get()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Bring the engine up. Only the first call does any work.
    pub fn initialize(&self) -> Readiness {
        if self.readiness.get() != Readiness::Loading {
            return self.readiness.get();
        }

        match self.bring_up() {
            Ok(core) => {
                // Cannot already be set: bring_up only runs while Loading.
                let _ = self.core.set(Rc::new(core));
                self.readiness.set(Readiness::Ready);
                info!("Engine ready");
            }
            Err(e) => {
                error!("Engine unavailable: {}", e);
                self.readiness.set(Readiness::Error);
            }
        }
        self.readiness.get()
    }

    fn bring_up(&self) -> Result<EngineCore, EngineError> {
        let args: Vec<CString> = self
            .settings
            .args
            .iter()
            .filter_map(|a| CString::new(a.as_str()).ok())
            .collect();
        let code = self.native.init(&args);
        if code != 0 {
            return Err(EngineError::Init(code));
        }

        let raw_config = self
            .native
            .config_new()
            .ok_or(EngineError::ConfigCreation)?;
        let config = OwnedConfig::new(self.native.clone(), raw_config);
        self.native.config_load_default_files(raw_config);
        if self.settings.load_recursive_files {
            self.native.config_load_recursive_files(raw_config);
        }
        self.native.config_finalize(raw_config);
        debug!("Engine configuration loaded");

        let callbacks = Box::new(AppCallbacks::new(self.dispatcher.clone()));
        let runtime = callbacks.runtime_config(self.settings.supports_selection_clipboard);
        let raw_app = self
            .native
            .app_new(&runtime, raw_config)
            .ok_or(EngineError::AppCreation)?;
        let app = OwnedApp::new(self.native.clone(), raw_app);

        self.native.app_set_focus(raw_app, self.app_active.get());

        Ok(EngineCore {
            app,
            _config: config,
            _callbacks: callbacks,
        })
    }

    /// Drive one engine processing iteration. Main thread only.
    pub fn tick(&self) {
        match self.core.get() {
            Some(core) => self.native.app_tick(core.app()),
            None => trace!("tick without a live engine ignored"),
        }
    }

    /// Forward host application activation changes
    pub fn set_app_focus(&self, focused: bool) {
        self.app_active.set(focused);
        if let Some(core) = self.core.get() {
            self.native.app_set_focus(core.app(), focused);
        }
    }

    /// A surface config carrying the configured defaults
    pub fn default_surface_config(&self) -> SurfaceConfig {
        SurfaceConfig::new().wait_after_command(self.settings.default_wait_after_command)
    }

    /// Create a surface.
    ///
    /// Always returns a surface; when the engine is unavailable it is
    /// unhealthy and every operation on it is a no-op.
    pub fn create_surface(&self, config: &SurfaceConfig, target: RenderTarget) -> Surface {
        if self.readiness.get() == Readiness::Loading {
            self.initialize();
        }
        Surface::new(
            self.native.clone(),
            self.core.get().cloned(),
            self.pasteboard.clone(),
            config,
            target,
            &self.settings,
        )
    }

    /// Like [`EngineHandle::create_surface`], but reports failure instead of
    /// returning an unhealthy surface
    pub fn try_create_surface(
        &self,
        config: &SurfaceConfig,
        target: RenderTarget,
    ) -> Result<Surface, EngineError> {
        let surface = self.create_surface(config, target);
        if self.readiness.get() != Readiness::Ready {
            return Err(EngineError::NotReady);
        }
        if !surface.is_healthy() {
            return Err(EngineError::SurfaceCreation);
        }
        Ok(surface)
    }

    /// The cached shared surface, creating it if no one holds it anymore
    pub fn get_or_create_surface(
        &self,
        config: &SurfaceConfig,
        target: RenderTarget,
    ) -> SharedSurface {
        if let Some(surface) = self.shared_surface.borrow().upgrade() {
            return surface;
        }
        let surface = self.create_surface(config, target).into_shared();
        *self.shared_surface.borrow_mut() = Rc::downgrade(&surface);
        surface
    }

    /// Forget the cached shared surface. A surface still held elsewhere
    /// stays alive.
    pub fn reset_shared_surface(&self) {
        *self.shared_surface.borrow_mut() = Weak::new();
    }

    pub fn shared_surface(&self) -> Option<SharedSurface> {
        self.shared_surface.borrow().upgrade()
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Some(core) = self.core.get() {
            let surfaces = Rc::strong_count(core) - 1;
            if surfaces > 0 {
                warn!("Engine handle dropped with {} live surface(s)", surfaces);
            }
        }
        debug!("Engine handle released");
    }
}

/// Init-once slot for the process-wide engine.
///
/// The first `get_or_init` constructs and initializes the handle; every
/// later call returns the same instance.
pub struct EngineCell {
    cell: OnceCell<Rc<EngineHandle>>,
}

impl EngineCell {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_init(&self, make: impl FnOnce() -> EngineHandle) -> Rc<EngineHandle> {
        self.cell
            .get_or_init(|| {
                let handle = make();
                handle.initialize();
                Rc::new(handle)
            })
            .clone()
    }

    pub fn get(&self) -> Option<Rc<EngineHandle>> {
        self.cell.get().cloned()
    }
}

impl Default for EngineCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::{Call, FakeEngine, RecordingDispatcher};
    use crate::engine::dispatch::MainTask;
    use crate::host::clipboard::MemoryPasteboard;
    use crate::host::event::{
        HostKeyEvent, HostMouseEvent, HostScrollEvent, ModifierFlags, MouseButton,
    };

    fn engine_with(fake: &Rc<FakeEngine>, app_active: bool) -> EngineHandle {
        let host = HostServices {
            dispatcher: Arc::new(RecordingDispatcher::default()),
            pasteboard: Rc::new(MemoryPasteboard::new()),
            app_active,
        };
        let settings = EngineSettings::default().with_args(vec!["ghostpane".to_string()]);
        EngineHandle::new(fake.clone(), host, settings)
    }

    #[test]
    fn test_initialize_ready() {
        let fake = Rc::new(FakeEngine::new());
        let engine = engine_with(&fake, true);
        assert_eq!(engine.readiness(), Readiness::Loading);
        assert_eq!(engine.initialize(), Readiness::Ready);

        let calls = fake.calls();
        assert_eq!(calls[0], Call::Init(vec!["ghostpane".to_string()]));
        assert!(matches!(calls[1], Call::ConfigNew(_)));
        assert!(matches!(calls[2], Call::ConfigLoadDefault(_)));
        assert!(matches!(calls[3], Call::ConfigLoadRecursive(_)));
        assert!(matches!(calls[4], Call::ConfigFinalize(_)));
        assert_eq!(
            calls[5],
            Call::AppNew {
                supports_selection_clipboard: false
            }
        );
        assert!(matches!(calls[6], Call::AppSetFocus(_, true)));
    }

    #[test]
    fn test_initialize_runs_once() {
        let fake = Rc::new(FakeEngine::new());
        let engine = engine_with(&fake, false);
        engine.initialize();
        engine.initialize();
        assert_eq!(fake.count(|c| matches!(c, Call::Init(_))), 1);
        assert_eq!(fake.count(|c| matches!(c, Call::AppNew { .. })), 1);
    }

    #[test]
    fn test_init_failure_is_terminal() {
        let fake = Rc::new(FakeEngine::new());
        fake.fail_init.set(true);
        let engine = engine_with(&fake, false);

        assert_eq!(engine.initialize(), Readiness::Error);
        // No partial engine: nothing past init was touched
        assert_eq!(fake.calls().len(), 1);

        fake.fail_init.set(false);
        assert_eq!(engine.initialize(), Readiness::Error);
        assert_eq!(fake.calls().len(), 1);
    }

    #[test]
    fn test_config_failure_sets_error() {
        let fake = Rc::new(FakeEngine::new());
        fake.fail_config.set(true);
        let engine = engine_with(&fake, false);
        assert_eq!(engine.initialize(), Readiness::Error);
        assert_eq!(fake.count(|c| matches!(c, Call::AppNew { .. })), 0);
    }

    #[test]
    fn test_app_failure_frees_config() {
        let fake = Rc::new(FakeEngine::new());
        fake.fail_app.set(true);
        let engine = engine_with(&fake, false);
        assert_eq!(engine.initialize(), Readiness::Error);
        assert_eq!(fake.count(|c| matches!(c, Call::ConfigFree(_))), 1);
    }

    #[test]
    fn test_recursive_files_optional() {
        let fake = Rc::new(FakeEngine::new());
        let host = HostServices {
            dispatcher: Arc::new(RecordingDispatcher::default()),
            pasteboard: Rc::new(MemoryPasteboard::new()),
            app_active: false,
        };
        let mut settings = EngineSettings::default();
        settings.load_recursive_files = false;
        settings.supports_selection_clipboard = true;
        let engine = EngineHandle::new(fake.clone(), host, settings);
        engine.initialize();

        assert_eq!(fake.count(|c| matches!(c, Call::ConfigLoadRecursive(_))), 0);
        assert_eq!(
            fake.count(|c| *c
                == Call::AppNew {
                    supports_selection_clipboard: true
                }),
            1
        );
    }

    #[test]
    fn test_tick_and_focus_forwarded() {
        let fake = Rc::new(FakeEngine::new());
        let engine = engine_with(&fake, false);
        engine.tick();
        assert_eq!(fake.count(|c| matches!(c, Call::AppTick(_))), 0);

        engine.initialize();
        engine.tick();
        engine.set_app_focus(true);
        assert_eq!(fake.count(|c| matches!(c, Call::AppTick(_))), 1);
        assert_eq!(fake.count(|c| matches!(c, Call::AppSetFocus(_, true))), 1);
    }

    #[test]
    fn test_wakeup_schedules_tick_without_running_it() {
        let fake = Rc::new(FakeEngine::new());
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let host = HostServices {
            dispatcher: dispatcher.clone(),
            pasteboard: Rc::new(MemoryPasteboard::new()),
            app_active: false,
        };
        let engine = EngineHandle::new(fake.clone(), host, EngineSettings::default());
        engine.initialize();

        let runtime = fake.runtime().unwrap();
        let userdata = runtime.userdata as usize;
        let wakeup_cb = runtime.wakeup_cb;
        std::thread::spawn(move || unsafe { wakeup_cb(userdata as *mut std::os::raw::c_void) })
        .join()
        .unwrap();

        assert_eq!(dispatcher.tasks().len(), 1);
        assert_eq!(dispatcher.tasks()[0].0, MainTask::Tick);
        assert_eq!(fake.count(|c| matches!(c, Call::AppTick(_))), 0);
    }

    #[test]
    fn test_engine_cell_returns_same_instance() {
        let fake = Rc::new(FakeEngine::new());
        let cell = EngineCell::new();
        let a = cell.get_or_init(|| engine_with(&fake, false));
        let b = cell.get_or_init(|| panic!("engine constructed twice"));

        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.readiness(), Readiness::Ready);
        assert_eq!(fake.count(|c| matches!(c, Call::Init(_))), 1);
        assert_eq!(fake.count(|c| matches!(c, Call::ConfigNew(_))), 1);
        assert_eq!(fake.count(|c| matches!(c, Call::AppNew { .. })), 1);
    }

    #[test]
    fn test_create_surface_initializes_lazily() {
        let fake = Rc::new(FakeEngine::new());
        let engine = engine_with(&fake, false);
        let surface = engine.create_surface(&SurfaceConfig::new(), RenderTarget::detached(2.0));
        assert_eq!(engine.readiness(), Readiness::Ready);
        assert!(surface.is_healthy());
    }

    #[test]
    fn test_degraded_engine_yields_unhealthy_surface() {
        let fake = Rc::new(FakeEngine::new());
        fake.fail_app.set(true);
        let engine = engine_with(&fake, false);
        engine.initialize();
        fake.clear_calls();

        let surface = engine.create_surface(&SurfaceConfig::new(), RenderTarget::detached(2.0));
        assert!(!surface.is_healthy());
        assert!(fake.surface_calls().is_empty());
    }

    #[test]
    fn test_surface_from_degraded_engine_ignores_input() {
        let fake = Rc::new(FakeEngine::new());
        fake.fail_app.set(true);
        let engine = engine_with(&fake, true);
        engine.initialize();
        assert_eq!(engine.readiness(), Readiness::Error);
        fake.clear_calls();

        let surface = engine.create_surface(&SurfaceConfig::new(), RenderTarget::detached(2.0));
        surface.send_text("ls");
        surface.send_command("pwd");
        assert_eq!(surface.selected_text(), "");
        assert!(!surface.has_selection());
        assert!(!surface.copy());
        assert!(!surface.process_running());

        let key = HostKeyEvent::new(0x00, ModifierFlags::empty()).with_characters("a", "a");
        assert!(!surface.key_down(&key));
        assert!(!surface.key_up(&key));
        assert!(!surface.flags_changed(&HostKeyEvent::new(0x38, ModifierFlags::SHIFT)));

        let click = HostMouseEvent::at(10.0, 10.0);
        surface.mouse_moved(&click);
        assert!(!surface.mouse_down(MouseButton::Left, &click));
        surface.scroll_wheel(&HostScrollEvent {
            delta_y: 3.0,
            ..HostScrollEvent::default()
        });

        assert!(fake.surface_calls().is_empty());
    }

    #[test]
    fn test_shared_surface_reused_until_reset() {
        let fake = Rc::new(FakeEngine::new());
        let engine = engine_with(&fake, false);
        let target = RenderTarget::detached(2.0);

        let a = engine.get_or_create_surface(&SurfaceConfig::new(), target);
        let b = engine.get_or_create_surface(&SurfaceConfig::new(), target);
        assert!(Rc::ptr_eq(&a, &b));

        engine.reset_shared_surface();
        assert!(engine.shared_surface().is_none());
        // The holder keeps the old surface alive
        assert!(a.borrow().is_healthy());
        assert_eq!(fake.count(|c| matches!(c, Call::SurfaceFree(_))), 0);

        let c = engine.get_or_create_surface(&SurfaceConfig::new(), target);
        assert!(!Rc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_shared_surface_released_with_last_holder() {
        let fake = Rc::new(FakeEngine::new());
        let engine = engine_with(&fake, false);
        let target = RenderTarget::detached(1.0);

        let a = engine.get_or_create_surface(&SurfaceConfig::new(), target);
        drop(a);
        assert!(engine.shared_surface().is_none());
        assert_eq!(fake.count(|c| matches!(c, Call::SurfaceFree(_))), 1);
    }

    #[test]
    fn test_teardown_frees_app_then_config() {
        let fake = Rc::new(FakeEngine::new());
        let engine = engine_with(&fake, false);
        engine.initialize();
        drop(engine);

        let calls = fake.calls();
        let app_free = calls.iter().position(|c| matches!(c, Call::AppFree(_)));
        let config_free = calls.iter().position(|c| matches!(c, Call::ConfigFree(_)));
        assert!(app_free.is_some());
        assert!(app_free < config_free);
    }

    #[test]
    fn test_app_outlives_surfaces() {
        let fake = Rc::new(FakeEngine::new());
        let engine = engine_with(&fake, false);
        let surface = engine.create_surface(&SurfaceConfig::new(), RenderTarget::detached(1.0));
        drop(engine);
        assert_eq!(fake.count(|c| matches!(c, Call::AppFree(_))), 0);

        drop(surface);
        let calls = fake.calls();
        let surface_free = calls.iter().position(|c| matches!(c, Call::SurfaceFree(_)));
        let app_free = calls.iter().position(|c| matches!(c, Call::AppFree(_)));
        assert!(surface_free.is_some());
        assert!(surface_free < app_free);
    }

    #[test]
    fn test_try_create_surface_reports_failures() {
        let fake = Rc::new(FakeEngine::new());
        let engine = engine_with(&fake, false);
        let target = RenderTarget::detached(1.0);
        assert!(engine.try_create_surface(&SurfaceConfig::new(), target).is_ok());

        fake.fail_surface.set(true);
        assert_eq!(
            engine.try_create_surface(&SurfaceConfig::new(), target).err(),
            Some(EngineError::SurfaceCreation)
        );

        let failed = Rc::new(FakeEngine::new());
        failed.fail_init.set(true);
        let engine = engine_with(&failed, false);
        assert_eq!(
            engine.try_create_surface(&SurfaceConfig::new(), target).err(),
            Some(EngineError::NotReady)
        );
    }
}
