//! Surface configuration and the native buffers derived from it.

use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;

use tracing::warn;

use crate::engine::ffi;

/// What a new surface should run and how it should look.
///
/// Consumed by surface creation; the surface keeps its own copies of the
/// strings for as long as the native surface lives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceConfig {
    /// Font size in points; the configured default when `None`
    pub font_size: Option<f32>,
    pub working_directory: Option<String>,
    /// Command to run instead of the login shell
    pub command: Option<String>,
    /// Text typed into the terminal once it starts
    pub initial_input: Option<String>,
    /// Keep the surface open after the command exits
    pub wait_after_command: bool,
}

impl SurfaceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn initial_input(mut self, input: impl Into<String>) -> Self {
        self.initial_input = Some(input.into());
        self
    }

    pub fn wait_after_command(mut self, wait: bool) -> Self {
        self.wait_after_command = wait;
        self
    }
}

/// Platforms the engine can render into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Ios,
}

/// The native view a surface renders into, and its backing scale.
///
/// The view pointer is handed to the engine as-is; the host keeps the view
/// alive for at least as long as the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    pub platform: Platform,
    pub view: *mut c_void,
    pub scale_factor: f64,
}

impl RenderTarget {
    /// An `NSView*`
    pub fn macos(nsview: *mut c_void, scale_factor: f64) -> Self {
        Self {
            platform: Platform::MacOs,
            view: nsview,
            scale_factor,
        }
    }

    /// A `UIView*`
    pub fn ios(uiview: *mut c_void, scale_factor: f64) -> Self {
        Self {
            platform: Platform::Ios,
            view: uiview,
            scale_factor,
        }
    }

    /// No view yet; for surfaces preallocated before their host exists
    pub fn detached(scale_factor: f64) -> Self {
        Self::macos(ptr::null_mut(), scale_factor)
    }

    pub(crate) fn platform_tag(&self) -> c_int {
        match self.platform {
            Platform::MacOs => ffi::PLATFORM_MACOS,
            Platform::Ios => ffi::PLATFORM_IOS,
        }
    }

    pub(crate) fn ffi_platform(&self) -> ffi::Platform {
        match self.platform {
            Platform::MacOs => ffi::Platform {
                macos: ffi::PlatformMacos { nsview: self.view },
            },
            Platform::Ios => ffi::Platform {
                ios: ffi::PlatformIos { uiview: self.view },
            },
        }
    }
}

/// NUL-terminated copies of the configuration strings.
///
/// Each buffer is owned here and freed exactly once when this value drops;
/// the owning surface drops it only after the native surface is gone.
#[derive(Debug, Default)]
pub struct SurfaceBuffers {
    working_directory: Option<CString>,
    command: Option<CString>,
    initial_input: Option<CString>,
}

impl SurfaceBuffers {
    pub fn from_config(config: &SurfaceConfig) -> Self {
        Self {
            working_directory: to_c_string("working_directory", &config.working_directory),
            command: to_c_string("command", &config.command),
            initial_input: to_c_string("initial_input", &config.initial_input),
        }
    }

    pub fn working_directory(&self) -> *const c_char {
        as_ptr(&self.working_directory)
    }

    pub fn command(&self) -> *const c_char {
        as_ptr(&self.command)
    }

    pub fn initial_input(&self) -> *const c_char {
        as_ptr(&self.initial_input)
    }
}

fn to_c_string(field: &str, value: &Option<String>) -> Option<CString> {
    let value = value.as_ref()?;
    match CString::new(value.as_str()) {
        Ok(c) => Some(c),
        Err(_) => {
            warn!("Surface {} contains a NUL byte, ignoring it", field);
            None
        }
    }
}

fn as_ptr(buffer: &Option<CString>) -> *const c_char {
    buffer.as_ref().map_or(ptr::null(), |c| c.as_ptr())
}
