//! ghostpane - embeddable terminal surfaces over a native Ghostty engine
//!
//! ghostpane wraps the engine's C ABI: it brings the engine up once per
//! process, creates terminal surfaces that render into host views, and
//! forwards keyboard, mouse, focus, size and clipboard traffic between the
//! host and each surface.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! use ghostpane::config::Config;
//! use ghostpane::engine::{main_queue, EngineHandle, EngineSettings, HostServices, UnavailableEngine};
//! use ghostpane::host::SystemPasteboard;
//! use ghostpane::surface::{RenderTarget, SurfaceConfig};
//!
//! let (queue, receiver) = main_queue();
//! let host = HostServices {
//!     dispatcher: Arc::new(queue),
//!     pasteboard: Rc::new(SystemPasteboard),
//!     app_active: true,
//! };
//! let settings = EngineSettings::from_config(&Config::load());
//! let engine = EngineHandle::new(Rc::new(UnavailableEngine), host, settings);
//!
//! let surface = engine.create_surface(
//!     &SurfaceConfig::new().command("htop"),
//!     RenderTarget::detached(2.0),
//! );
//! surface.send_text("q");
//! receiver.drain(&engine);
//! ```
//!
//! When the engine cannot be brought up, surfaces are still created but are
//! unhealthy and ignore every operation.

pub mod config;
pub mod engine;
pub mod host;
pub mod surface;
