//! Host-side plumbing.
//!
//! What the surrounding application provides to surfaces:
//!
//! - **event**: geometry and the input events a host delivers
//! - **clipboard**: the system pasteboard behind a small trait
//! - **view**: the container that hosts a single surface

pub mod clipboard;
pub mod event;
pub mod view;

pub use clipboard::{MemoryPasteboard, Pasteboard, SystemPasteboard};
pub use view::{HostId, SurfaceHost};
