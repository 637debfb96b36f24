//! Embedded terminal engine.
//!
//! - **ffi**: C-compatible types and constants of the engine ABI
//! - **native**: the `NativeEngine` seam and owned native handles
//! - **ghostty**: `NativeEngine` over the linked `libghostty`
//! - **callbacks**: trampolines the engine calls back into
//! - **dispatch**: main-thread hand-off for engine wakeups
//! - **handle**: engine lifecycle and surface creation
//!
//! # Architecture
//!
//! ```text
//! EngineHandle
//! ├── NativeEngine (every native call goes through it)
//! └── EngineCore (once Ready)
//!     ├── OwnedApp
//!     ├── OwnedConfig
//!     └── AppCallbacks ── wakeup ──> MainDispatcher ──> tick
//! ```

pub mod callbacks;
pub mod dispatch;
pub mod ffi;
#[cfg(feature = "ghostty")]
pub mod ghostty;
pub mod handle;
pub mod native;

#[cfg(test)]
pub(crate) mod fake;

pub use dispatch::{main_queue, MainDispatcher, MainQueue, MainQueueReceiver, MainTask};
pub use handle::{EngineCell, EngineError, EngineHandle, EngineSettings, HostServices, Readiness};
pub use native::{NativeEngine, UnavailableEngine};
