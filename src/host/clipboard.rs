//! System clipboard access.

use std::cell::{Cell, RefCell};

use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ClipboardError {
    #[error("Failed to open clipboard: {0}")]
    Open(#[source] arboard::Error),

    #[error("Failed to write clipboard: {0}")]
    Write(#[source] arboard::Error),
}

/// The host's string pasteboard
pub trait Pasteboard {
    /// Current string content, `None` when the clipboard holds no string
    fn read_text(&self) -> Option<String>;

    /// Replace the clipboard contents with `text`
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// The general pasteboard, through `arboard`
#[derive(Debug, Default)]
pub struct SystemPasteboard;

impl Pasteboard for SystemPasteboard {
    fn read_text(&self) -> Option<String> {
        let mut clipboard = match arboard::Clipboard::new() {
            Ok(c) => c,
            Err(e) => {
                warn!("Clipboard unavailable: {}", e);
                return None;
            }
        };
        clipboard.get_text().ok()
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard = arboard::Clipboard::new().map_err(ClipboardError::Open)?;
        clipboard
            .set_text(text.to_string())
            .map_err(ClipboardError::Write)
    }
}

/// Process-local pasteboard for headless hosts and previews
#[derive(Debug, Default)]
pub struct MemoryPasteboard {
    content: RefCell<Option<String>>,
    writes: Cell<usize>,
}

impl MemoryPasteboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            content: RefCell::new(Some(text.to_string())),
            writes: Cell::new(0),
        }
    }

    /// Number of successful writes so far
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl Pasteboard for MemoryPasteboard {
    fn read_text(&self) -> Option<String> {
        self.content.borrow().clone()
    }

    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self.content.borrow_mut() = Some(text.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
