//! Clipboard output.
//!
//! # Architecture
//!
//! ```text
//! Tagged payload
//!   └─> ClipboardSink
//!         ├─> WindowsClipboard  (clipboard-win: open, empty, set, close)
//!         └─> ArboardClipboard  (arboard, everywhere else)
//! ```
//!
//! The pipeline only talks to [`ClipboardSink`]. A sink value owns the open
//! clipboard: creating one acquires it, dropping it releases it, whatever
//! happened in between.

pub mod formats;

#[cfg(windows)]
mod win32;
#[cfg(windows)]
pub use self::win32::WindowsClipboard as SystemClipboard;

#[cfg(not(windows))]
mod arboard_backend;
#[cfg(not(windows))]
pub use self::arboard_backend::ArboardClipboard as SystemClipboard;

pub use formats::{tag, ClipboardFormat, FormatTag, HtmlOffsets, TagInfo, Tagged};

use crate::error::Result;

/// Destination of the final buffer.
///
/// Each call replaces whatever the clipboard held before.
#[cfg_attr(test, mockall::automock)]
pub trait ClipboardSink {
    /// Store UTF-16 text (no terminator) as Unicode text
    fn set_text(&mut self, text: &[u16]) -> Result<()>;

    /// Store raw bytes under a registered format
    fn set_tagged(&mut self, format: &ClipboardFormat, data: &[u8]) -> Result<()>;
}

/// Open the system clipboard.
///
/// Fails with [`Error::ClipboardAcquisition`](crate::Error::ClipboardAcquisition)
/// when another process holds it.
pub fn open_system() -> Result<SystemClipboard> {
    SystemClipboard::open()
}
