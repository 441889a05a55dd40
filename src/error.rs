//! Error types for the stdin → clipboard pipeline.
//!
//! Every variant is terminal for the current invocation. The display text
//! always starts with a fixed context phrase followed by the underlying
//! error description, so the binary can print it as-is.

use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error types
#[derive(Error, Debug)]
pub enum Error {
    /// The input buffer could not grow
    #[error("Can't read all input. Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// Reading standard input failed
    #[error("Can't read all input. {0}")]
    Read(#[source] io::Error),

    /// The input is not valid in the selected encoding
    #[error("Can't convert the input to Unicode. Code page {code_page}: {reason}")]
    EncodingConversion {
        /// Code page the conversion was attempted with
        code_page: u32,
        /// What went wrong
        reason: String,
    },

    /// Another process or window owns the clipboard
    #[error("Could not open the clipboard. {0}")]
    ClipboardAcquisition(String),

    /// The clipboard was opened but could not be emptied or written
    #[error("Failed to write to the clipboard. {0}")]
    ClipboardWrite(String),
}

/// Error classification, mostly for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Reading or buffering the input
    Input,
    /// Decoding the input
    Encoding,
    /// Talking to the system clipboard
    Clipboard,
}

impl Error {
    /// Shorthand for an [`Error::EncodingConversion`]
    pub fn conversion(code_page: u32, reason: impl Into<String>) -> Self {
        Self::EncodingConversion {
            code_page,
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::OutOfMemory(_) | Self::Read(_) => ErrorType::Input,
            Self::EncodingConversion { .. } => ErrorType::Encoding,
            Self::ClipboardAcquisition(_) | Self::ClipboardWrite(_) => ErrorType::Clipboard,
        }
    }

    /// Returns true if the clipboard was involved when this error occurred
    pub fn touches_clipboard(&self) -> bool {
        self.error_type() == ErrorType::Clipboard
    }
}
