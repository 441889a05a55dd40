//! Configuration section types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::clipboard::FormatTag;
use crate::encoding::EncodingChoice;
use crate::platform::CodePages;

/// Encoding configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Encoding used when no switch forces one
    pub default: EncodingChoice,

    /// Replacement for the system ANSI code page
    pub ansi_code_page: Option<u32>,

    /// Replacement for the system OEM code page
    pub oem_code_page: Option<u32>,

    /// Replacement for the console code page
    pub console_code_page: Option<u32>,
}

impl EncodingConfig {
    /// Apply the code page replacements to the system values
    pub fn apply(&self, system: CodePages) -> CodePages {
        CodePages {
            ansi: self.ansi_code_page.unwrap_or(system.ansi),
            oem: self.oem_code_page.unwrap_or(system.oem),
            console: self.console_code_page.unwrap_or(system.console),
        }
    }

    /// Configured code pages, with their key names
    pub fn code_page_overrides(&self) -> impl Iterator<Item = (&'static str, u32)> {
        [
            ("ansi_code_page", self.ansi_code_page),
            ("oem_code_page", self.oem_code_page),
            ("console_code_page", self.console_code_page),
        ]
        .into_iter()
        .filter_map(|(key, cp)| cp.map(|cp| (key, cp)))
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Clipboard format ("text", "html", "rtf")
    pub format: FormatTag,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Log format ("compact", "pretty", "json")
    pub format: String,

    /// Also write logs to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            file: None,
        }
    }
}
