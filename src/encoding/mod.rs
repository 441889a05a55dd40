//! Text encoding detection and normalization.
//!
//! ```text
//! raw bytes ─> detect() ─> EncodingVerdict ─┐
//!                                           ├─> resolve(fallback) ─> TextEncoding ─> normalize() ─> UTF-16
//! user override (--ansi/--oem/...) ─────────┘
//! ```
//!
//! The detector only ever answers with what the bytes prove. Picking a legacy
//! code page for [`EncodingVerdict::Unknown`] is the caller's job, because it
//! depends on where the input came from.

pub mod codepage;
pub mod detect;
pub mod normalize;
pub mod utf7;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use detect::{detect, scan_bom, Bom, Detection, ScanStats};
pub use normalize::{normalize, TextPayload};

// =============================================================================
// Code page identifiers
// =============================================================================

/// UTF-16 little endian
pub const CP_UTF16LE: u32 = 1200;

/// UTF-16 big endian
pub const CP_UTF16BE: u32 = 1201;

/// UTF-7
pub const CP_UTF7: u32 = 65000;

/// UTF-8
pub const CP_UTF8: u32 = 65001;

// =============================================================================
// Verdict
// =============================================================================

/// What the detector concluded about a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingVerdict {
    /// No evidence of any UTF encoding
    Unknown,
    /// UTF-7 (BOM only)
    Utf7,
    /// UTF-8 (BOM, or valid multi-byte sequences)
    Utf8,
    /// UTF-16 little endian (BOM, or NUL bytes present)
    Utf16Le,
    /// UTF-16 big endian (BOM only)
    Utf16Be,
    /// A specific legacy code page
    LegacyCodePage(u32),
}

impl EncodingVerdict {
    /// Turn the verdict into a usable encoding, using `fallback_code_page`
    /// when nothing was detected
    pub fn resolve(self, fallback_code_page: u32) -> TextEncoding {
        match self {
            Self::Unknown => TextEncoding::from_code_page(fallback_code_page),
            Self::Utf7 => TextEncoding::Utf7,
            Self::Utf8 => TextEncoding::Utf8,
            Self::Utf16Le => TextEncoding::Utf16Le,
            Self::Utf16Be => TextEncoding::Utf16Be,
            Self::LegacyCodePage(cp) => TextEncoding::from_code_page(cp),
        }
    }

    /// Returns true if the bytes identified a UTF encoding
    pub fn is_unicode(&self) -> bool {
        matches!(self, Self::Utf7 | Self::Utf8 | Self::Utf16Le | Self::Utf16Be)
    }
}

impl fmt::Display for EncodingVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::LegacyCodePage(cp) => write!(f, "code page {cp}"),
            other => write!(f, "{}", other.resolve(0)),
        }
    }
}

// =============================================================================
// Resolved encoding
// =============================================================================

/// The encoding the normalizer decodes with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    /// UTF-7
    Utf7,
    /// UTF-8
    Utf8,
    /// UTF-16 little endian
    Utf16Le,
    /// UTF-16 big endian
    Utf16Be,
    /// Any other code page
    CodePage(u32),
}

impl TextEncoding {
    /// Map a Windows code page number, folding the Unicode ones into their
    /// dedicated variants
    pub fn from_code_page(code_page: u32) -> Self {
        match code_page {
            CP_UTF7 => Self::Utf7,
            CP_UTF8 => Self::Utf8,
            CP_UTF16LE => Self::Utf16Le,
            CP_UTF16BE => Self::Utf16Be,
            cp => Self::CodePage(cp),
        }
    }

    /// Windows code page number
    pub fn code_page(&self) -> u32 {
        match self {
            Self::Utf7 => CP_UTF7,
            Self::Utf8 => CP_UTF8,
            Self::Utf16Le => CP_UTF16LE,
            Self::Utf16Be => CP_UTF16BE,
            Self::CodePage(cp) => *cp,
        }
    }

    /// The byte-order mark belonging to this encoding, if it has one
    pub fn bom(&self) -> Option<Bom> {
        match self {
            Self::Utf7 => Some(Bom::Utf7),
            Self::Utf8 => Some(Bom::Utf8),
            Self::Utf16Le => Some(Bom::Utf16Le),
            Self::Utf16Be => Some(Bom::Utf16Be),
            Self::CodePage(_) => None,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf7 => f.write_str("UTF-7"),
            Self::Utf8 => f.write_str("UTF-8"),
            Self::Utf16Le => f.write_str("UTF-16LE"),
            Self::Utf16Be => f.write_str("UTF-16BE"),
            Self::CodePage(cp) => write!(f, "code page {cp}"),
        }
    }
}

// =============================================================================
// User choice
// =============================================================================

/// Encoding selection from the command line or config file.
///
/// Anything but `Auto` bypasses the detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingChoice {
    /// Detect from the bytes, fall back to the locale
    #[default]
    Auto,
    /// The system ANSI code page
    Ansi,
    /// The OEM (DOS) code page
    Oem,
    /// UTF-8
    Utf8,
    /// UTF-16 little endian
    Utf16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_unknown_uses_fallback() {
        assert_eq!(
            EncodingVerdict::Unknown.resolve(1252),
            TextEncoding::CodePage(1252)
        );
        assert_eq!(EncodingVerdict::Unknown.resolve(CP_UTF8), TextEncoding::Utf8);
    }

    #[test]
    fn test_resolve_detected_ignores_fallback() {
        assert_eq!(EncodingVerdict::Utf16Be.resolve(1252), TextEncoding::Utf16Be);
        assert_eq!(
            EncodingVerdict::LegacyCodePage(850).resolve(1252),
            TextEncoding::CodePage(850)
        );
    }

    #[test]
    fn test_code_page_roundtrip() {
        for cp in [CP_UTF7, CP_UTF8, CP_UTF16LE, CP_UTF16BE, 437, 1252] {
            assert_eq!(TextEncoding::from_code_page(cp).code_page(), cp);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(EncodingVerdict::Utf16Le.to_string(), "UTF-16LE");
        assert_eq!(EncodingVerdict::Unknown.to_string(), "unknown");
        assert_eq!(EncodingVerdict::LegacyCodePage(866).to_string(), "code page 866");
    }

    #[test]
    fn test_choice_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            choice: EncodingChoice,
        }
        let w: Wrapper = toml::from_str("choice = \"utf16\"").unwrap();
        assert_eq!(w.choice, EncodingChoice::Utf16);
    }
}
