//! Conversion of the input buffer to the clipboard's text representation.

use tracing::debug;

use super::{codepage, TextEncoding};
use crate::error::Result;

/// What goes to the tagger: UTF-16 text, or untouched bytes for tagged
/// formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPayload {
    /// UTF-16 code units, no terminator
    Wide(Vec<u16>),
    /// Raw input bytes
    Bytes(Vec<u8>),
}

impl TextPayload {
    /// Number of code units or bytes
    pub fn len(&self) -> usize {
        match self {
            Self::Wide(units) => units.len(),
            Self::Bytes(bytes) => bytes.len(),
        }
    }

    /// Returns true if there is nothing to place on the clipboard
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size in bytes
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Wide(units) => units.len() * 2,
            Self::Bytes(bytes) => bytes.len(),
        }
    }
}

/// Decode `bytes` as `encoding` into UTF-16.
///
/// A BOM belonging to `encoding` is not part of the text. NUL code units
/// become spaces, since the clipboard would otherwise cut the text at the
/// first one.
pub fn normalize(bytes: &[u8], encoding: TextEncoding) -> Result<TextPayload> {
    let body = match encoding.bom() {
        // The UTF-7 mark is removed after decoding
        Some(bom) if encoding != TextEncoding::Utf7 && bom.matches(bytes) => &bytes[bom.byte_len()..],
        _ => bytes,
    };

    if matches!(encoding, TextEncoding::Utf16Le | TextEncoding::Utf16Be) && body.len() % 2 == 1 {
        debug!("Dropping odd trailing byte of UTF-16 input");
    }

    let mut units = codepage::decode(body, encoding.code_page())?;

    if encoding == TextEncoding::Utf7 && units.first() == Some(&0xFEFF) {
        units.remove(0);
    }

    let mut nul_count = 0usize;
    for unit in units.iter_mut().filter(|u| **u == 0) {
        *unit = b' ' as u16;
        nul_count += 1;
    }
    if nul_count > 0 {
        debug!(nul_count, "Replaced NUL characters with spaces");
    }

    debug!(%encoding, units = units.len(), "Input converted to UTF-16");
    Ok(TextPayload::Wide(units))
}
