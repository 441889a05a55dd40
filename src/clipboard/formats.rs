//! Clipboard format identifiers and the format tagger.
//!
//! Plain text goes to the clipboard as UTF-16. HTML and RTF are registered
//! formats carrying bytes: HTML gets the CF_HTML description header in
//! front of the document, RTF loses a leading UTF-8 BOM (Word refuses
//! the document otherwise).

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoding::{Bom, TextPayload};

// =============================================================================
// Format IDs
// =============================================================================

/// CF_UNICODETEXT - UTF-16LE text, NUL terminated
pub const CF_UNICODETEXT: u32 = 13;

/// Placeholder ID for "HTML Format". The real ID is assigned when the
/// backend registers the name.
pub const CF_HTML: u32 = 0xD010;

/// Placeholder ID for "Rich Text Format"
pub const CF_RTF: u32 = 0xD014;

/// Registered name of the HTML clipboard format
pub const HTML_FORMAT_NAME: &str = "HTML Format";

/// Registered name of the RTF clipboard format
pub const RTF_FORMAT_NAME: &str = "Rich Text Format";

// =============================================================================
// Clipboard Format
// =============================================================================

/// A clipboard format with ID and optional name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClipboardFormat {
    /// Windows clipboard format ID
    pub id: u32,

    /// Format name (for registered formats)
    pub name: Option<&'static str>,
}

impl ClipboardFormat {
    /// Create a standard clipboard format
    pub const fn new(id: u32) -> Self {
        Self { id, name: None }
    }

    /// Create a format that must be registered by name
    pub const fn with_name(id: u32, name: &'static str) -> Self {
        Self { id, name: Some(name) }
    }

    /// Create format for Unicode text
    pub const fn unicode_text() -> Self {
        Self::new(CF_UNICODETEXT)
    }

    /// Create format for HTML
    pub const fn html() -> Self {
        Self::with_name(CF_HTML, HTML_FORMAT_NAME)
    }

    /// Create format for RTF
    pub const fn rtf() -> Self {
        Self::with_name(CF_RTF, RTF_FORMAT_NAME)
    }

    /// Returns true if the backend has to register the format by name
    pub fn is_registered(&self) -> bool {
        self.name.is_some()
    }
}

impl fmt::Display for ClipboardFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "format {}", self.id),
        }
    }
}

/// The output format requested for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatTag {
    /// Unicode text
    #[default]
    #[serde(rename = "text")]
    PlainText,
    /// CF_HTML
    #[serde(rename = "html")]
    Html,
    /// Rich Text Format
    #[serde(rename = "rtf")]
    Rtf,
}

impl FormatTag {
    /// Clipboard format the tagged payload is stored under
    pub fn clipboard_format(&self) -> ClipboardFormat {
        match self {
            Self::PlainText => ClipboardFormat::unicode_text(),
            Self::Html => ClipboardFormat::html(),
            Self::Rtf => ClipboardFormat::rtf(),
        }
    }

    /// Returns true for the byte-oriented registered formats
    pub fn is_tagged(&self) -> bool {
        !matches!(self, Self::PlainText)
    }
}

// =============================================================================
// Tagger
// =============================================================================

/// Byte offsets written into the CF_HTML header.
///
/// All offsets count from the start of the header, so `start_html` equals
/// `header_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtmlOffsets {
    /// Length of the description header
    pub header_len: usize,
    /// Start of the HTML document
    pub start_html: usize,
    /// End of the HTML document
    pub end_html: usize,
    /// Start of the fragment (after the `<body ...>` tag)
    pub start_fragment: usize,
    /// End of the fragment (the `</body` tag)
    pub end_fragment: usize,
}

/// Metadata produced by [`tag`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagInfo {
    /// Nothing was changed
    Plain,
    /// A CF_HTML header was prepended
    Html(HtmlOffsets),
    /// RTF passthrough
    Rtf {
        /// A UTF-8 BOM was removed from the front
        bom_stripped: bool,
    },
}

/// A payload ready for the clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged {
    /// Data to store
    pub payload: TextPayload,
    /// Format to store it under
    pub format: ClipboardFormat,
    /// What the tagger did
    pub info: TagInfo,
}

/// Wrap `payload` for the clipboard format `format`.
///
/// Plain text passes through untouched. Tagged formats work on bytes: a
/// UTF-16 payload is converted to UTF-8 first, and NUL bytes become spaces
/// so the clipboard does not truncate the data. Never fails.
pub fn tag(payload: TextPayload, format: FormatTag) -> Tagged {
    let clipboard_format = format.clipboard_format();

    let (payload, info) = match format {
        FormatTag::PlainText => (payload, TagInfo::Plain),
        FormatTag::Html => {
            let (bytes, offsets) = wrap_html(tagged_bytes(payload));
            (TextPayload::Bytes(bytes), TagInfo::Html(offsets))
        }
        FormatTag::Rtf => {
            let mut bytes = tagged_bytes(payload);
            let bom_stripped = Bom::Utf8.matches(&bytes);
            if bom_stripped {
                bytes.drain(..Bom::Utf8.byte_len());
            }
            (TextPayload::Bytes(bytes), TagInfo::Rtf { bom_stripped })
        }
    };

    debug!(format = %clipboard_format, ?info, len = payload.len(), "Payload tagged");
    Tagged {
        payload,
        format: clipboard_format,
        info,
    }
}

fn tagged_bytes(payload: TextPayload) -> Vec<u8> {
    let mut bytes = match payload {
        TextPayload::Bytes(bytes) => bytes,
        TextPayload::Wide(units) => String::from_utf16_lossy(&units).into_bytes(),
    };
    for b in bytes.iter_mut().filter(|b| **b == 0) {
        *b = b' ';
    }
    bytes
}

// =============================================================================
// CF_HTML
// =============================================================================

/// First guess at the formatted header length
const HEADER_ESTIMATE: usize = 50;

/// Passes of the header length search before giving up on exact widths
const MAX_HEADER_PASSES: usize = 16;

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Fragment bounds inside an HTML document, relative to its first byte.
///
/// The fragment starts after the `>` closing the first `<body` tag (0 without
/// one) and ends at the first `</body` (document end without one). Matching
/// is case-sensitive.
pub fn fragment_bounds(document: &[u8]) -> (usize, usize) {
    let start = find(document, b"<body")
        .and_then(|body| {
            document[body..]
                .iter()
                .position(|&c| c == b'>')
                .map(|gt| body + gt + 1)
        })
        .unwrap_or(0);
    let end = find(document, b"</body").unwrap_or(document.len());
    (start, end)
}

fn format_header(head_len: usize, doc_len: usize, start: usize, end: usize, fixed_width: bool) -> String {
    if fixed_width {
        format!(
            "Version:0.9\r\n\
             StartHTML:{:08}\r\n\
             EndHTML:{:08}\r\n\
             StartFragment:{:08}\r\n\
             EndFragment:{:08}\r\n",
            head_len,
            head_len + doc_len,
            head_len + start,
            head_len + end
        )
    } else {
        format!(
            "Version:0.9\r\n\
             StartHTML:{}\r\n\
             EndHTML:{}\r\n\
             StartFragment:{}\r\n\
             EndFragment:{}\r\n",
            head_len,
            head_len + doc_len,
            head_len + start,
            head_len + end
        )
    }
}

/// Build the CF_HTML header for a document of `doc_len` bytes.
///
/// The header states its own length, so the length is searched for until
/// formatting with it yields the same length. Should that not settle, the
/// numbers are zero-padded to 8 digits, which fixes the length up front.
fn html_header(doc_len: usize, start: usize, end: usize) -> String {
    let mut head_len = HEADER_ESTIMATE;
    for _ in 0..MAX_HEADER_PASSES {
        let header = format_header(head_len, doc_len, start, end, false);
        if header.len() == head_len {
            return header;
        }
        head_len = header.len();
    }

    debug!("CF_HTML header length did not settle, using fixed-width fields");
    let head_len = format_header(0, doc_len, start, end, true).len();
    format_header(head_len, doc_len, start, end, true)
}

fn wrap_html(document: Vec<u8>) -> (Vec<u8>, HtmlOffsets) {
    let (start, end) = fragment_bounds(&document);
    let header = html_header(document.len(), start, end);
    let header_len = header.len();

    let offsets = HtmlOffsets {
        header_len,
        start_html: header_len,
        end_html: header_len + document.len(),
        start_fragment: header_len + start,
        end_fragment: header_len + end,
    };

    let mut out = Vec::with_capacity(header_len + document.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(&document);
    (out, offsets)
}

/// Parse a numeric header value from CF_HTML
///
/// Only the leading `Key:value` lines are looked at; the header ends at the
/// first line that is not UTF-8 or holds markup.
pub fn parse_header_value(data: &[u8], key: &str) -> Option<usize> {
    data.split(|&b| b == b'\n')
        .map_while(|line| std::str::from_utf8(line).ok())
        .take_while(|line| !line.contains('<'))
        .find_map(|line| line.strip_prefix(key))
        .and_then(|value| value.trim().parse().ok())
}

/// The HTML document inside CF_HTML data, located through `StartHTML`
pub fn cf_html_document(data: &[u8]) -> Option<&[u8]> {
    let start = parse_header_value(data, "StartHTML:")?;
    let end = parse_header_value(data, "EndHTML:").unwrap_or(data.len());
    if start > end || end > data.len() {
        return None;
    }
    Some(&data[start..end])
}
