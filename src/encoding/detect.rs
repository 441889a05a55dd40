//! Encoding detection from raw bytes.
//!
//! Two stages: a byte-order mark check, then (without a BOM) one heuristic
//! pass that counts NUL and non-ASCII bytes while validating UTF-8 framing.
//!
//! Known limitation: UTF-16 without a BOM is always reported as little
//! endian. Big endian is only recognized through its BOM.

use tracing::debug;

use super::EncodingVerdict;

/// A recognized byte-order mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bom {
    /// `EF BB BF`
    Utf8,
    /// `2B 2F 76` + one of `38 39 2B 2F`
    Utf7,
    /// `FF FE`
    Utf16Le,
    /// `FE FF`
    Utf16Be,
}

impl Bom {
    /// Length of the mark in bytes.
    ///
    /// The UTF-7 mark is never skipped as bytes: its fourth byte may carry
    /// bits of the next character, so the decoder drops the decoded U+FEFF.
    pub fn byte_len(&self) -> usize {
        match self {
            Self::Utf8 => 3,
            Self::Utf7 => 4,
            Self::Utf16Le | Self::Utf16Be => 2,
        }
    }

    /// Returns true if `bytes` start with this mark
    pub fn matches(&self, bytes: &[u8]) -> bool {
        match self {
            Self::Utf8 => bytes.starts_with(&[0xEF, 0xBB, 0xBF]),
            Self::Utf7 => {
                bytes.len() >= 4
                    && bytes.starts_with(b"+/v")
                    && matches!(bytes[3], b'8' | b'9' | b'+' | b'/')
            }
            Self::Utf16Le => bytes.starts_with(&[0xFF, 0xFE]),
            Self::Utf16Be => bytes.starts_with(&[0xFE, 0xFF]),
        }
    }

    /// The verdict a buffer starting with this mark gets
    pub fn verdict(&self) -> EncodingVerdict {
        match self {
            Self::Utf8 => EncodingVerdict::Utf8,
            Self::Utf7 => EncodingVerdict::Utf7,
            Self::Utf16Le => EncodingVerdict::Utf16Le,
            Self::Utf16Be => EncodingVerdict::Utf16Be,
        }
    }
}

/// Check order matters: none of these prefixes overlap today, but the
/// first match wins.
const BOM_SCAN_ORDER: [Bom; 4] = [Bom::Utf8, Bom::Utf7, Bom::Utf16Le, Bom::Utf16Be];

/// Find the byte-order mark at the start of `bytes`, if any
pub fn scan_bom(bytes: &[u8]) -> Option<Bom> {
    BOM_SCAN_ORDER.into_iter().find(|bom| bom.matches(bytes))
}

/// Counters gathered by the heuristic pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanStats {
    /// NUL bytes at even offsets
    pub even_nul: usize,
    /// NUL bytes at odd offsets
    pub odd_nul: usize,
    /// Bytes with the high bit set
    pub non_ascii: usize,
    /// The whole buffer is well-formed UTF-8
    pub valid_utf8: bool,
}

impl ScanStats {
    /// Total NUL bytes
    pub fn nul(&self) -> usize {
        self.even_nul + self.odd_nul
    }

    fn verdict(&self) -> EncodingVerdict {
        if self.nul() > 0 {
            EncodingVerdict::Utf16Le
        } else if self.non_ascii > 0 && self.valid_utf8 {
            EncodingVerdict::Utf8
        } else {
            EncodingVerdict::Unknown
        }
    }
}

/// Result of [`detect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// The encoding the bytes point to
    pub verdict: EncodingVerdict,
    /// The BOM that decided it, if any
    pub bom: Option<Bom>,
    /// Heuristic counters; `None` when a BOM decided
    pub stats: Option<ScanStats>,
}

/// Classify the encoding of a complete buffer.
///
/// Pure function of the bytes; see the module docs for the rules.
pub fn detect(bytes: &[u8]) -> Detection {
    if let Some(bom) = scan_bom(bytes) {
        debug!(?bom, "Found a byte-order mark");
        return Detection {
            verdict: bom.verdict(),
            bom: Some(bom),
            stats: None,
        };
    }

    let stats = scan(bytes);
    let verdict = stats.verdict();
    debug!(
        even_nul = stats.even_nul,
        odd_nul = stats.odd_nul,
        non_ascii = stats.non_ascii,
        valid_utf8 = stats.valid_utf8,
        %verdict,
        "Heuristic encoding scan"
    );

    Detection {
        verdict,
        bom: None,
        stats: Some(stats),
    }
}

const fn is_ascii(b: u8) -> bool {
    b & 0x80 == 0
}

const fn is_lead_byte(b: u8) -> bool {
    b & 0xC0 == 0xC0
}

const fn is_tail_byte(b: u8) -> bool {
    b & 0xC0 == 0x80
}

/// Number of continuation bytes a lead byte announces, or `None` if the
/// lead byte can never start a valid sequence
fn expected_tail_bytes(lead: u8) -> Option<usize> {
    match lead {
        // Overlong encodings of 7-bit ASCII
        0xC0 | 0xC1 => None,
        b if b & 0x20 == 0 => Some(1),
        b if b & 0x10 == 0 => Some(2),
        // Code points above U+10FFFF
        0xF5..=0xF7 => None,
        b if b & 0x08 == 0 => Some(3),
        // 5 and 6 byte forms are not Unicode
        _ => None,
    }
}

fn scan(bytes: &[u8]) -> ScanStats {
    let mut stats = ScanStats {
        valid_utf8: true,
        ..Default::default()
    };
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        i += 1;

        if b == 0 {
            // `i` already points past the byte
            if (i - 1) & 1 == 1 {
                stats.odd_nul += 1;
            } else {
                stats.even_nul += 1;
            }
            continue;
        }
        if is_ascii(b) {
            continue;
        }
        stats.non_ascii += 1;

        if !stats.valid_utf8 {
            continue;
        }
        if !is_lead_byte(b) {
            // Continuation byte with no lead byte in front
            stats.valid_utf8 = false;
            continue;
        }
        let Some(mut tails) = expected_tail_bytes(b) else {
            stats.valid_utf8 = false;
            continue;
        };

        while tails > 0 {
            match bytes.get(i) {
                Some(&t) if is_tail_byte(t) => {
                    stats.non_ascii += 1;
                    i += 1;
                    tails -= 1;
                }
                // Leave the offending byte for the outer loop to count
                Some(_) => break,
                None => break,
            }
        }
        if tails > 0 {
            stats.valid_utf8 = false;
        }
    }

    stats
}
