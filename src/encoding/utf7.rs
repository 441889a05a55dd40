//! UTF-7 (RFC 2152) decoder.
//!
//! `encoding_rs` deliberately leaves UTF-7 out, so the handful of rules are
//! implemented here: ASCII passes through, `+` opens a run of modified
//! base64 holding UTF-16 code units, `-` (absorbed) or any other non-base64
//! character closes it, and `+-` stands for a literal `+`.

use super::CP_UTF7;
use crate::error::{Error, Result};

fn base64_value(c: u8) -> Option<u32> {
    let v = match c {
        b'A'..=b'Z' => c - b'A',
        b'a'..=b'z' => c - b'a' + 26,
        b'0'..=b'9' => c - b'0' + 52,
        b'+' => 62,
        b'/' => 63,
        _ => return None,
    };
    Some(v as u32)
}

/// Decode UTF-7 bytes to UTF-16 code units.
pub fn decode(bytes: &[u8]) -> Result<Vec<u16>> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        i += 1;

        if !b.is_ascii() {
            return Err(Error::conversion(
                CP_UTF7,
                format!("byte 0x{:02X} at offset {} is not 7-bit", b, i - 1),
            ));
        }
        if b != b'+' {
            out.push(b as u16);
            continue;
        }

        let run_start = i - 1;
        if bytes.get(i) == Some(&b'-') {
            out.push(b'+' as u16);
            i += 1;
            continue;
        }

        let mut bits: u32 = 0;
        let mut nbits = 0u32;
        let mut chars = 0usize;
        while let Some(v) = bytes.get(i).copied().and_then(base64_value) {
            bits = (bits << 6) | v;
            nbits += 6;
            chars += 1;
            i += 1;
            if nbits >= 16 {
                nbits -= 16;
                out.push((bits >> nbits) as u16);
                bits &= (1 << nbits) - 1;
            }
        }

        // Padding left at the end of a run must be short and all zero
        if chars == 0 || nbits >= 6 || bits != 0 {
            return Err(Error::conversion(
                CP_UTF7,
                format!("ill-formed base64 run at offset {run_start}"),
            ));
        }
        if bytes.get(i) == Some(&b'-') {
            i += 1;
        }
    }

    Ok(out)
}
