//! Legacy code page decoding.
//!
//! Windows code page numbers are mapped onto `encoding_rs` encodings where
//! one exists. The DOS code pages 437 (US) and 850 (Western Europe) have no
//! `encoding_rs` counterpart and are decoded from built-in tables. On
//! Windows every other code page the system knows goes through
//! `MultiByteToWideChar`.

use encoding_rs::Encoding;

use super::{utf7, CP_UTF16BE, CP_UTF16LE, CP_UTF7, CP_UTF8};
use crate::error::{Error, Result};

/// IBM PC / MS-DOS United States
pub const CP_OEM_US: u32 = 437;

/// MS-DOS Latin 1
pub const CP_OEM_LATIN1: u32 = 850;

/// US-ASCII
pub const CP_US_ASCII: u32 = 20127;

/// Western European (Windows)
pub const CP_WINDOWS_1252: u32 = 1252;

// =============================================================================
// Code page table
// =============================================================================

/// `encoding_rs` encoding for a Windows code page number
pub fn encoding_for_code_page(code_page: u32) -> Option<&'static Encoding> {
    let encoding = match code_page {
        866 => encoding_rs::IBM866,
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        1252 => encoding_rs::WINDOWS_1252,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        10000 => encoding_rs::MACINTOSH,
        10007 => encoding_rs::X_MAC_CYRILLIC,
        20866 => encoding_rs::KOI8_R,
        20932 | 51932 => encoding_rs::EUC_JP,
        21866 => encoding_rs::KOI8_U,
        // encoding_rs treats ISO-8859-1 as its superset windows-1252
        28591 => encoding_rs::WINDOWS_1252,
        28592 => encoding_rs::ISO_8859_2,
        28593 => encoding_rs::ISO_8859_3,
        28594 => encoding_rs::ISO_8859_4,
        28595 => encoding_rs::ISO_8859_5,
        28596 => encoding_rs::ISO_8859_6,
        28597 => encoding_rs::ISO_8859_7,
        28598 => encoding_rs::ISO_8859_8,
        28599 => encoding_rs::WINDOWS_1254,
        28603 => encoding_rs::ISO_8859_13,
        28605 => encoding_rs::ISO_8859_15,
        50220 => encoding_rs::ISO_2022_JP,
        51949 => encoding_rs::EUC_KR,
        54936 => encoding_rs::GB18030,
        CP_UTF8 => encoding_rs::UTF_8,
        _ => return None,
    };
    Some(encoding)
}

/// Returns true if [`decode`] knows `code_page`
pub fn is_supported(code_page: u32) -> bool {
    matches!(code_page, CP_UTF7 | CP_UTF16LE | CP_UTF16BE | CP_US_ASCII)
        || oem_table(code_page).is_some()
        || encoding_for_code_page(code_page).is_some()
        || system::is_valid(code_page)
}

/// Code pages tried, in order, when mapping an encoding back to a number
const REVERSE_LOOKUP_ORDER: [u32; 24] = [
    CP_UTF8, 1252, 1250, 1251, 1253, 1254, 1255, 1256, 1257, 1258, 874, 932, 936, 949, 950, 866, 20866,
    21866, 20932, 28592, 28595, 28597, 28605, 54936,
];

/// Windows code page number for a locale codeset name such as `UTF-8`,
/// `ISO-8859-15` or `KOI8-R`
pub fn code_page_for_label(label: &str) -> Option<u32> {
    if label.eq_ignore_ascii_case("ANSI_X3.4-1968") || label.eq_ignore_ascii_case("US-ASCII") {
        return Some(CP_US_ASCII);
    }
    let encoding = Encoding::for_label(label.as_bytes())?;
    REVERSE_LOOKUP_ORDER
        .into_iter()
        .find(|&cp| encoding_for_code_page(cp) == Some(encoding))
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode `bytes` from `code_page` to UTF-16 code units.
///
/// Decoding is strict: a byte sequence that is malformed for the code page
/// is an error, never a replacement character.
pub fn decode(bytes: &[u8], code_page: u32) -> Result<Vec<u16>> {
    match code_page {
        CP_UTF16LE => Ok(utf16_units(bytes, u16::from_le_bytes)),
        CP_UTF16BE => Ok(utf16_units(bytes, u16::from_be_bytes)),
        CP_UTF7 => utf7::decode(bytes),
        CP_US_ASCII => decode_ascii(bytes),
        cp => {
            if let Some(table) = oem_table(cp) {
                return Ok(decode_oem(bytes, table));
            }
            match encoding_for_code_page(cp) {
                Some(encoding) => decode_with(encoding, bytes, cp),
                None => system::decode(bytes, cp),
            }
        }
    }
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8], code_page: u32) -> Result<Vec<u16>> {
    let text = encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| {
            Error::conversion(code_page, format!("invalid {} byte sequence", encoding.name()))
        })?;
    Ok(text.encode_utf16().collect())
}

/// Pair up bytes into code units. An odd trailing byte is dropped.
pub(crate) fn utf16_units(bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| from_bytes([pair[0], pair[1]]))
        .collect()
}

fn decode_ascii(bytes: &[u8]) -> Result<Vec<u16>> {
    match bytes.iter().position(|b| !b.is_ascii()) {
        Some(offset) => Err(Error::conversion(
            CP_US_ASCII,
            format!("non-ASCII byte 0x{:02X} at offset {}", bytes[offset], offset),
        )),
        None => Ok(bytes.iter().map(|&b| b as u16).collect()),
    }
}

// =============================================================================
// DOS code pages
// =============================================================================

/// Upper half (0x80-0xFF) of a single-byte DOS code page
type OemTable = [char; 128];

const CP437_HIGH: OemTable = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', 'É', 'æ', 'Æ', 'ô', 'ö', 'ò',
    'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', 'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½',
    '¼', '¡', '«', '»', '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', '└', '┴',
    '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫',
    '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', 'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ',
    'ε', '∩', '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{A0}',
];

const CP850_HIGH: OemTable = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', // 0x80
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', 'ø', '£', 'Ø', '×', 'ƒ', // 0x90
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '®', '¬', '½', '¼', '¡', '«', '»', // 0xA0
    '░', '▒', '▓', '│', '┤', 'Á', 'Â', 'À', '©', '╣', '║', '╗', '╝', '¢', '¥', '┐', // 0xB0
    '└', '┴', '┬', '├', '─', '┼', 'ã', 'Ã', '╚', '╔', '╩', '╦', '╠', '═', '╬', '¤', // 0xC0
    'ð', 'Ð', 'Ê', 'Ë', 'È', 'ı', 'Í', 'Î', 'Ï', '┘', '┌', '█', '▄', '¦', 'Ì', '▀', // 0xD0
    'Ó', 'ß', 'Ô', 'Ò', 'õ', 'Õ', 'µ', 'þ', 'Þ', 'Ú', 'Û', 'Ù', 'ý', 'Ý', '¯', '´', // 0xE0
    '\u{AD}', '±', '‗', '¾', '¶', '§', '÷', '¸', '°', '¨', '·', '¹', '³', '²', '■', '\u{A0}', // 0xF0
];

fn oem_table(code_page: u32) -> Option<&'static OemTable> {
    match code_page {
        CP_OEM_US => Some(&CP437_HIGH),
        CP_OEM_LATIN1 => Some(&CP850_HIGH),
        _ => None,
    }
}

/// All 256 positions are defined; the low range is kept as the control
/// characters themselves, not as the DOS glyphs.
fn decode_oem(bytes: &[u8], table: &OemTable) -> Vec<u16> {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as u16
            } else {
                table[(b - 0x80) as usize] as u16
            }
        })
        .collect()
}

// =============================================================================
// System conversion
// =============================================================================

#[cfg(windows)]
#[allow(unsafe_code)]
mod system {
    use windows::Win32::Globalization::{IsValidCodePage, MultiByteToWideChar, MB_ERR_INVALID_CHARS};

    use crate::error::{Error, Result};

    pub(super) fn is_valid(code_page: u32) -> bool {
        // SAFETY: takes a plain integer
        unsafe { IsValidCodePage(code_page) }.as_bool()
    }

    pub(super) fn decode(bytes: &[u8], code_page: u32) -> Result<Vec<u16>> {
        if !is_valid(code_page) {
            return Err(Error::conversion(code_page, "unsupported code page"));
        }
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        // SAFETY: the input slice is valid for reads, no output buffer yet
        let len = unsafe { MultiByteToWideChar(code_page, MB_ERR_INVALID_CHARS, bytes, None) };
        if len <= 0 {
            return Err(Error::conversion(code_page, "invalid byte sequence"));
        }

        let mut units = vec![0u16; len as usize];
        // SAFETY: `units` holds exactly the length reported above
        let written =
            unsafe { MultiByteToWideChar(code_page, MB_ERR_INVALID_CHARS, bytes, Some(&mut units)) };
        if written <= 0 {
            return Err(Error::conversion(code_page, "invalid byte sequence"));
        }
        units.truncate(written as usize);
        Ok(units)
    }
}

#[cfg(not(windows))]
mod system {
    use crate::error::{Error, Result};

    pub(super) fn is_valid(_code_page: u32) -> bool {
        false
    }

    pub(super) fn decode(_bytes: &[u8], code_page: u32) -> Result<Vec<u16>> {
        Err(Error::conversion(code_page, "unsupported code page"))
    }
}
