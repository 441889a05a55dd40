//! Standard input accumulation.
//!
//! The whole input is read into one [`RawBuffer`] before anything else
//! happens: encoding detection looks at the complete buffer, so there is no
//! streaming mode.

use std::io::{ErrorKind, Read};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Number of bytes requested from the source per read call
const CHUNK_SIZE: usize = 4096;

/// SUB (Ctrl-Z), the DOS end-of-file character
pub const SENTINEL_BYTE: u8 = 0x1A;

/// Reader behavior switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Stop at the first [`SENTINEL_BYTE`]. The sentinel is not stored.
    pub stop_at_sentinel: bool,

    /// Drop one trailing LF, or CRLF, after the read completes
    pub trim_trailing_line_break: bool,
}

/// Owned input bytes.
///
/// Zero bytes are ordinary data here, never terminators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBuffer {
    bytes: Vec<u8>,
}

impl RawBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes held
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if nothing was read
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Allocated capacity in bytes
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Borrow the bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the bytes out of the buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Append bytes, failing instead of aborting when memory runs out.
    ///
    /// `Vec` reservations grow geometrically, so repeated appends stay
    /// amortized linear.
    fn try_extend(&mut self, data: &[u8]) -> Result<()> {
        self.bytes.try_reserve(data.len())?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Remove a trailing LF, then the CR in front of it.
    ///
    /// A lone trailing CR is left alone.
    fn trim_trailing_line_break(&mut self) {
        if self.bytes.last() == Some(&b'\n') {
            self.bytes.pop();
            if self.bytes.last() == Some(&b'\r') {
                self.bytes.pop();
            }
        }
    }
}

impl From<Vec<u8>> for RawBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Read `source` to its end (or to the sentinel) into a [`RawBuffer`].
pub fn read_all<R: Read>(mut source: R, options: &ReaderOptions) -> Result<RawBuffer> {
    let mut buffer = RawBuffer::new();

    if options.stop_at_sentinel {
        read_until_sentinel(&mut source, &mut buffer)?;
    } else {
        read_chunks(&mut source, &mut buffer)?;
    }

    if options.trim_trailing_line_break {
        let before = buffer.len();
        buffer.trim_trailing_line_break();
        trace!("Trimmed {} trailing line break bytes", before - buffer.len());
    }

    debug!(bytes = buffer.len(), "Input read complete");
    Ok(buffer)
}

fn read_chunks<R: Read>(source: &mut R, buffer: &mut RawBuffer) -> Result<()> {
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = match source.read(&mut chunk) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Read(e)),
        };
        buffer.try_extend(&chunk[..n])?;

        // Give the writer on the other end of the pipe a chance to run
        std::thread::yield_now();
    }
}

/// One byte per read call, so nothing past the sentinel is consumed even
/// when it does not fall on a chunk boundary.
fn read_until_sentinel<R: Read>(source: &mut R, buffer: &mut RawBuffer) -> Result<()> {
    let mut byte = [0u8; 1];
    let mut since_yield = 0usize;

    loop {
        match source.read(&mut byte) {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Read(e)),
        }
        if byte[0] == SENTINEL_BYTE {
            debug!(offset = buffer.len(), "Stopped at SUB sentinel");
            return Ok(());
        }
        buffer.try_extend(&byte)?;

        since_yield += 1;
        if since_yield == CHUNK_SIZE {
            since_yield = 0;
            std::thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    fn read(input: &[u8], options: ReaderOptions) -> Vec<u8> {
        read_all(Cursor::new(input.to_vec()), &options).unwrap().into_bytes()
    }

    fn trimming() -> ReaderOptions {
        ReaderOptions {
            trim_trailing_line_break: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_read_empty() {
        let buffer = read_all(io::empty(), &ReaderOptions::default()).unwrap();
        assert!(buffer.is_empty());
        assert!(buffer.len() <= buffer.capacity());
    }

    #[test]
    fn test_read_larger_than_chunk() {
        let input: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        assert_eq!(read(&input, ReaderOptions::default()), input);
    }

    #[test]
    fn test_embedded_nul_is_data() {
        assert_eq!(read(b"a\0b\0", ReaderOptions::default()), b"a\0b\0");
    }

    #[test]
    fn test_trim_crlf() {
        assert_eq!(read(b"abc\r\n", trimming()), b"abc");
    }

    #[test]
    fn test_trim_lf() {
        assert_eq!(read(b"abc\n", trimming()), b"abc");
    }

    #[test]
    fn test_lone_cr_not_trimmed() {
        assert_eq!(read(b"abc\r", trimming()), b"abc\r");
    }

    #[test]
    fn test_trim_only_one_line_break() {
        assert_eq!(read(b"abc\n\n", trimming()), b"abc\n");
        assert_eq!(read(b"\r\n", trimming()), b"");
    }

    #[test]
    fn test_no_trim_by_default() {
        assert_eq!(read(b"abc\r\n", ReaderOptions::default()), b"abc\r\n");
    }

    #[test]
    fn test_stop_at_sentinel() {
        let options = ReaderOptions {
            stop_at_sentinel: true,
            ..Default::default()
        };
        let mut cursor = Cursor::new(b"hello\x1Aworld".to_vec());
        let buffer = read_all(&mut cursor, &options).unwrap();
        assert_eq!(buffer.as_bytes(), b"hello");
        // Nothing past the sentinel was consumed
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn test_sentinel_ignored_when_disabled() {
        assert_eq!(read(b"a\x1Ab", ReaderOptions::default()), b"a\x1Ab");
    }

    #[test]
    fn test_sentinel_then_trim() {
        let options = ReaderOptions {
            stop_at_sentinel: true,
            trim_trailing_line_break: true,
        };
        assert_eq!(read(b"line\r\n\x1Ajunk", options), b"line");
    }

    struct FlakyReader {
        data: Cursor<Vec<u8>>,
        interrupted: bool,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let reader = FlakyReader {
            data: Cursor::new(b"data".to_vec()),
            interrupted: false,
        };
        let buffer = read_all(reader, &ReaderOptions::default()).unwrap();
        assert_eq!(buffer.as_bytes(), b"data");
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn test_read_error() {
        let err = read_all(BrokenReader, &ReaderOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Read(_)));
    }
}
