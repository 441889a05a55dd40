//! Reader → Detector → Normalizer → Tagger → Sink.
//!
//! [`prepare`] does everything that can fail without touching the
//! clipboard. Only when it produced data does [`run`] open the clipboard,
//! hand the data to [`deliver`] and close it again.

use std::io::Read;

use tracing::{debug, info};

use crate::clipboard::{tag, ClipboardFormat, ClipboardSink, FormatTag, Tagged};
use crate::encoding::{self, normalize, EncodingChoice, TextEncoding, TextPayload};
use crate::error::Result;
use crate::input::{self, ReaderOptions};
use crate::platform::Environment;

/// Everything a run needs to know, fixed before any input is read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Encoding selection
    pub encoding: EncodingChoice,
    /// Clipboard format
    pub format: FormatTag,
    /// Reader switches
    pub reader: ReaderOptions,
}

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No input; the clipboard was not touched
    Empty,
    /// The clipboard now holds the input
    Copied {
        /// Format it was stored under
        format: ClipboardFormat,
        /// Code units (text) or bytes (tagged formats) stored
        len: usize,
    },
}

/// Pick the encoding for `bytes`.
///
/// A forced choice wins outright. Otherwise the detector decides, and
/// input it cannot place gets the environment's fallback code page.
pub fn choose_encoding(bytes: &[u8], choice: EncodingChoice, env: &Environment) -> TextEncoding {
    let encoding = match choice {
        EncodingChoice::Auto => encoding::detect(bytes).verdict.resolve(env.fallback_code_page()),
        EncodingChoice::Ansi => TextEncoding::from_code_page(env.code_pages.ansi),
        EncodingChoice::Oem => TextEncoding::from_code_page(env.code_pages.oem),
        EncodingChoice::Utf8 => TextEncoding::Utf8,
        EncodingChoice::Utf16 => TextEncoding::Utf16Le,
    };
    debug!(?choice, %encoding, "Encoding selected");
    encoding
}

/// Read, decode and tag the input.
///
/// Returns `None` for empty input. Tagged formats always keep the input
/// bytes as they are; the encoding choice only applies to plain text.
pub fn prepare<R: Read>(source: R, options: &RunOptions, env: &Environment) -> Result<Option<Tagged>> {
    let buffer = input::read_all(source, &options.reader)?;
    if buffer.is_empty() {
        info!("Input is empty, leaving the clipboard alone");
        return Ok(None);
    }

    let payload = if options.format.is_tagged() {
        if options.encoding != EncodingChoice::Auto {
            debug!(
                encoding = ?options.encoding,
                format = ?options.format,
                "Encoding choice ignored for tagged format"
            );
        }
        TextPayload::Bytes(buffer.into_bytes())
    } else {
        let encoding = choose_encoding(buffer.as_bytes(), options.encoding, env);
        normalize(buffer.as_bytes(), encoding)?
    };

    Ok(Some(tag(payload, options.format)))
}

/// Store `tagged` in `sink`
pub fn deliver<S: ClipboardSink + ?Sized>(tagged: &Tagged, sink: &mut S) -> Result<()> {
    match &tagged.payload {
        TextPayload::Wide(units) => sink.set_text(units),
        TextPayload::Bytes(bytes) => sink.set_tagged(&tagged.format, bytes),
    }
}

/// Run the whole pipeline.
///
/// `open` is called at most once, after the input was read and converted.
/// The sink it returns is dropped before this function returns.
pub fn run<R, S, F>(source: R, options: &RunOptions, env: &Environment, open: F) -> Result<Outcome>
where
    R: Read,
    S: ClipboardSink,
    F: FnOnce() -> Result<S>,
{
    let Some(tagged) = prepare(source, options, env)? else {
        return Ok(Outcome::Empty);
    };

    let mut sink = open()?;
    deliver(&tagged, &mut sink)?;
    drop(sink);

    let outcome = Outcome::Copied {
        format: tagged.format.clone(),
        len: tagged.payload.len(),
    };
    info!(format = %tagged.format, len = tagged.payload.len(), "Input copied to the clipboard");
    Ok(outcome)
}
