use std::io::Write;

use pipe2clip::clipboard::{ClipboardFormat, ClipboardSink};
use pipe2clip::config::{CliOverrides, Config};
use pipe2clip::encoding::EncodingChoice;
use pipe2clip::pipeline::{self, Outcome, RunOptions};
use pipe2clip::platform::{CodePages, Environment, InputSource};
use pipe2clip::{Error, Result};
use tempfile::NamedTempFile;

/// What a sink was asked to store
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stored {
    Text(String),
    Tagged(ClipboardFormat, Vec<u8>),
}

#[derive(Default)]
struct RecordingSink {
    stored: Vec<Stored>,
}

impl ClipboardSink for RecordingSink {
    fn set_text(&mut self, text: &[u16]) -> Result<()> {
        self.stored.push(Stored::Text(String::from_utf16(text).unwrap()));
        Ok(())
    }

    fn set_tagged(&mut self, format: &ClipboardFormat, data: &[u8]) -> Result<()> {
        self.stored.push(Stored::Tagged(format.clone(), data.to_vec()));
        Ok(())
    }
}

fn environment(input_source: InputSource) -> Environment {
    Environment {
        code_pages: CodePages {
            ansi: 1252,
            oem: 437,
            console: 866,
        },
        input_source,
    }
}

/// Run the pipeline on `input` and return what reached the sink
fn copy(input: &[u8], options: &RunOptions, env: &Environment) -> Result<Vec<Stored>> {
    let mut sink = RecordingSink::default();
    pipeline::run(input, options, env, || Ok(&mut sink))?;
    Ok(sink.stored)
}

impl ClipboardSink for &mut RecordingSink {
    fn set_text(&mut self, text: &[u16]) -> Result<()> {
        (**self).set_text(text)
    }

    fn set_tagged(&mut self, format: &ClipboardFormat, data: &[u8]) -> Result<()> {
        (**self).set_tagged(format, data)
    }
}

#[test]
fn test_utf8_without_bom() {
    let stored = copy("naïve café\n".as_bytes(), &RunOptions::default(), &environment(InputSource::Pipe)).unwrap();
    assert_eq!(stored, vec![Stored::Text("naïve café\n".to_string())]);
}

#[test]
fn test_utf16_with_bom() {
    let mut input = vec![0xFF, 0xFE];
    for unit in "line\r\n".encode_utf16() {
        input.extend_from_slice(&unit.to_le_bytes());
    }
    let stored = copy(&input, &RunOptions::default(), &environment(InputSource::File)).unwrap();
    assert_eq!(stored, vec![Stored::Text("line\r\n".to_string())]);
}

#[test]
fn test_legacy_fallback_follows_input_source() {
    // Console code page 866 for piped data
    let input = b"\x8F\xE0\xA8\xA2\xA5\xE2";
    let from_pipe = copy(input, &RunOptions::default(), &environment(InputSource::Pipe)).unwrap();
    assert_eq!(from_pipe, vec![Stored::Text("Привет".to_string())]);
}

#[test]
fn test_legacy_fallback_from_file() {
    let input = b"caf\xE9";
    let stored = copy(input, &RunOptions::default(), &environment(InputSource::File)).unwrap();
    assert_eq!(stored, vec![Stored::Text("café".to_string())]);
}

#[test]
fn test_empty_input_leaves_clipboard_alone() {
    let mut opened = false;
    let outcome = pipeline::run(&b""[..], &RunOptions::default(), &environment(InputSource::Pipe), || {
        opened = true;
        Ok(RecordingSink::default())
    })
    .unwrap();
    assert_eq!(outcome, Outcome::Empty);
    assert!(!opened);
}

#[test]
fn test_html_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[output]\nformat = \"html\"").unwrap();
    let config = Config::load(file.path()).unwrap();

    let doc = b"<html><body>Hi</body></html>";
    let stored = copy(doc, &config.run_options(), &environment(InputSource::Pipe)).unwrap();

    let [Stored::Tagged(format, data)] = &stored[..] else {
        panic!("expected one tagged store, got {stored:?}");
    };
    assert_eq!(format.name, Some("HTML Format"));
    assert!(data.starts_with(b"Version:0.9\r\nStartHTML:74\r\n"));
    assert!(data.ends_with(doc));
}

#[test]
fn test_rtf_bom_removed() {
    let options = RunOptions {
        format: pipe2clip::clipboard::FormatTag::Rtf,
        ..Default::default()
    };
    let stored = copy(b"\xEF\xBB\xBF{\\rtf1 hi}", &options, &environment(InputSource::Pipe)).unwrap();
    assert_eq!(
        stored,
        vec![Stored::Tagged(ClipboardFormat::rtf(), b"{\\rtf1 hi}".to_vec())]
    );
}

#[test]
fn test_cli_overrides_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[encoding]\ndefault = \"utf8\"\n[input]\nstop_at_sentinel = true").unwrap();
    let config = Config::load(file.path()).unwrap().with_overrides(CliOverrides {
        encoding: Some(EncodingChoice::Oem),
        trim_trailing_line_break: true,
        ..Default::default()
    });

    // CP437: 0x81 is 'ü'; everything after SUB is ignored
    let stored = copy(b"\x81ber\r\n\x1Aignored", &config.run_options(), &environment(InputSource::Pipe)).unwrap();
    assert_eq!(stored, vec![Stored::Text("über".to_string())]);
}

#[test]
fn test_code_page_override_from_config() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[encoding]\nconsole_code_page = 1251").unwrap();
    let config = Config::load(file.path()).unwrap();

    let system = environment(InputSource::Pipe);
    let env = Environment {
        code_pages: config.encoding.apply(system.code_pages),
        ..system
    };
    let stored = copy(b"\xCF\xF0\xE8\xE2\xE5\xF2", &config.run_options(), &env).unwrap();
    assert_eq!(stored, vec![Stored::Text("Привет".to_string())]);
}

#[test]
fn test_forced_utf8_rejects_invalid_input() {
    let options = RunOptions {
        encoding: EncodingChoice::Utf8,
        ..Default::default()
    };
    let err = copy(b"caf\xE9", &options, &environment(InputSource::Pipe)).unwrap_err();
    assert!(matches!(err, Error::EncodingConversion { code_page: 65001, .. }));
    assert_eq!(
        err.to_string(),
        "Can't convert the input to Unicode. Code page 65001: invalid UTF-8 byte sequence"
    );
}

#[test]
fn test_western_european_console_fallback() {
    let mut env = environment(InputSource::Pipe);
    env.code_pages.console = 850;
    let stored = copy(b"Gr\x94\xE1e", &RunOptions::default(), &env).unwrap();
    assert_eq!(stored, vec![Stored::Text("Größe".to_string())]);
}

#[test]
fn test_forced_encoding_keeps_html_bytes() {
    let config = Config::default().with_overrides(CliOverrides {
        encoding: Some(EncodingChoice::Utf16),
        format: Some(pipe2clip::clipboard::FormatTag::Html),
        ..Default::default()
    });

    let doc = b"<html><body>caf\xE9</body></html>";
    let stored = copy(doc, &config.run_options(), &environment(InputSource::Pipe)).unwrap();

    let [Stored::Tagged(format, data)] = &stored[..] else {
        panic!("expected one tagged store, got {stored:?}");
    };
    assert_eq!(format, &ClipboardFormat::html());
    assert!(data.ends_with(doc));
    assert!(data.starts_with(b"Version:0.9\r\nStartHTML:74\r\n"));
}
