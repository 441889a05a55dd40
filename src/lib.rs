//! # pipe2clip
//!
//! Copy standard input to the system clipboard.
//!
//! The input is read completely, its encoding is worked out from the bytes
//! (byte-order mark first, then a NUL / UTF-8 heuristic, then the code page
//! of the environment), and it is stored as Unicode text. Alternatively the
//! bytes are stored as HTML or RTF.
//!
//! # Architecture
//!
//! ```text
//! pipe2clip
//!   ├─> input      (read stdin into a RawBuffer, Ctrl-Z stop, trim)
//!   ├─> encoding   (BOM scan, heuristic detection, decoding to UTF-16)
//!   ├─> clipboard  (CF_HTML / RTF tagging, ClipboardSink backends)
//!   ├─> platform   (code pages, stdin kind)
//!   ├─> config     (TOML file + CLI overrides)
//!   └─> pipeline   (wires the stages together)
//! ```
//!
//! # Data Flow
//!
//! **Text:** stdin → RawBuffer → detect → normalize → UTF-16 → clipboard
//!
//! **HTML / RTF:** stdin → RawBuffer → tag → bytes → clipboard
//!
//! # Example
//!
//! ```rust,no_run
//! use pipe2clip::{clipboard, pipeline, platform::Environment, pipeline::RunOptions};
//!
//! let env = Environment::detect();
//! let _outcome = pipeline::run(std::io::stdin().lock(), &RunOptions::default(), &env, clipboard::open_system)?;
//! # Ok::<(), pipe2clip::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Clipboard formats and backends
pub mod clipboard;

/// Configuration file and CLI overrides
pub mod config;

/// Encoding detection and conversion to UTF-16
pub mod encoding;

/// Error types
pub mod error;

/// Standard input accumulation
pub mod input;

/// The stage sequence
pub mod pipeline;

/// Host code pages and input kind
pub mod platform;

/// Utility functions
pub mod utils;

pub use error::{Error, ErrorType, Result};
