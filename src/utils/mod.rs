//! Utility Functions and Diagnostics
//!
//! Startup diagnostics and user-facing error formatting for the binary.
//!
//! ```rust,no_run
//! use pipe2clip::platform::Environment;
//! use pipe2clip::utils::{format_user_error, log_startup_diagnostics};
//!
//! let env = Environment::detect();
//! log_startup_diagnostics(&env);
//!
//! let err = anyhow::anyhow!("something broke");
//! eprintln!("{}", format_user_error(&err));
//! ```

pub mod diagnostics;
pub mod errors;

// Re-export key types
pub use diagnostics::{log_startup_diagnostics, SystemInfo};
pub use errors::format_user_error;
