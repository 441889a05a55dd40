//! User-Friendly Error Formatting
//!
//! One line naming the program and the failure, then a hint when the
//! failure has a usual cause the user can do something about.

use std::fmt::Write;

use crate::error::Error;

/// Program name used as the message prefix
const PROGRAM_NAME: &str = env!("CARGO_PKG_NAME");

/// Format error for user consumption
///
/// The full context chain is printed on one line, ending with a period.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    let message = format!("{:#}", error);
    let message = message.trim_end();
    write!(&mut output, "{}: Error: {}", PROGRAM_NAME, message).ok();
    if !message.ends_with(['.', '!', '?']) {
        output.push('.');
    }

    if let Some(hint) = error.downcast_ref::<Error>().and_then(hint_for) {
        writeln!(&mut output).ok();
        write!(&mut output, "Hint: {}", hint).ok();
    }

    output
}

fn hint_for(error: &Error) -> Option<&'static str> {
    match error {
        Error::ClipboardAcquisition(_) => Some(
            "another program is holding the clipboard open. Close it, or try again in a moment.",
        ),
        Error::EncodingConversion { .. } => Some(
            "the input is not in the encoding that was used. Force one with -A, -O, -U or -u.",
        ),
        Error::OutOfMemory(_) => Some("the input is too large to hold in memory."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_plain_message() {
        let err = anyhow::Error::from(Error::ClipboardWrite("Access is denied".to_string()));
        assert_eq!(
            format_user_error(&err),
            "pipe2clip: Error: Failed to write to the clipboard. Access is denied."
        );
    }

    #[test]
    fn test_no_double_period() {
        let err = anyhow::anyhow!("Input ended.");
        assert_eq!(format_user_error(&err), "pipe2clip: Error: Input ended.");
    }

    #[test]
    fn test_busy_clipboard_hint() {
        let err = anyhow::Error::from(Error::ClipboardAcquisition("Access is denied".to_string()));
        let text = format_user_error(&err);
        assert!(text.starts_with("pipe2clip: Error: Could not open the clipboard. Access is denied.\n"));
        assert!(text.contains("Hint: another program is holding the clipboard open"));
    }

    #[test]
    fn test_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("missing field"));
        let err = err.context("Failed to parse config file: a.toml").unwrap_err();
        assert_eq!(
            format_user_error(&err),
            "pipe2clip: Error: Failed to parse config file: a.toml: missing field."
        );
    }
}
