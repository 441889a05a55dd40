//! Facts about the host that shape decoding.
//!
//! When the input carries no proof of a UTF encoding, the code page comes
//! from the environment: the console code page for data typed at a
//! terminal or piped from another program, the ANSI code page for data
//! redirected from a file.

use std::fmt;
use std::io::IsTerminal;

use tracing::debug;

use crate::encoding::codepage::{code_page_for_label, CP_US_ASCII};
use crate::encoding::CP_UTF8;

// =============================================================================
// Code pages
// =============================================================================

/// The three code pages a Windows process runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePages {
    /// System (ANSI) code page
    pub ansi: u32,
    /// OEM (DOS) code page
    pub oem: u32,
    /// Console output code page
    pub console: u32,
}

impl CodePages {
    /// Query the running system
    #[cfg(windows)]
    #[allow(unsafe_code)]
    pub fn system() -> Self {
        use windows::Win32::Globalization::{GetACP, GetOEMCP};
        use windows::Win32::System::Console::GetConsoleOutputCP;

        // SAFETY: none of these take arguments or touch process state
        let (ansi, oem, console) = unsafe { (GetACP(), GetOEMCP(), GetConsoleOutputCP()) };

        // No console attached
        let console = if console == 0 { ansi } else { console };
        Self { ansi, oem, console }
    }

    /// Derive code pages from the locale environment variables.
    ///
    /// There is no OEM code page outside Windows; CP437 stands in for it.
    #[cfg(not(windows))]
    pub fn system() -> Self {
        let code_page = locale_code_page(|name| std::env::var(name).ok());
        Self {
            ansi: code_page,
            oem: crate::encoding::codepage::CP_OEM_US,
            console: code_page,
        }
    }
}

impl fmt::Display for CodePages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ANSI {}, OEM {}, console {}", self.ansi, self.oem, self.console)
    }
}

/// Code page named by `LC_ALL`, `LC_CTYPE` or `LANG`, first one set wins.
///
/// `lang_COUNTRY.codeset@modifier` yields `codeset`. `C` and `POSIX` mean
/// ASCII. Anything unknown or unset falls back to UTF-8.
#[cfg_attr(windows, allow(dead_code))]
fn locale_code_page(var: impl Fn(&str) -> Option<String>) -> u32 {
    let Some(locale) = ["LC_ALL", "LC_CTYPE", "LANG"]
        .into_iter()
        .filter_map(&var)
        .find(|value| !value.is_empty())
    else {
        return CP_UTF8;
    };

    if locale == "C" || locale == "POSIX" {
        return CP_US_ASCII;
    }

    let codeset = locale
        .split_once('.')
        .map(|(_, rest)| rest.split('@').next().unwrap_or(rest))
        .unwrap_or("");

    match code_page_for_label(codeset) {
        Some(cp) => cp,
        None => {
            debug!(%locale, "Unknown locale codeset, assuming UTF-8");
            CP_UTF8
        }
    }
}

// =============================================================================
// Input source
// =============================================================================

/// What standard input is connected to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// An interactive terminal
    Terminal,
    /// A pipe or socket from another process
    Pipe,
    /// A redirected file (or anything else)
    File,
}

impl InputSource {
    /// Classify the process's standard input
    pub fn of_stdin() -> Self {
        if std::io::stdin().is_terminal() {
            Self::Terminal
        } else if stdin_is_pipe() {
            Self::Pipe
        } else {
            Self::File
        }
    }

    /// Returns true if text from this source is in the console code page
    pub fn uses_console_code_page(&self) -> bool {
        matches!(self, Self::Terminal | Self::Pipe)
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Terminal => "terminal",
            Self::Pipe => "pipe",
            Self::File => "file",
        })
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn stdin_is_pipe() -> bool {
    let mut st = std::mem::MaybeUninit::<libc::stat>::uninit();
    // SAFETY: fstat only writes into `st`, which is read only on success
    let mode = unsafe {
        if libc::fstat(libc::STDIN_FILENO, st.as_mut_ptr()) != 0 {
            return false;
        }
        st.assume_init().st_mode
    };
    matches!(mode & libc::S_IFMT, libc::S_IFIFO | libc::S_IFSOCK)
}

#[cfg(windows)]
#[allow(unsafe_code)]
fn stdin_is_pipe() -> bool {
    use windows::Win32::Storage::FileSystem::{GetFileType, FILE_TYPE_PIPE};
    use windows::Win32::System::Console::{GetStdHandle, STD_INPUT_HANDLE};

    // SAFETY: the standard handle is owned by the process and not closed here
    unsafe {
        match GetStdHandle(STD_INPUT_HANDLE) {
            Ok(handle) if !handle.is_invalid() => GetFileType(handle) == FILE_TYPE_PIPE,
            _ => false,
        }
    }
}

#[cfg(not(any(unix, windows)))]
fn stdin_is_pipe() -> bool {
    false
}

// =============================================================================
// Environment
// =============================================================================

/// Everything the pipeline needs to know about the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    /// Code pages in effect
    pub code_pages: CodePages,
    /// Where standard input comes from
    pub input_source: InputSource,
}

impl Environment {
    /// Inspect the running process
    pub fn detect() -> Self {
        let env = Self {
            code_pages: CodePages::system(),
            input_source: InputSource::of_stdin(),
        };
        debug!(code_pages = %env.code_pages, input = %env.input_source, "Environment");
        env
    }

    /// Code page for input that is not recognizably UTF
    pub fn fallback_code_page(&self) -> u32 {
        if self.input_source.uses_console_code_page() {
            self.code_pages.console
        } else {
            self.code_pages.ansi
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(source: InputSource) -> Environment {
        Environment {
            code_pages: CodePages {
                ansi: 1252,
                oem: 437,
                console: 850,
            },
            input_source: source,
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn test_fallback_by_source() {
        assert_eq!(env(InputSource::Terminal).fallback_code_page(), 850);
        assert_eq!(env(InputSource::Pipe).fallback_code_page(), 850);
        assert_eq!(env(InputSource::File).fallback_code_page(), 1252);
    }

    #[test]
    fn test_locale_codeset() {
        assert_eq!(locale_code_page(vars(&[("LANG", "en_US.UTF-8")])), CP_UTF8);
        assert_eq!(locale_code_page(vars(&[("LANG", "de_DE.ISO-8859-15@euro")])), 28605);
        assert_eq!(locale_code_page(vars(&[("LANG", "ru_RU.KOI8-R")])), 20866);
    }

    #[test]
    fn test_locale_precedence() {
        let lookup = vars(&[("LC_ALL", "ja_JP.SJIS"), ("LANG", "en_US.UTF-8")]);
        assert_eq!(locale_code_page(lookup), 932);

        // Empty values are skipped
        let lookup = vars(&[("LC_ALL", ""), ("LC_CTYPE", "C"), ("LANG", "en_US.UTF-8")]);
        assert_eq!(locale_code_page(lookup), CP_US_ASCII);
    }

    #[test]
    fn test_locale_fallback() {
        assert_eq!(locale_code_page(vars(&[])), CP_UTF8);
        assert_eq!(locale_code_page(vars(&[("LANG", "en_US")])), CP_UTF8);
        assert_eq!(locale_code_page(vars(&[("LANG", "xx_XX.bogus")])), CP_UTF8);
    }

    #[test]
    fn test_display() {
        let pages = env(InputSource::Pipe).code_pages;
        assert_eq!(pages.to_string(), "ANSI 1252, OEM 437, console 850");
        assert_eq!(InputSource::File.to_string(), "file");
    }
}
