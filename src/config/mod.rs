//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - Environment variables (through clap)
//! - CLI arguments
//!
//! Every section is optional; a missing key keeps its default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod types;

pub use types::{EncodingConfig, LoggingConfig, OutputConfig};

use crate::clipboard::FormatTag;
use crate::encoding::{codepage, EncodingChoice};
use crate::input::ReaderOptions;
use crate::pipeline::RunOptions;

/// Directory below the user config dir holding `config.toml`
const CONFIG_DIR_NAME: &str = "pipe2clip";

/// Log levels accepted in `[logging] level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log formats accepted in `[logging] format`
pub const LOG_FORMATS: [&str; 3] = ["compact", "pretty", "json"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input reading
    pub input: ReaderOptions,
    /// Encoding selection
    pub encoding: EncodingConfig,
    /// Clipboard output
    pub output: OutputConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Result of [`Config::resolve`]
#[derive(Debug)]
pub struct LoadedConfig {
    /// The configuration to use
    pub config: Config,
    /// File it came from, `None` for built-in defaults
    pub path: Option<PathBuf>,
    /// Why the default file was ignored
    pub fallback_reason: Option<anyhow::Error>,
}

/// Values given on the command line. `None` and `false` leave the
/// configuration alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// Encoding switch; `Auto` undoes a configured default
    pub encoding: Option<EncodingChoice>,
    /// Requested clipboard format
    pub format: Option<FormatTag>,
    /// `--trim`
    pub trim_trailing_line_break: bool,
    /// `--stop-at-sub`
    pub stop_at_sentinel: bool,
    /// Level derived from `-v`
    pub log_level: Option<String>,
    /// `--log-format`
    pub log_format: Option<String>,
    /// `--log-file`
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Result<Self> {
        Ok(Self::default())
    }

    /// `<config dir>/pipe2clip/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join("config.toml"))
    }

    /// Load the configuration for a run.
    ///
    /// An explicit path must load. Without one the default location is
    /// tried; a missing or broken default file means built-in defaults, and
    /// the reason a broken one was skipped is handed back for logging.
    pub fn resolve(explicit: Option<&Path>) -> Result<LoadedConfig> {
        if let Some(path) = explicit {
            return Ok(LoadedConfig {
                config: Self::load(path)?,
                path: Some(path.to_path_buf()),
                fallback_reason: None,
            });
        }

        match Self::default_path() {
            Some(path) if path.exists() => match Self::load(&path) {
                Ok(config) => Ok(LoadedConfig {
                    config,
                    path: Some(path),
                    fallback_reason: None,
                }),
                Err(e) => Ok(LoadedConfig {
                    config: Self::default_config()?,
                    path: None,
                    fallback_reason: Some(e),
                }),
            },
            _ => Ok(LoadedConfig {
                config: Self::default_config()?,
                path: None,
                fallback_reason: None,
            }),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (key, cp) in self.encoding.code_page_overrides() {
            if !codepage::is_supported(cp) {
                anyhow::bail!("Invalid {}: code page {} is not supported", key, cp);
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, cli: CliOverrides) -> Self {
        if let Some(encoding) = cli.encoding {
            self.encoding.default = encoding;
        }
        if let Some(format) = cli.format {
            self.output.format = format;
        }
        self.input.trim_trailing_line_break |= cli.trim_trailing_line_break;
        self.input.stop_at_sentinel |= cli.stop_at_sentinel;

        if let Some(level) = cli.log_level {
            self.logging.level = level;
        }
        if let Some(format) = cli.log_format {
            self.logging.format = format;
        }
        if cli.log_file.is_some() {
            self.logging.file = cli.log_file;
        }

        self
    }

    /// The options the pipeline runs with
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            encoding: self.encoding.default,
            format: self.output.format,
            reader: self.input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::CodePages;
    use std::io::Write;

    fn parse(toml_text: &str) -> Config {
        toml::from_str(toml_text).unwrap()
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse(""), Config::default());
        assert!(Config::default_config().unwrap().validate().is_ok());
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
            [input]
            trim_trailing_line_break = true
            stop_at_sentinel = true

            [encoding]
            default = "oem"
            oem_code_page = 866

            [output]
            format = "html"

            [logging]
            level = "debug"
            format = "json"
            "#,
        );
        assert!(config.validate().is_ok());

        let options = config.run_options();
        assert_eq!(options.encoding, EncodingChoice::Oem);
        assert_eq!(options.format, FormatTag::Html);
        assert!(options.reader.trim_trailing_line_break);
        assert!(options.reader.stop_at_sentinel);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_code_page_overrides_apply() {
        let config = parse("[encoding]\nconsole_code_page = 65001\n");
        let system = CodePages {
            ansi: 1252,
            oem: 437,
            console: 850,
        };
        let pages = config.encoding.apply(system);
        assert_eq!(pages.console, 65001);
        assert_eq!(pages.ansi, 1252);
        assert_eq!(pages.oem, 437);
    }

    #[test]
    fn test_validate_rejects_unknown_code_page() {
        let config = parse("[encoding]\nansi_code_page = 99999\n");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ansi_code_page"));
    }

    #[test]
    fn test_validate_rejects_bad_logging() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_format_is_parse_error() {
        assert!(toml::from_str::<Config>("[output]\nformat = \"pdf\"\n").is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = parse("[encoding]\ndefault = \"utf8\"\n[output]\nformat = \"rtf\"\n");
        let config = config.with_overrides(CliOverrides {
            encoding: Some(EncodingChoice::Ansi),
            format: Some(FormatTag::Html),
            trim_trailing_line_break: true,
            log_level: Some("trace".to_string()),
            ..Default::default()
        });
        assert_eq!(config.encoding.default, EncodingChoice::Ansi);
        assert_eq!(config.output.format, FormatTag::Html);
        assert!(config.input.trim_trailing_line_break);
        assert!(!config.input.stop_at_sentinel);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_auto_override_restores_detection() {
        let config = parse("[encoding]\ndefault = \"utf8\"\n");
        let config = config.with_overrides(CliOverrides {
            encoding: Some(EncodingChoice::Auto),
            ..Default::default()
        });
        assert_eq!(config.run_options().encoding, EncodingChoice::Auto);
    }

    #[test]
    fn test_absent_overrides_keep_file_values() {
        let config = parse("[input]\nstop_at_sentinel = true\n[logging]\nformat = \"pretty\"\n");
        let config = config.with_overrides(CliOverrides::default());
        assert!(config.input.stop_at_sentinel);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nformat = \"rtf\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.output.format, FormatTag::Rtf);
    }

    #[test]
    fn test_resolve_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[encoding]\ndefault = \"utf16\"").unwrap();
        let loaded = Config::resolve(Some(file.path())).unwrap();
        assert_eq!(loaded.config.encoding.default, EncodingChoice::Utf16);
        assert_eq!(loaded.path.as_deref(), Some(file.path()));
        assert!(loaded.fallback_reason.is_none());
    }

    #[test]
    fn test_explicit_invalid_file_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"chatty\"").unwrap();
        assert!(Config::resolve(Some(file.path())).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::resolve(Some(&missing)).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
