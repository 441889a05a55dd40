//! pipe2clip - copy standard input to the clipboard
//!
//! Entry point for the binary.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, CommandFactory, FromArgMatches, Parser};
use tracing::{debug, info, warn, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use pipe2clip::clipboard::{self, FormatTag};
use pipe2clip::config::{CliOverrides, Config, LoggingConfig};
use pipe2clip::encoding::EncodingChoice;
use pipe2clip::pipeline::{self, Outcome};
use pipe2clip::platform::{CodePages, Environment};
use pipe2clip::utils::{format_user_error, log_startup_diagnostics};

/// Command-line arguments for pipe2clip
#[derive(Parser, Debug)]
#[command(name = "pipe2clip")]
#[command(version, about = "Copy standard input to the clipboard", long_about = None)]
#[command(override_usage = "<command> | pipe2clip [OPTIONS]")]
#[command(group(ArgGroup::new("encoding").args(["auto", "ansi", "oem", "utf8", "utf16"])))]
#[command(group(ArgGroup::new("format").args(["html", "rtf"])))]
struct Args {
    /// Detect the input encoding (overrides a configured default)
    #[arg(short = 'a', long)]
    auto: bool,

    /// Assume input is ANSI text (Windows system code page)
    #[arg(short = 'A', long)]
    ansi: bool,

    /// Assume input is OEM text
    #[arg(short = 'O', long)]
    oem: bool,

    /// Assume input is UTF-8 text (code page 65001)
    #[arg(short = 'U', long = "utf8", visible_alias = "utf-8")]
    utf8: bool,

    /// Assume input is UTF-16 text (Unicode)
    #[arg(short = 'u', long = "utf16", visible_alias = "utf-16")]
    utf16: bool,

    /// Register input as HTML
    #[arg(short = 'H', long)]
    html: bool,

    /// Register input as RTF
    #[arg(short = 'r', long)]
    rtf: bool,

    /// Remove the final CR/LF, if any
    #[arg(short = 'N', long)]
    trim: bool,

    /// Stop input on a Ctrl-Z (aka. SUB or EOF) character
    #[arg(short = 'z', long = "stop-at-sub")]
    stop_at_sub: bool,

    /// Configuration file path
    #[arg(short, long, env = "PIPE2CLIP_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format (compact|pretty|json)
    #[arg(long, env = "PIPE2CLIP_LOG_FORMAT", value_parser = ["compact", "pretty", "json"])]
    log_format: Option<String>,

    /// Write logs to file (in addition to stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Parse the command line, with help text that names the code pages in
    /// effect
    fn parse_with_code_pages(pages: CodePages) -> Self {
        let command = Args::command()
            .mut_arg("ansi", |arg| {
                arg.help(format!(
                    "Assume input is ANSI text (Windows system code page {})",
                    pages.ansi
                ))
            })
            .mut_arg("oem", |arg| arg.help(format!("Assume input is OEM text (code page {})", pages.oem)))
            .after_help(format!(
                "Default input encoding: UTF-8 or UTF-16 if valid; else for data coming through\n\
                 a pipe or typed at the console, the console code page (code page {}); else for\n\
                 files, the system code page (code page {}).",
                pages.console, pages.ansi
            ));

        let matches = command.get_matches();
        Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    fn overrides(&self) -> CliOverrides {
        let encoding = if self.auto {
            Some(EncodingChoice::Auto)
        } else if self.ansi {
            Some(EncodingChoice::Ansi)
        } else if self.oem {
            Some(EncodingChoice::Oem)
        } else if self.utf8 {
            Some(EncodingChoice::Utf8)
        } else if self.utf16 {
            Some(EncodingChoice::Utf16)
        } else {
            None
        };

        let format = if self.html {
            Some(FormatTag::Html)
        } else if self.rtf {
            Some(FormatTag::Rtf)
        } else {
            None
        };

        let log_level = match self.verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        };

        CliOverrides {
            encoding,
            format,
            trim_trailing_line_break: self.trim,
            stop_at_sentinel: self.stop_at_sub,
            log_level: log_level.map(str::to_string),
            log_format: self.log_format.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse_with_code_pages(CodePages::system());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("Run failed: {:#}", e);
            eprintln!("{}", format_user_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let loaded = Config::resolve(args.config.as_deref())?;
    let config = loaded.config.with_overrides(args.overrides());
    config.validate()?;

    let _log_guard = init_logging(&config.logging)?;

    if let Some(reason) = loaded.fallback_reason {
        warn!("Failed to load config: {:#}, using defaults", reason);
    }
    match &loaded.path {
        Some(path) => debug!("Configuration loaded from {}", path.display()),
        None => debug!("Using built-in configuration"),
    }

    let system = Environment::detect();
    let env = Environment {
        code_pages: config.encoding.apply(system.code_pages),
        ..system
    };
    log_startup_diagnostics(&env);

    let options = config.run_options();
    debug!(?options, "Run options");

    match pipeline::run(std::io::stdin().lock(), &options, &env, clipboard::open_system)? {
        Outcome::Empty => debug!("Nothing to copy"),
        Outcome::Copied { format, len } => info!("Copied {} units as {}", len, format),
    }

    Ok(())
}

/// Build one formatting layer
fn fmt_layer<S, W>(format: &str, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);

    match format {
        "json" => layer.json().boxed(),
        "pretty" => layer.pretty().boxed(),
        _ => layer.compact().boxed(),
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr so stdout stays untouched. The returned guard flushes
/// the log file when dropped.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("pipe2clip={},warn", config.level))
    });

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt_layer(&config.format, writer, false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer(&config.format, std::io::stderr, true))
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    if let Some(path) = &config.file {
        debug!("Logging to file: {}", path.display());
    }

    Ok(guard)
}
