//! Startup diagnostics

use tracing::debug;

use crate::encoding::codepage;
use crate::platform::Environment;

/// Build and host information for diagnostics
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Crate version
    pub version: &'static str,
    /// Operating system family (e.g., "windows", "linux")
    pub os: &'static str,
    /// CPU architecture
    pub arch: &'static str,
    /// "debug" or "release"
    pub profile: &'static str,
}

impl SystemInfo {
    /// Gather system information
    pub fn gather() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            profile: if cfg!(debug_assertions) { "debug" } else { "release" },
        }
    }

    /// Log system information
    pub fn log(&self) {
        debug!("=== pipe2clip v{} ===", self.version);
        debug!("  Platform: {} ({})", self.os, self.arch);
        debug!("  Profile: {}", self.profile);
    }
}

/// Log what the run is going to work with
pub fn log_startup_diagnostics(env: &Environment) {
    SystemInfo::gather().log();

    let pages = env.code_pages;
    debug!("  Code pages: {}", pages);
    for (name, cp) in [("ANSI", pages.ansi), ("OEM", pages.oem), ("console", pages.console)] {
        if !codepage::is_supported(cp) {
            debug!("  {} code page {} cannot be decoded", name, cp);
        }
    }
    debug!("  Standard input: {}", env.input_source);
    debug!("  Fallback code page: {}", env.fallback_code_page());
}
