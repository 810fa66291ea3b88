//! Runtime settings for the devbox binary
//!
//! Settings come from the process environment and are read once, in `main`.
//! Library code never looks at the environment itself; it receives the values
//! it needs (for example `shell_enabled`) as explicit arguments.
//!
//! # Environment Variables
//!
//! - `DEVBOX_SHELL_ENABLED`: set to a true value inside a devbox shell - default: false
//! - `DEVBOX_LOG_LEVEL`: Logging level - default: "info"
//! - `DEVBOX_LOG_JSON`: JSON log output (true|false) - default: false
//! - `SHELL`: the user's login shell, whose init file the devbox shell inherits

use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid log level: {0}. Valid options: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid shell path: {0}. SHELL must be an absolute path")]
    InvalidShell(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// True when running inside a devbox shell
    pub shell_enabled: bool,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    pub log_json: bool,

    /// The user's login shell, if known
    pub shell: Option<PathBuf>,
}

/// Reads a boolean the way shells usually spell them: 1/t/true/yes
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "t" | "true" | "yes"
    )
}

impl Default for Settings {
    /// Loads settings from environment variables, falling back to defaults
    fn default() -> Self {
        let shell_enabled = env::var("DEVBOX_SHELL_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let log_level = env::var("DEVBOX_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let log_json = env::var("DEVBOX_LOG_JSON")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let shell = env::var("SHELL")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self {
            shell_enabled,
            log_level,
            log_json,
            shell,
        }
    }
}

impl Settings {
    /// Checks the log level and the shell path
    pub fn validate(&self) -> Result<(), SettingsError> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(SettingsError::InvalidLogLevel(self.log_level.clone())),
        }

        if let Some(shell) = &self.shell {
            if !shell.is_absolute() {
                return Err(SettingsError::InvalidShell(shell.display().to_string()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Devbox Settings:")?;
        writeln!(f, "  Shell Enabled: {}", self.shell_enabled)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Log JSON: {}", self.log_json)?;
        match &self.shell {
            Some(shell) => writeln!(f, "  Shell: {}", shell.display())?,
            None => writeln!(f, "  Shell: (unset)")?,
        }
        Ok(())
    }
}
