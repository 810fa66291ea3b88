//! Structured logging setup for devbox
//!
//! Logging goes through the `tracing` ecosystem and is written to stderr so it
//! never mixes with command output such as `devbox plan --format json`.
//!
//! - Compact console output by default, JSON on request
//! - `RUST_LOG` takes over filtering entirely when set
//! - Initialization happens at most once per process
//!
//! # Example
//!
//! ```no_run
//! use devbox::util::{init_logging, LoggingConfig};
//! use tracing::Level;
//!
//! init_logging(LoggingConfig::with_level(Level::DEBUG));
//! tracing::debug!(dir = "/work/app", "Looking for devbox.json");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., devbox::planner) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    /// INFO level, console output, targets shown, locations hidden
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn json(mut self, use_json: bool) -> Self {
        self.use_json = use_json;
        self
    }
}

/// Parses a log level, case-insensitively, falling back to INFO
///
/// ```
/// use devbox::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("DEBUG"), Level::DEBUG);
/// assert_eq!(parse_level("chatty"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = if env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(format!("devbox={}", config.level))
        };

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location),
                )
                .init();
        }
    });
}
