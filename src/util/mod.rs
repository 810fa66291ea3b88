//! Utility modules for devbox
//!
//! - Structured logging setup and configuration
//! - Printable command lines for logs and errors

pub mod logging;

pub use logging::{init_logging, LoggingConfig};

use std::process::Command;

/// Program and arguments of `cmd` joined by spaces
pub fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
