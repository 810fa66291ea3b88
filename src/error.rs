//! Error types for devbox
//!
//! Every fallible operation in the library returns [`DevboxError`]. Lower-level
//! failures are wrapped with the operation and path that produced them so the
//! CLI can print a single `"<context>: <cause>"` line.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, DevboxError>;

#[derive(Debug, Error)]
pub enum DevboxError {
    /// No `devbox.json` in the starting directory or any of its ancestors
    #[error("No devbox.json found in {dir}, or any parent directories. Did you run `devbox init` yet?")]
    ConfigNotFound { dir: String },

    /// `devbox.json` exists but does not parse or validate
    #[error("invalid config {path}: {message}")]
    ConfigMalformed { path: PathBuf, message: String },

    /// A requested package name is not a valid identifier
    #[error("{0}")]
    InvalidPackage(crate::config::ConfigIssue),

    /// A requested package is unknown to the package index
    #[error("package {package} not found")]
    PackageNotFound { package: String },

    /// The user plan and the inferred plan cannot be merged
    #[error("plan conflict: {0}")]
    PlanConflict(#[from] crate::plan::MergeError),

    /// A template failed to render or its output could not be written
    #[error("generate {template}: {message}")]
    GenerationFailure { template: String, message: String },

    /// A required field was left empty
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    /// The package installer exited unsuccessfully
    #[error("running command {command}: exit status {status} with command output: {output}")]
    InstallFailure {
        command: String,
        status: i32,
        output: String,
    },

    /// An external command could not be started or failed
    #[error("running command {command}: {message}")]
    ExternalCommand { command: String, message: String },

    /// Filesystem error with the path that caused it
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DevboxError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DevboxError::Io {
            path: path.into(),
            source,
        }
    }
}
