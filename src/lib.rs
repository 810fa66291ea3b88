//! devbox - reproducible, declarative development environments
//!
//! A project declares the packages it needs and, optionally, how to install,
//! build and start it in `devbox.json`. devbox turns that declaration into
//! files consumed by Nix and Docker:
//!
//! 1. [`config`] loads and validates `devbox.json`
//! 2. [`planner`] recognises the project's ecosystem and proposes defaults
//! 3. [`plan`] merges the declared plan over the inferred one
//! 4. [`generate`] renders the merged plan into shell and build artifacts
//! 5. [`Devbox`] sequences the steps and hands the artifacts to `nix-env`,
//!    `nix-shell` or `docker build`
//!
//! # Example Usage
//!
//! ```no_run
//! use devbox::Devbox;
//! use std::path::Path;
//!
//! # fn main() -> devbox::Result<()> {
//! let devbox = Devbox::open(Path::new("."), false)?;
//! let plan = devbox.build_plan()?;
//! println!("build: {:?}", plan.build_stage.command_line());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod devbox;
pub mod docker;
pub mod error;
pub mod fs;
pub mod generate;
pub mod nix;
pub mod plan;
pub mod planner;
pub mod settings;
pub mod util;

pub use config::{find_config_dir, init_config, Config, ConfigIssue, ShellConfig, CONFIG_FILENAME};
pub use devbox::{Devbox, EnvironmentState, InstallMode, PackageUpdate};
pub use docker::{BuildFlags, ContainerBuilder, DockerBuilder};
pub use error::{DevboxError, Result};
pub use generate::{generate, GenerationContext, OriginalInit, TemplateSet};
pub use nix::{PackageIndex, PackageInstaller, ShellLauncher, ShellRequest};
pub use plan::{merge_user_plan, MergeError, Plan, Stage, StagePin, StageSlot};
pub use planner::{Planner, PlannerRegistry};
pub use settings::{Settings, SettingsError};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
