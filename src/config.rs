//! Project configuration (`devbox.json`)
//!
//! The config is the user's declaration of an environment: the packages it
//! needs, an optional shell init hook and optional install/build/start stages.
//! It is read when an environment is opened and rewritten in full after every
//! package-list change.
//!
//! ```json
//! {
//!   "packages": ["git", "go_1_19"],
//!   "shell": { "init_hook": "echo hello" },
//!   "build_stage": { "command": ["go build -o app"] }
//! }
//! ```

use crate::error::{DevboxError, Result};
use crate::plan::{deserialize_commands, exclude, push_unique, Plan, Stage, StageSlot};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the file that declares a devbox environment
pub const CONFIG_FILENAME: &str = "devbox.json";

/// Problems found while validating a parsed config
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("invalid package identifier {0:?}")]
    InvalidPackage(String),

    #[error("package {0} is listed more than once")]
    DuplicatePackage(String),

    #[error("{0} contains an empty command")]
    EmptyCommand(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellConfig {
    #[serde(
        default,
        deserialize_with = "deserialize_commands",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub init_hook: Vec<String>,
}

impl ShellConfig {
    pub fn is_empty(&self) -> bool {
        self.init_hook.is_empty()
    }
}

fn stage_is_absent(stage: &Option<Stage>) -> bool {
    stage.as_ref().map_or(true, Stage::is_absent)
}

/// Contents of `devbox.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub packages: Vec<String>,

    #[serde(default, skip_serializing_if = "ShellConfig::is_empty")]
    pub shell: ShellConfig,

    #[serde(default, skip_serializing_if = "stage_is_absent")]
    pub install_stage: Option<Stage>,

    #[serde(default, skip_serializing_if = "stage_is_absent")]
    pub build_stage: Option<Stage>,

    #[serde(default, skip_serializing_if = "stage_is_absent")]
    pub start_stage: Option<Stage>,
}

/// Nix attribute paths such as `go_1_19` or `python310Packages.pip`
const PACKAGE_PATTERN: &str = r"^[A-Za-z0-9_][A-Za-z0-9_.+-]*$";

impl Config {
    /// Reads and validates the config file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading config");
        let content = fs::read_to_string(path).map_err(|e| DevboxError::io(path, e))?;

        let config: Config =
            serde_json::from_str(&content).map_err(|e| DevboxError::ConfigMalformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        config
            .validate()
            .map_err(|issue| DevboxError::ConfigMalformed {
                path: path.to_path_buf(),
                message: issue.to_string(),
            })?;

        Ok(config)
    }

    /// Rewrites the whole file at `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content =
            serde_json::to_string_pretty(self).map_err(|e| DevboxError::ConfigMalformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        content.push('\n');

        fs::write(path, content).map_err(|e| DevboxError::io(path, e))?;
        debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigIssue> {
        validate_packages(&self.packages)?;

        let mut seen: Vec<&str> = Vec::with_capacity(self.packages.len());
        for pkg in &self.packages {
            if seen.contains(&pkg.as_str()) {
                return Err(ConfigIssue::DuplicatePackage(pkg.clone()));
            }
            seen.push(pkg);
        }

        if self.shell.init_hook.iter().any(|line| line.trim().is_empty()) {
            return Err(ConfigIssue::EmptyCommand("shell.init_hook".to_string()));
        }

        for slot in StageSlot::ALL {
            let empty_command = self
                .stage(slot)
                .is_some_and(|stage| stage.command.iter().any(|cmd| cmd.trim().is_empty()));
            if empty_command {
                return Err(ConfigIssue::EmptyCommand(format!("{}_stage", slot)));
            }
        }

        Ok(())
    }

    pub fn stage(&self, slot: StageSlot) -> Option<&Stage> {
        match slot {
            StageSlot::Install => self.install_stage.as_ref(),
            StageSlot::Build => self.build_stage.as_ref(),
            StageSlot::Start => self.start_stage.as_ref(),
        }
    }

    /// Appends packages not yet listed, returning the ones actually added
    pub fn add_packages(&mut self, packages: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for pkg in packages {
            if !self.packages.contains(pkg) {
                self.packages.push(pkg.clone());
                push_unique(&mut added, pkg.clone());
            }
        }
        added
    }

    /// Drops the given packages, returning the ones that were listed
    pub fn remove_packages(&mut self, packages: &[String]) -> Vec<String> {
        let removed: Vec<String> = self
            .packages
            .iter()
            .filter(|pkg| packages.contains(pkg))
            .cloned()
            .collect();
        self.packages = exclude(&self.packages, packages);
        removed
    }

    /// The plan the user declared: packages for both environments plus any
    /// stages written in the file
    pub fn to_plan(&self) -> Plan {
        let mut plan = Plan::new()
            .with_dev_packages(self.packages.iter().cloned())
            .with_runtime_packages(self.packages.iter().cloned());
        for slot in StageSlot::ALL {
            if let Some(stage) = self.stage(slot) {
                *plan.stage_mut(slot) = stage.clone();
            }
        }
        plan
    }

    /// Init hook lines joined into a script body
    pub fn init_hook_script(&self) -> String {
        self.shell.init_hook.join("\n")
    }
}

/// Rejects the first identifier that is not a Nix attribute path
pub fn validate_packages(packages: &[String]) -> std::result::Result<(), ConfigIssue> {
    let pattern = Regex::new(PACKAGE_PATTERN).ok();
    match packages
        .iter()
        .find(|pkg| !pattern.as_ref().is_some_and(|re| re.is_match(pkg)))
    {
        Some(pkg) => Err(ConfigIssue::InvalidPackage(pkg.clone())),
        None => Ok(()),
    }
}

/// Creates a default `devbox.json` in `dir` unless one already exists.
///
/// Returns whether a file was created.
pub fn init_config(dir: &Path) -> Result<bool> {
    let path = dir.join(CONFIG_FILENAME);
    if path.exists() {
        debug!(path = %path.display(), "Config already exists");
        return Ok(false);
    }

    fs::create_dir_all(dir).map_err(|e| DevboxError::io(dir, e))?;
    Config::default().save(&path)?;
    Ok(true)
}

/// Finds the closest directory at or above `start` that holds a `devbox.json`
pub fn find_config_dir(start: &Path) -> Result<PathBuf> {
    let absolute = absolute_path(start)?;

    for dir in absolute.ancestors() {
        debug!(dir = %dir.display(), "Looking for {}", CONFIG_FILENAME);
        if dir.join(CONFIG_FILENAME).is_file() {
            return Ok(dir.to_path_buf());
        }
    }

    Err(DevboxError::ConfigNotFound {
        dir: display_dir(start),
    })
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| DevboxError::io(path, e))?;
    Ok(cwd.join(path))
}

fn display_dir(dir: &Path) -> String {
    if dir.as_os_str().is_empty() || dir == Path::new(".") {
        return "this directory".to_string();
    }

    std::env::current_dir()
        .ok()
        .and_then(|cwd| dir.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or_else(|| dir.to_path_buf())
        .display()
        .to_string()
}
