//! Nix collaborators
//!
//! The orchestrator only needs three things from Nix: whether a package
//! exists, applying a derivation to a profile, and starting a shell. Each is a
//! trait so tests can substitute recording fakes.

use crate::error::{DevboxError, Result};
use crate::util::describe;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Answers whether a package identifier exists in the package index
pub trait PackageIndex: Send + Sync {
    fn exists(&self, package: &str) -> bool;
}

/// Makes a profile match a derivation file
pub trait PackageInstaller: Send + Sync {
    fn apply(&self, profile_dir: &Path, derivation: &Path) -> Result<()>;
}

/// Everything needed to start an interactive devbox shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellRequest {
    pub shell_nix: PathBuf,
    pub shellrc: PathBuf,
    pub project_dir: PathBuf,
    /// The user's login shell; bash is entered with `--rcfile <shellrc>`
    pub user_shell: Option<PathBuf>,
}

/// Starts shells and runs commands inside the environment
pub trait ShellLauncher: Send + Sync {
    fn run(&self, request: &ShellRequest) -> Result<()>;

    fn exec(&self, shell_nix: &Path, commands: &[String]) -> Result<()>;
}

fn run_interactive(mut cmd: Command) -> Result<()> {
    let command = describe(&cmd);
    debug!(%command, "Running command");

    let status = cmd.status().map_err(|e| DevboxError::ExternalCommand {
        command: command.clone(),
        message: e.to_string(),
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(DevboxError::ExternalCommand {
            command,
            message: status.to_string(),
        })
    }
}

/// `nix-env --query --available`
#[derive(Debug, Clone, Default)]
pub struct NixPackageIndex;

impl NixPackageIndex {
    fn command(package: &str) -> Command {
        let mut cmd = Command::new("nix-env");
        cmd.args(["--query", "--available", "--attr"])
            .arg(format!("nixpkgs.{}", package));
        cmd
    }
}

impl PackageIndex for NixPackageIndex {
    fn exists(&self, package: &str) -> bool {
        let mut cmd = Self::command(package);
        debug!(command = %describe(&cmd), "Checking package");
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// `nix-env --profile <profile> --install -f <derivation>`
#[derive(Debug, Clone, Default)]
pub struct NixEnvInstaller;

impl NixEnvInstaller {
    fn command(profile_dir: &Path, derivation: &Path) -> Command {
        let mut cmd = Command::new("nix-env");
        cmd.arg("--profile")
            .arg(profile_dir)
            .arg("--install")
            .arg("-f")
            .arg(derivation);
        cmd
    }
}

impl PackageInstaller for NixEnvInstaller {
    fn apply(&self, profile_dir: &Path, derivation: &Path) -> Result<()> {
        let mut cmd = Self::command(profile_dir, derivation);
        let command = describe(&cmd);
        debug!(%command, "Running command");

        let output = cmd.output().map_err(|e| DevboxError::ExternalCommand {
            command: command.clone(),
            message: e.to_string(),
        })?;

        if output.status.success() {
            return Ok(());
        }

        let mut captured = String::from_utf8_lossy(&output.stderr).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stdout));
        Err(DevboxError::InstallFailure {
            command,
            status: output.status.code().unwrap_or(-1),
            output: captured.trim_end().to_string(),
        })
    }
}

/// Shell fallback inside `nix-shell` for users whose shell has no `--rcfile`
const FALLBACK_SHELL: &str = "bash";

/// Shells that can be pointed at the generated shellrc
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Bash,
    Other,
}

impl ShellKind {
    pub fn detect(shell: &Path) -> Self {
        match shell.file_name().and_then(|name| name.to_str()) {
            Some("bash") => ShellKind::Bash,
            _ => ShellKind::Other,
        }
    }

    /// Only bash accepts `--rcfile`
    pub fn supports_rcfile(self) -> bool {
        self == ShellKind::Bash
    }

    /// The user's own init file for this shell, under `home`
    pub fn init_file(self, home: &Path) -> Option<PathBuf> {
        match self {
            ShellKind::Bash => Some(home.join(".bashrc")),
            ShellKind::Other => None,
        }
    }
}

/// The user's shell init file, if their shell is one the shellrc can replace
/// and the file exists
pub fn original_init_file(shell: &Path) -> Option<PathBuf> {
    let kind = ShellKind::detect(shell);
    if !kind.supports_rcfile() {
        return None;
    }
    let home = dirs::home_dir()?;
    kind.init_file(&home).filter(|path| path.is_file())
}

/// Launches `nix-shell`, entering the user's shell with the generated shellrc.
///
/// Users of other shells get the bash from the environment instead, so the
/// shellrc still runs.
#[derive(Debug, Clone, Default)]
pub struct NixShell;

impl NixShell {
    fn shell_command(request: &ShellRequest) -> Command {
        let mut cmd = Command::new("nix-shell");
        cmd.arg(&request.shell_nix)
            .current_dir(&request.project_dir)
            .env("DEVBOX_SHELL_ENABLED", "1");

        let shell = match &request.user_shell {
            Some(shell) if ShellKind::detect(shell).supports_rcfile() => {
                shell.display().to_string()
            }
            _ => FALLBACK_SHELL.to_string(),
        };
        cmd.arg("--command").arg(format!(
            "{} --rcfile '{}'",
            shell,
            request.shellrc.display()
        ));
        cmd
    }

    fn exec_command(shell_nix: &Path, commands: &[String]) -> Command {
        let mut cmd = Command::new("nix-shell");
        cmd.arg(shell_nix)
            .arg("--run")
            .arg(commands.join(" "))
            .env("DEVBOX_SHELL_ENABLED", "1");
        cmd
    }
}

impl ShellLauncher for NixShell {
    fn run(&self, request: &ShellRequest) -> Result<()> {
        run_interactive(Self::shell_command(request))
    }

    fn exec(&self, shell_nix: &Path, commands: &[String]) -> Result<()> {
        run_interactive(Self::exec_command(shell_nix, commands))
    }
}
