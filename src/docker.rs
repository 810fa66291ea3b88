//! Container image builds

use crate::error::{DevboxError, Result};
use crate::util::describe;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Options for `devbox build`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFlags {
    /// Image tag
    pub name: Option<String>,
    pub dockerfile: Option<PathBuf>,
}

impl BuildFlags {
    /// Fills every unset field from `defaults`
    pub fn or(self, defaults: BuildFlags) -> BuildFlags {
        BuildFlags {
            name: self.name.or(defaults.name),
            dockerfile: self.dockerfile.or(defaults.dockerfile),
        }
    }
}

pub trait ContainerBuilder: Send + Sync {
    fn build(&self, context_dir: &Path, flags: &BuildFlags) -> Result<()>;
}

/// `docker build -f <Dockerfile> [-t <name>] <dir>`
#[derive(Debug, Clone, Default)]
pub struct DockerBuilder;

impl DockerBuilder {
    fn command(context_dir: &Path, flags: &BuildFlags) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("build");
        if let Some(dockerfile) = &flags.dockerfile {
            cmd.arg("-f").arg(dockerfile);
        }
        if let Some(name) = &flags.name {
            cmd.arg("-t").arg(name);
        }
        cmd.arg(context_dir);
        cmd
    }
}

impl ContainerBuilder for DockerBuilder {
    fn build(&self, context_dir: &Path, flags: &BuildFlags) -> Result<()> {
        let mut cmd = Self::command(context_dir, flags);
        let command = describe(&cmd);
        debug!(%command, "Running command");

        let status = cmd.status().map_err(|e| DevboxError::ExternalCommand {
            command: command.clone(),
            message: e.to_string(),
        })?;
        if !status.success() {
            return Err(DevboxError::ExternalCommand {
                command,
                message: status.to_string(),
            });
        }

        info!(image = flags.name.as_deref().unwrap_or("<untagged>"), "Image built");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_flags_override_defaults() {
        let defaults = BuildFlags {
            name: None,
            dockerfile: Some(PathBuf::from("/p/.devbox/gen/Dockerfile")),
        };
        let user = BuildFlags {
            name: Some("app:latest".to_string()),
            dockerfile: None,
        };

        let merged = user.or(defaults);
        assert_eq!(merged.name.as_deref(), Some("app:latest"));
        assert_eq!(
            merged.dockerfile,
            Some(PathBuf::from("/p/.devbox/gen/Dockerfile"))
        );
    }

    #[test]
    fn test_build_command() {
        let flags = BuildFlags {
            name: Some("app".to_string()),
            dockerfile: Some(PathBuf::from("/p/.devbox/gen/Dockerfile")),
        };
        let cmd = DockerBuilder::command(Path::new("/p"), &flags);
        assert_eq!(
            args(&cmd),
            vec!["build", "-f", "/p/.devbox/gen/Dockerfile", "-t", "app", "/p"]
        );
    }

    #[test]
    fn test_build_command_without_name() {
        let cmd = DockerBuilder::command(Path::new("/p"), &BuildFlags::default());
        assert_eq!(args(&cmd), vec!["build", "/p"]);
    }
}
