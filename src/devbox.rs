//! Environment orchestrator
//!
//! [`Devbox`] owns one project's `devbox.json` and sequences the rest of the
//! crate around it: config to user plan, planner inference and merge,
//! artifact generation, then the external installer, shell or container
//! builder. Nothing is cached between operations; every call re-derives its
//! plan and files from the current config.

use crate::config::{self, Config, CONFIG_FILENAME};
use crate::docker::{BuildFlags, ContainerBuilder, DockerBuilder};
use crate::error::{DevboxError, Result};
use crate::generate::{self, GenerationContext, OriginalInit, TemplateSet};
use crate::nix::{
    self, NixEnvInstaller, NixPackageIndex, NixShell, PackageIndex, PackageInstaller,
    ShellLauncher, ShellRequest,
};
use crate::plan::{merge_user_plan, union, Plan};
use crate::planner::PlannerRegistry;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Profile symlink managed by `nix-env`, relative to the project
pub const PROFILE_DIR: &str = ".devbox/nix/profile/default";

/// History file of the devbox shell, relative to the project
pub const SHELL_HISTORY_FILE: &str = ".devbox/shell_history";

/// Output directory of generated artifacts, relative to the project
pub const GEN_DIR: &str = ".devbox/gen";

/// Where an environment is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnvironmentState {
    /// No `devbox.json` yet
    Uninitialized,
    /// Config loaded
    Configured,
    /// A plan was merged
    Planned,
    /// Artifacts written
    Generated,
    /// Packages installed into the profile
    Realized,
}

impl fmt::Display for EnvironmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnvironmentState::Uninitialized => "uninitialized",
            EnvironmentState::Configured => "configured",
            EnvironmentState::Planned => "planned",
            EnvironmentState::Generated => "generated",
            EnvironmentState::Realized => "realized",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    Install,
    Uninstall,
}

/// Outcome of `add` or `remove`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageUpdate {
    pub mode: InstallMode,
    /// Packages whose membership actually changed
    pub changed: Vec<String>,
    /// Whether the installer ran
    pub applied: bool,
    /// Report for the user, absent when no packages were requested
    pub message: Option<String>,
}

/// Report printed after `add`/`remove`
pub fn package_update_message(
    mode: InstallMode,
    packages: &[String],
    shell_enabled: bool,
) -> Option<String> {
    let verb = match mode {
        InstallMode::Install => "installed",
        InstallMode::Uninstall => "removed",
    };

    let mut message = match packages {
        [] => return None,
        [pkg] => format!("{} is now {}.", pkg, verb),
        pkgs => format!("{} are now {}.", pkgs.join(", "), verb),
    };
    if shell_enabled {
        message.push_str(" Run `hash -r` to ensure your shell is updated.");
    }
    Some(message)
}

/// One project's environment
pub struct Devbox {
    config: Config,
    src_dir: PathBuf,
    shell_enabled: bool,
    user_shell: Option<PathBuf>,
    state: EnvironmentState,
    planners: PlannerRegistry,
    package_index: Arc<dyn PackageIndex>,
    installer: Arc<dyn PackageInstaller>,
    shell_launcher: Arc<dyn ShellLauncher>,
    container_builder: Arc<dyn ContainerBuilder>,
}

impl Devbox {
    /// Creates a default `devbox.json` in `dir` unless one exists
    pub fn init(dir: &Path) -> Result<bool> {
        config::init_config(dir)
    }

    /// Opens the environment whose `devbox.json` is in `dir` or an ancestor.
    ///
    /// `shell_enabled` tells whether the caller already runs inside a devbox
    /// shell.
    pub fn open(dir: &Path, shell_enabled: bool) -> Result<Self> {
        let src_dir = config::find_config_dir(dir)?;
        let config = Config::load(&src_dir.join(CONFIG_FILENAME))?;
        debug!(dir = %src_dir.display(), packages = config.packages.len(), "Opened devbox");

        Ok(Self {
            config,
            src_dir,
            shell_enabled,
            user_shell: None,
            state: EnvironmentState::Configured,
            planners: PlannerRegistry::default(),
            package_index: Arc::new(NixPackageIndex),
            installer: Arc::new(NixEnvInstaller),
            shell_launcher: Arc::new(NixShell),
            container_builder: Arc::new(DockerBuilder),
        })
    }

    pub fn with_package_index(mut self, index: Arc<dyn PackageIndex>) -> Self {
        self.package_index = index;
        self
    }

    pub fn with_installer(mut self, installer: Arc<dyn PackageInstaller>) -> Self {
        self.installer = installer;
        self
    }

    pub fn with_shell_launcher(mut self, launcher: Arc<dyn ShellLauncher>) -> Self {
        self.shell_launcher = launcher;
        self
    }

    pub fn with_container_builder(mut self, builder: Arc<dyn ContainerBuilder>) -> Self {
        self.container_builder = builder;
        self
    }

    pub fn with_planners(mut self, planners: PlannerRegistry) -> Self {
        self.planners = planners;
        self
    }

    /// The user's login shell; its init file is inherited by the shellrc
    pub fn with_user_shell(mut self, shell: Option<PathBuf>) -> Self {
        self.user_shell = shell;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn state(&self) -> EnvironmentState {
        self.state
    }

    pub fn gen_dir(&self) -> PathBuf {
        self.src_dir.join(GEN_DIR)
    }

    /// Adds packages to the config and installs them.
    ///
    /// Every package is checked for a valid name and against the index
    /// first; one bad package rejects the whole call. Packages already listed are skipped, and when
    /// nothing changes the installer is not run.
    pub fn add(&mut self, packages: &[String]) -> Result<PackageUpdate> {
        config::validate_packages(packages).map_err(DevboxError::InvalidPackage)?;
        if let Some(missing) = packages.iter().find(|pkg| !self.package_index.exists(pkg)) {
            return Err(DevboxError::PackageNotFound {
                package: missing.clone(),
            });
        }

        let changed = self.config.add_packages(packages);
        self.save_config()?;
        self.finish_update(InstallMode::Install, packages, changed)
    }

    /// Removes packages from the config and uninstalls them.
    ///
    /// Packages that are not listed are ignored.
    pub fn remove(&mut self, packages: &[String]) -> Result<PackageUpdate> {
        let changed = self.config.remove_packages(packages);
        self.save_config()?;
        self.finish_update(InstallMode::Uninstall, packages, changed)
    }

    fn finish_update(
        &mut self,
        mode: InstallMode,
        requested: &[String],
        changed: Vec<String>,
    ) -> Result<PackageUpdate> {
        let applied = !changed.is_empty();
        if applied {
            self.ensure_packages_installed(mode)?;
        } else {
            debug!(?mode, "Package list unchanged, skipping installation");
        }

        Ok(PackageUpdate {
            mode,
            changed,
            applied,
            message: package_update_message(mode, &union(&[], requested), self.shell_enabled),
        })
    }

    /// Plan for the interactive shell: the declared packages and stages,
    /// plus the shell init hook of the detected ecosystem
    pub fn shell_plan(&self) -> Plan {
        let mut plan = self.config.to_plan();
        let inferred = self.planners.infer(&self.src_dir);
        if !inferred.shell_init_hook.is_empty() {
            plan.shell_init_hook = inferred.shell_init_hook;
        }
        plan
    }

    /// Declared plan merged over the inferred one
    pub fn build_plan(&self) -> Result<Plan> {
        let user = self.config.to_plan();
        let inferred = self.planners.infer(&self.src_dir);
        let plan = merge_user_plan(&user, &inferred)?;
        for warning in &plan.warnings {
            warn!("{}", warning);
        }
        Ok(plan)
    }

    /// Writes both artifact sets
    pub fn generate(&mut self) -> Result<Vec<PathBuf>> {
        let mut written = self.generate_shell_files()?;
        written.extend(self.generate_build_files()?);
        Ok(written)
    }

    /// Writes the build artifacts and builds a container image from them
    pub fn build(&mut self, flags: BuildFlags) -> Result<()> {
        self.generate_build_files()?;

        let defaults = BuildFlags {
            name: None,
            dockerfile: Some(self.gen_dir().join("Dockerfile")),
        };
        let flags = flags.or(defaults);
        info!(dir = %self.src_dir.display(), "Building container image");
        self.container_builder.build(&self.src_dir, &flags)
    }

    /// Installs the environment and starts an interactive shell in it
    pub fn shell(&mut self) -> Result<()> {
        self.ensure_packages_installed(InstallMode::Install)?;

        let request = ShellRequest {
            shell_nix: self.gen_dir().join("shell.nix"),
            shellrc: self.gen_dir().join("shellrc"),
            project_dir: self.src_dir.clone(),
            user_shell: self.user_shell.clone(),
        };
        self.shell_launcher.run(&request)
    }

    /// Installs the environment and runs `commands` inside it with the
    /// profile's `bin` directory first on `PATH`
    pub fn exec(&mut self, commands: &[String]) -> Result<()> {
        self.ensure_packages_installed(InstallMode::Install)?;

        let profile_bin = self.profile_dir()?.join("bin");
        let mut full = Vec::with_capacity(commands.len() + 1);
        full.push(format!("PATH=\"{}:$PATH\"", profile_bin.display()));
        full.extend(commands.iter().cloned());

        self.shell_launcher
            .exec(&self.gen_dir().join("shell.nix"), &full)
    }

    fn save_config(&self) -> Result<()> {
        self.config.save(&self.src_dir.join(CONFIG_FILENAME))
    }

    /// Profile path; its parent directory is created on demand
    fn profile_dir(&self) -> Result<PathBuf> {
        let path = self.src_dir.join(PROFILE_DIR);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DevboxError::io(parent, e))?;
        }
        Ok(path)
    }

    fn generation_context(&self) -> Result<GenerationContext> {
        let original_init = match self.user_shell.as_deref().and_then(nix::original_init_file) {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| DevboxError::io(&path, e))?;
                Some(OriginalInit { path, content })
            }
            None => None,
        };

        Ok(GenerationContext {
            project_dir: self.src_dir.clone(),
            profile_dir: self.profile_dir()?,
            history_file: self.src_dir.join(SHELL_HISTORY_FILE),
            user_hook: self.config.init_hook_script(),
            original_init,
        })
    }

    fn generate_shell_files(&mut self) -> Result<Vec<PathBuf>> {
        let plan = self.shell_plan();
        let ctx = self.generation_context()?;
        let written = generate::generate(&self.gen_dir(), &plan, &ctx, TemplateSet::Shell)?;
        self.state = EnvironmentState::Generated;
        Ok(written)
    }

    fn generate_build_files(&mut self) -> Result<Vec<PathBuf>> {
        let plan = self.build_plan()?;
        self.state = EnvironmentState::Planned;

        let ctx = self.generation_context()?;
        let written = generate::generate(&self.gen_dir(), &plan, &ctx, TemplateSet::Build)?;
        self.state = EnvironmentState::Generated;
        Ok(written)
    }

    fn ensure_packages_installed(&mut self, mode: InstallMode) -> Result<()> {
        self.generate_shell_files()?;

        let verb = match mode {
            InstallMode::Install => "Installing",
            InstallMode::Uninstall => "Uninstalling",
        };
        info!("{} nix packages. This may take a while...", verb);

        let profile_dir = self.profile_dir()?;
        self.installer
            .apply(&profile_dir, &self.gen_dir().join("development.nix"))?;

        info!("{} nix packages done", verb);
        self.state = EnvironmentState::Realized;
        Ok(())
    }
}
