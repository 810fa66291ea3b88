//! Artifact generation
//!
//! Renders a plan and its [`GenerationContext`] through one of two fixed
//! template sets:
//!
//! - [`TemplateSet::Shell`]: `development.nix`, `shell.nix`, `shellrc`
//! - [`TemplateSet::Build`]: `development.nix`, `runtime.nix`, `Dockerfile`,
//!   `Dockerfile.dockerignore`
//!
//! Every call rewrites the full set. Values that need shaping (joined stage
//! command lines, the JSON `CMD` array) are computed here so the templates only
//! test for presence and loop over package lists.

use crate::error::{DevboxError, Result};
use crate::plan::Plan;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEVELOPMENT_NIX: &str = include_str!("templates/development.nix.tmpl");
const RUNTIME_NIX: &str = include_str!("templates/runtime.nix.tmpl");
const SHELL_NIX: &str = include_str!("templates/shell.nix.tmpl");
const SHELLRC: &str = include_str!("templates/shellrc.tmpl");
const DOCKERFILE: &str = include_str!("templates/Dockerfile.tmpl");
const DOCKERIGNORE: &str = include_str!("templates/Dockerfile.dockerignore.tmpl");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSet {
    /// Files consumed by `nix-env` and the interactive shell
    Shell,
    /// Files consumed by the container build
    Build,
}

impl TemplateSet {
    /// `(output file name, template source)` pairs, in render order
    pub fn templates(self) -> &'static [(&'static str, &'static str)] {
        match self {
            TemplateSet::Shell => &[
                ("development.nix", DEVELOPMENT_NIX),
                ("shell.nix", SHELL_NIX),
                ("shellrc", SHELLRC),
            ],
            TemplateSet::Build => &[
                ("development.nix", DEVELOPMENT_NIX),
                ("runtime.nix", RUNTIME_NIX),
                ("Dockerfile", DOCKERFILE),
                ("Dockerfile.dockerignore", DOCKERIGNORE),
            ],
        }
    }

    pub fn file_names(self) -> Vec<&'static str> {
        self.templates().iter().map(|(name, _)| *name).collect()
    }
}

/// The user's own shell init file, inlined at the top of the shellrc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalInit {
    pub path: PathBuf,
    pub content: String,
}

/// Paths and hook text a single render needs besides the plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationContext {
    pub project_dir: PathBuf,
    pub profile_dir: PathBuf,
    pub history_file: PathBuf,
    /// `shell.init_hook` from devbox.json, one command per line
    pub user_hook: String,
    pub original_init: Option<OriginalInit>,
}

impl GenerationContext {
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("project_dir", &self.project_dir),
            ("profile_dir", &self.profile_dir),
            ("history_file", &self.history_file),
        ];
        for (field, path) in required {
            if path.as_os_str().is_empty() {
                return Err(DevboxError::MissingField { field });
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct OriginalInitView {
    path: String,
    content: String,
}

#[derive(Serialize)]
struct TemplateView<'a> {
    dev_packages: &'a [String],
    runtime_packages: &'a [String],
    install_command: Option<String>,
    build_command: Option<String>,
    start_cmd_json: Option<String>,
    run_script: Option<String>,
    project_dir: String,
    profile_bin_dir: String,
    history_file: String,
    user_hook: String,
    plan_hook: String,
    original_init: Option<OriginalInitView>,
}

impl<'a> TemplateView<'a> {
    fn new(plan: &'a Plan, ctx: &GenerationContext) -> Result<Self> {
        let start_command = plan.start_stage.command_line();
        let start_cmd_json = start_command
            .as_ref()
            .map(|cmd| serde_json::to_string(&["sh", "-c", cmd.as_str()]))
            .transpose()
            .map_err(|e| DevboxError::GenerationFailure {
                template: "Dockerfile".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            dev_packages: &plan.dev_packages,
            runtime_packages: &plan.runtime_packages,
            install_command: plan.install_stage.command_line(),
            build_command: plan.build_stage.command_line(),
            start_cmd_json,
            run_script: start_command,
            project_dir: ctx.project_dir.display().to_string(),
            profile_bin_dir: ctx.profile_dir.join("bin").display().to_string(),
            history_file: ctx.history_file.display().to_string(),
            user_hook: ctx.user_hook.trim_end().to_string(),
            plan_hook: plan.shell_init_hook.join("\n"),
            original_init: ctx.original_init.as_ref().map(|init| OriginalInitView {
                path: init.path.display().to_string(),
                content: init.content.trim_end().to_string(),
            }),
        })
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env
}

/// Renders every template of `set` into `target_dir`.
///
/// The first failing template aborts the call; files written before it are
/// left in place. Returns the written paths in render order.
pub fn generate(
    target_dir: &Path,
    plan: &Plan,
    ctx: &GenerationContext,
    set: TemplateSet,
) -> Result<Vec<PathBuf>> {
    ctx.validate()?;

    let view = TemplateView::new(plan, ctx)?;
    let mut env = environment();
    for &(name, source) in set.templates() {
        env.add_template(name, source)
            .map_err(|e| DevboxError::GenerationFailure {
                template: name.to_string(),
                message: format!("{:#}", e),
            })?;
    }

    fs::create_dir_all(target_dir).map_err(|e| DevboxError::io(target_dir, e))?;

    let mut written = Vec::with_capacity(set.templates().len());
    for &(name, _) in set.templates() {
        let rendered = env
            .get_template(name)
            .and_then(|tmpl| tmpl.render(&view))
            .map_err(|e| DevboxError::GenerationFailure {
                template: name.to_string(),
                message: format!("{:#}", e),
            })?;

        let path = target_dir.join(name);
        fs::write(&path, rendered).map_err(|e| DevboxError::GenerationFailure {
            template: name.to_string(),
            message: format!("write {}: {}", path.display(), e),
        })?;
        debug!(path = %path.display(), "Generated file");
        written.push(path);
    }

    Ok(written)
}
