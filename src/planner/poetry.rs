//! Python planner for Poetry projects

use super::{read_marker, Planner};
use crate::fs::FileSystem;
use crate::plan::{Plan, Stage, StageSlot};
use std::path::Path;

pub struct PoetryPlanner;

impl PoetryPlanner {
    fn poetry_table(content: &str) -> Option<toml::Table> {
        let manifest: toml::Table = toml::from_str(content).ok()?;
        manifest
            .get("tool")?
            .as_table()?
            .get("poetry")?
            .as_table()
            .cloned()
    }
}

impl Planner for PoetryPlanner {
    fn name(&self) -> &'static str {
        "poetry"
    }

    fn markers(&self) -> &[&'static str] {
        &["pyproject.toml"]
    }

    fn detect(&self, fs: &dyn FileSystem, root: &Path) -> bool {
        fs.read_to_string(&root.join("pyproject.toml"))
            .map(|content| content.contains("[tool.poetry"))
            .unwrap_or(false)
    }

    fn build_plan(&self, fs: &dyn FileSystem, root: &Path) -> Plan {
        let base = Plan::new()
            .with_dev_packages(["python3", "poetry"])
            .with_runtime_packages(["python3"])
            .with_stage(
                StageSlot::Install,
                Stage::new(["poetry install --no-root --no-interaction"]),
            );

        let content = match read_marker(fs, root, "pyproject.toml") {
            Ok(content) => content,
            Err(e) => return base.with_error(e),
        };
        let Some(poetry) = Self::poetry_table(&content) else {
            return base.with_error("pyproject.toml has no readable [tool.poetry] table");
        };

        let script = poetry
            .get("scripts")
            .and_then(|scripts| scripts.as_table())
            .and_then(|scripts| scripts.keys().next().cloned());
        let Some(script) = script else {
            return base.with_error(
                "pyproject.toml declares no [tool.poetry.scripts] entry to package as app.pex",
            );
        };

        // start runs the archive produced by build
        base.with_stage(
            StageSlot::Build,
            Stage::new([
                "poetry export -f requirements.txt --output requirements.txt --without-hashes"
                    .to_string(),
                format!(
                    "poetry run pex . -r requirements.txt -o app.pex --script {}",
                    script
                ),
            ]),
        )
        .with_stage(StageSlot::Start, Stage::new(["python ./app.pex"]))
        .pin(StageSlot::Build, &[StageSlot::Start])
    }
}
