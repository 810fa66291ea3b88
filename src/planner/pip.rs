//! Python planner for requirements.txt projects

use super::Planner;
use crate::fs::FileSystem;
use crate::plan::{Plan, Stage, StageSlot};
use std::path::Path;

pub struct PipPlanner;

const ENTRYPOINTS: &[&str] = &["main.py", "app.py"];

impl Planner for PipPlanner {
    fn name(&self) -> &'static str {
        "pip"
    }

    fn markers(&self) -> &[&'static str] {
        &["requirements.txt"]
    }

    fn build_plan(&self, fs: &dyn FileSystem, root: &Path) -> Plan {
        let plan = Plan::new()
            .with_dev_packages(["python3"])
            .with_runtime_packages(["python3"])
            .with_stage(
                StageSlot::Install,
                Stage::new([
                    "python -m venv .venv",
                    ".venv/bin/pip install -r requirements.txt",
                ]),
            )
            .with_shell_init_hook(["[ -f .venv/bin/activate ] && . .venv/bin/activate"]);

        match ENTRYPOINTS
            .iter()
            .find(|entry| fs.is_file(&root.join(entry)))
        {
            Some(entry) => plan.with_stage(
                StageSlot::Start,
                Stage::new([format!("python {}", entry)]),
            ),
            None => plan,
        }
    }
}
