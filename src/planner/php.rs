//! PHP planner (Composer)

use super::Planner;
use crate::fs::FileSystem;
use crate::plan::{Plan, Stage, StageSlot};
use std::path::Path;

pub struct PhpPlanner;

impl Planner for PhpPlanner {
    fn name(&self) -> &'static str {
        "php"
    }

    fn markers(&self) -> &[&'static str] {
        &["composer.json"]
    }

    fn build_plan(&self, fs: &dyn FileSystem, root: &Path) -> Plan {
        let docroot = if fs.is_dir(&root.join("public")) {
            "public"
        } else {
            "."
        };

        Plan::new()
            .with_dev_packages(["php", "phpPackages.composer"])
            .with_runtime_packages(["php"])
            .with_stage(
                StageSlot::Install,
                Stage::new(["composer install --no-dev --no-ansi"]),
            )
            .with_stage(
                StageSlot::Start,
                Stage::new([format!("php -S 0.0.0.0:8080 -t {}", docroot)]),
            )
    }
}
