//! Rust planner (Cargo)

use super::{read_marker, Planner};
use crate::fs::FileSystem;
use crate::plan::{Plan, Stage, StageSlot};
use std::path::Path;

pub struct RustPlanner;

impl Planner for RustPlanner {
    fn name(&self) -> &'static str {
        "rust"
    }

    fn markers(&self) -> &[&'static str] {
        &["Cargo.toml"]
    }

    fn build_plan(&self, fs: &dyn FileSystem, root: &Path) -> Plan {
        let plan = Plan::new()
            .with_dev_packages(["rustc", "cargo", "gcc"])
            .with_stage(StageSlot::Install, Stage::new(["cargo fetch"]))
            .with_stage(StageSlot::Build, Stage::new(["cargo build --release"]));

        let content = match read_marker(fs, root, "Cargo.toml") {
            Ok(content) => content,
            Err(e) => return plan.with_error(e),
        };
        let manifest: toml::Table = match toml::from_str(&content) {
            Ok(manifest) => manifest,
            Err(e) => return plan.with_error(format!("Cargo.toml is not valid TOML: {}", e)),
        };

        let package_name = manifest
            .get("package")
            .and_then(|package| package.get("name"))
            .and_then(|name| name.as_str());

        match package_name {
            Some(name) => plan.with_stage(
                StageSlot::Start,
                Stage::new([format!("./target/release/{}", name)]),
            ),
            None => plan.with_warning(
                "Cargo.toml has no [package] name (workspace manifest?); the start stage is empty",
            ),
        }
    }
}
