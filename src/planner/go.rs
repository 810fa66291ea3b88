//! Go planner

use super::{read_marker, Planner};
use crate::fs::FileSystem;
use crate::plan::{Plan, Stage, StageSlot};
use regex::Regex;
use std::path::Path;

pub struct GoPlanner;

impl GoPlanner {
    /// Nix attribute for the toolchain named by the `go` directive
    fn go_package(go_mod: &str) -> String {
        // go.mod: go 1.21
        Regex::new(r"(?m)^go\s+(\d+)\.(\d+)")
            .ok()
            .and_then(|re| re.captures(go_mod))
            .map(|caps| format!("go_{}_{}", &caps[1], &caps[2]))
            .unwrap_or_else(|| "go".to_string())
    }
}

impl Planner for GoPlanner {
    fn name(&self) -> &'static str {
        "go"
    }

    fn markers(&self) -> &[&'static str] {
        &["go.mod"]
    }

    fn build_plan(&self, fs: &dyn FileSystem, root: &Path) -> Plan {
        let go_mod = match read_marker(fs, root, "go.mod") {
            Ok(content) => content,
            Err(e) => return Plan::new().with_error(e),
        };

        Plan::new()
            .with_dev_packages([Self::go_package(&go_mod)])
            .with_stage(StageSlot::Install, Stage::new(["go get"]))
            .with_stage(
                StageSlot::Build,
                Stage::new(["CGO_ENABLED=0 go build -o app"]),
            )
            .with_stage(StageSlot::Start, Stage::new(["./app"]))
    }
}
