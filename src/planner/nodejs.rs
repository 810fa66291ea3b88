//! Node.js planner (npm and yarn)

use super::{read_marker, Planner};
use crate::fs::FileSystem;
use crate::plan::{Plan, Stage, StageSlot};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub struct NodeJsPlanner;

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(default)]
    engines: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackageManager {
    Npm { lockfile: bool },
    Yarn,
}

impl PackageManager {
    fn install(&self) -> &'static str {
        match self {
            PackageManager::Npm { lockfile: true } => "npm ci",
            PackageManager::Npm { lockfile: false } => "npm install",
            PackageManager::Yarn => "yarn install --frozen-lockfile",
        }
    }

    fn run(&self, script: &str) -> String {
        match (self, script) {
            (PackageManager::Yarn, _) => format!("yarn {}", script),
            (PackageManager::Npm { .. }, "start") => "npm start".to_string(),
            (PackageManager::Npm { .. }, _) => format!("npm run {}", script),
        }
    }
}

impl NodeJsPlanner {
    /// `nodejs-18_x` for `"engines": {"node": ">=18"}`, plain `nodejs` otherwise
    fn node_package(manifest: &PackageJson) -> String {
        manifest
            .engines
            .get("node")
            .and_then(|range| {
                Regex::new(r"(\d+)")
                    .ok()?
                    .captures(range)
                    .map(|caps| format!("nodejs-{}_x", &caps[1]))
            })
            .unwrap_or_else(|| "nodejs".to_string())
    }
}

impl Planner for NodeJsPlanner {
    fn name(&self) -> &'static str {
        "nodejs"
    }

    fn markers(&self) -> &[&'static str] {
        &["package.json"]
    }

    fn build_plan(&self, fs: &dyn FileSystem, root: &Path) -> Plan {
        let content = match read_marker(fs, root, "package.json") {
            Ok(content) => content,
            Err(e) => return Plan::new().with_error(e),
        };
        let manifest: PackageJson = match serde_json::from_str(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                return Plan::new()
                    .with_dev_packages(["nodejs"])
                    .with_error(format!("package.json is not valid JSON: {}", e))
            }
        };

        let manager = if fs.is_file(&root.join("yarn.lock")) {
            PackageManager::Yarn
        } else {
            PackageManager::Npm {
                lockfile: fs.is_file(&root.join("package-lock.json")),
            }
        };

        let node = Self::node_package(&manifest);
        let mut dev_packages = vec![node.clone()];
        if manager == PackageManager::Yarn {
            dev_packages.push("yarn".to_string());
        }

        let mut plan = Plan::new()
            .with_dev_packages(dev_packages)
            .with_runtime_packages([node])
            .with_stage(StageSlot::Install, Stage::new([manager.install()]));

        if manifest.scripts.contains_key("build") {
            plan = plan.with_stage(StageSlot::Build, Stage::new([manager.run("build")]));
        }
        if manifest.scripts.contains_key("start") {
            plan = plan.with_stage(StageSlot::Start, Stage::new([manager.run("start")]));
        } else {
            plan = plan.with_warning(
                "package.json has no \"start\" script; the start stage is empty",
            );
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    const PACKAGE_JSON: &str = r#"{
        "name": "web",
        "scripts": { "build": "tsc", "start": "node dist/index.js" },
        "engines": { "node": ">=18.0.0" }
    }"#;

    #[test]
    fn test_npm_with_lockfile() {
        let fs = MockFileSystem::new();
        fs.add_file("package.json", PACKAGE_JSON);
        fs.add_file("package-lock.json", "{}");

        let plan = NodeJsPlanner.build_plan(&fs, Path::new("/mock"));
        assert_eq!(plan.dev_packages, vec!["nodejs-18_x"]);
        assert_eq!(plan.install_stage.command, vec!["npm ci"]);
        assert_eq!(plan.build_stage.command, vec!["npm run build"]);
        assert_eq!(plan.start_stage.command, vec!["npm start"]);
    }

    #[test]
    fn test_yarn_project() {
        let fs = MockFileSystem::new();
        fs.add_file("package.json", r#"{"scripts": {"build": "vite build"}}"#);
        fs.add_file("yarn.lock", "");

        let plan = NodeJsPlanner.build_plan(&fs, Path::new("/mock"));
        assert_eq!(plan.dev_packages, vec!["nodejs", "yarn"]);
        assert_eq!(plan.install_stage.command, vec!["yarn install --frozen-lockfile"]);
        assert_eq!(plan.build_stage.command, vec!["yarn build"]);
        assert!(plan.start_stage.is_absent());
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_invalid_package_json() {
        let fs = MockFileSystem::new();
        fs.add_file("package.json", "{ not json");

        let plan = NodeJsPlanner.build_plan(&fs, Path::new("/mock"));
        assert!(plan.is_invalid());
        assert!(plan.error.unwrap().contains("package.json is not valid JSON"));
    }

    #[test]
    fn test_npm_without_lockfile() {
        let fs = MockFileSystem::new();
        fs.add_file("package.json", "{}");

        let plan = NodeJsPlanner.build_plan(&fs, Path::new("/mock"));
        assert_eq!(plan.install_stage.command, vec!["npm install"]);
        assert!(plan.build_stage.is_absent());
    }
}
