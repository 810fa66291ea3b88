//! .NET planner (C# projects)

use super::Planner;
use crate::fs::FileSystem;
use crate::plan::{Plan, Stage, StageSlot};
use std::path::Path;

pub struct DotNetPlanner;

impl DotNetPlanner {
    /// Stem of the first `*.csproj` in the root, in name order
    fn project_name(fs: &dyn FileSystem, root: &Path) -> Option<String> {
        let entries = fs.read_dir(root).ok()?;
        entries
            .iter()
            .filter(|entry| entry.is_file())
            .map(|entry| Path::new(entry.file_name()))
            .find(|name| name.extension().is_some_and(|ext| ext == "csproj"))
            .and_then(|name| name.file_stem())
            .map(|stem| stem.to_string_lossy().to_string())
    }
}

impl Planner for DotNetPlanner {
    fn name(&self) -> &'static str {
        "dotnet"
    }

    /// No fixed file name; `detect` scans the root for a `.csproj` extension
    fn markers(&self) -> &[&'static str] {
        &[]
    }

    fn detect(&self, fs: &dyn FileSystem, root: &Path) -> bool {
        Self::project_name(fs, root).is_some()
    }

    fn build_plan(&self, fs: &dyn FileSystem, root: &Path) -> Plan {
        let plan = Plan::new()
            .with_dev_packages(["dotnet-sdk"])
            .with_runtime_packages(["dotnet-runtime"])
            .with_stage(StageSlot::Install, Stage::new(["dotnet restore"]))
            .with_stage(
                StageSlot::Build,
                Stage::new(["dotnet publish -c Release -o out"]),
            );

        match Self::project_name(fs, root) {
            Some(project) => plan.with_stage(
                StageSlot::Start,
                Stage::new([format!("dotnet out/{}.dll", project)]),
            ),
            None => plan.with_error("no .csproj file found in the project root"),
        }
    }
}
