//! Planners
//!
//! A planner recognises one ecosystem from marker files in the project root
//! and proposes default packages and stage commands for it. Planners are
//! consulted in registry order and the first one that detects the project
//! supplies the inferred plan.

use crate::fs::FileSystem;
use crate::plan::Plan;
use std::path::Path;

/// Detector + plan builder for one ecosystem
pub trait Planner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Exact file names whose presence in the project root identifies the
    /// ecosystem; planners that match by pattern override `detect` instead
    fn markers(&self) -> &[&'static str];

    /// Read-only check; missing or unreadable paths count as "not detected"
    fn detect(&self, fs: &dyn FileSystem, root: &Path) -> bool {
        self.markers()
            .iter()
            .any(|marker| fs.is_file(&root.join(marker)))
    }

    /// Default plan for a detected project.
    ///
    /// Problems that make the plan unusable go into [`Plan::error`] rather
    /// than being returned, so a user who overrides every stage can still
    /// proceed.
    fn build_plan(&self, fs: &dyn FileSystem, root: &Path) -> Plan;
}

pub mod dotnet;
pub mod go;
pub mod nodejs;
pub mod php;
pub mod pip;
pub mod poetry;
pub mod registry;
pub mod rust;

pub use dotnet::DotNetPlanner;
pub use go::GoPlanner;
pub use nodejs::NodeJsPlanner;
pub use php::PhpPlanner;
pub use pip::PipPlanner;
pub use poetry::PoetryPlanner;
pub use registry::PlannerRegistry;
pub use rust::RustPlanner;

/// Reads a marker file, turning failures into the planner error message
pub(crate) fn read_marker(fs: &dyn FileSystem, root: &Path, name: &str) -> Result<String, String> {
    fs.read_to_string(&root.join(name))
        .map_err(|e| format!("failed to read {}: {:#}", name, e))
}
