//! Planner registry

use super::Planner;
use crate::fs::{FileSystem, RealFileSystem};
use crate::plan::Plan;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Ordered list of planners; order decides which ecosystem wins
#[derive(Clone)]
pub struct PlannerRegistry {
    planners: Vec<Arc<dyn Planner>>,
    fs: Arc<dyn FileSystem>,
}

impl PlannerRegistry {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            planners: Vec::new(),
            fs,
        }
    }

    pub fn with_defaults(fs: Arc<dyn FileSystem>) -> Self {
        let mut registry = Self::new(fs);
        registry.register(Arc::new(super::DotNetPlanner));
        registry.register(Arc::new(super::GoPlanner));
        registry.register(Arc::new(super::NodeJsPlanner));
        registry.register(Arc::new(super::PhpPlanner));
        registry.register(Arc::new(super::PoetryPlanner));
        registry.register(Arc::new(super::PipPlanner));
        registry.register(Arc::new(super::RustPlanner));
        registry
    }

    /// Appends a planner; it is consulted after every planner already registered
    pub fn register(&mut self, planner: Arc<dyn Planner>) {
        self.planners.push(planner);
    }

    /// First planner that recognises the project
    pub fn detect(&self, root: &Path) -> Option<&dyn Planner> {
        for planner in &self.planners {
            let detected = planner.detect(self.fs.as_ref(), root);
            debug!(planner = planner.name(), detected, "checked planner");
            if detected {
                return Some(planner.as_ref());
            }
        }
        None
    }

    /// Inferred plan for `root`; an empty plan when nothing is recognised
    pub fn infer(&self, root: &Path) -> Plan {
        match self.detect(root) {
            Some(planner) => {
                info!(planner = planner.name(), root = %root.display(), "detected project");
                let mut plan = planner.build_plan(self.fs.as_ref(), root);
                plan.planner = Some(planner.name().to_string());
                plan
            }
            None => {
                debug!(root = %root.display(), tried = ?self.names(), "no planner matched");
                Plan::new()
            }
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.planners.iter().map(|p| p.name()).collect()
    }
}

impl Default for PlannerRegistry {
    fn default() -> Self {
        Self::with_defaults(Arc::new(RealFileSystem::new()))
    }
}
