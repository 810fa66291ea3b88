//! Environment plans
//!
//! A [`Plan`] describes which packages an environment needs and which shell
//! commands make up its install, build and start stages. Plans come from three
//! places: the user's `devbox.json`, a planner that recognised the project
//! tree, and [`merge_user_plan`] which combines the two.

mod merge;

pub use merge::{merge_user_plan, MergeError};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Accepts `"cmd"`, `["a", "b"]` or `null`
pub(crate) fn deserialize_commands<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(cmd)) => vec![cmd],
        Some(OneOrMany::Many(cmds)) => cmds,
    })
}

/// One lifecycle stage: an ordered list of shell commands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default, deserialize_with = "deserialize_commands")]
    pub command: Vec<String>,
}

impl Stage {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// A stage without commands is treated as not declared
    pub fn is_absent(&self) -> bool {
        self.command.is_empty()
    }

    /// Commands chained so that the first failure stops the stage
    pub fn command_line(&self) -> Option<String> {
        if self.is_absent() {
            None
        } else {
            Some(self.command.join(" && "))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageSlot {
    Install,
    Build,
    Start,
}

impl StageSlot {
    pub const ALL: [StageSlot; 3] = [StageSlot::Install, StageSlot::Build, StageSlot::Start];
}

impl fmt::Display for StageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageSlot::Install => "install",
            StageSlot::Build => "build",
            StageSlot::Start => "start",
        };
        f.write_str(name)
    }
}

/// A stage whose output other stages consume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePin {
    pub slot: StageSlot,
    /// Stages that run what `slot` produces
    pub dependents: Vec<StageSlot>,
}

/// Packages plus install/build/start stages for an environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub dev_packages: Vec<String>,
    #[serde(default)]
    pub runtime_packages: Vec<String>,
    #[serde(default)]
    pub install_stage: Stage,
    #[serde(default)]
    pub build_stage: Stage,
    #[serde(default)]
    pub start_stage: Stage,

    /// Lines sourced by the generated shellrc, run from the project root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shell_init_hook: Vec<String>,

    /// Stages the planner's other stages depend on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pinned_stages: Vec<StagePin>,

    /// Planner that produced (or contributed to) this plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dev_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dev_packages = union(&[], &packages.into_iter().map(Into::into).collect::<Vec<_>>());
        self
    }

    pub fn with_runtime_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.runtime_packages =
            union(&[], &packages.into_iter().map(Into::into).collect::<Vec<_>>());
        self
    }

    pub fn with_stage(mut self, slot: StageSlot, stage: Stage) -> Self {
        *self.stage_mut(slot) = stage;
        self
    }

    pub fn with_shell_init_hook<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell_init_hook = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Marks `slot` as producing something `dependents` rely on
    pub fn pin(mut self, slot: StageSlot, dependents: &[StageSlot]) -> Self {
        self.pinned_stages.retain(|pin| pin.slot != slot);
        self.pinned_stages.push(StagePin {
            slot,
            dependents: dependents.to_vec(),
        });
        self
    }

    pub fn is_pinned(&self, slot: StageSlot) -> bool {
        self.pinned_stages.iter().any(|pin| pin.slot == slot)
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        push_unique(&mut self.warnings, warning.into());
        self
    }

    pub fn stage(&self, slot: StageSlot) -> &Stage {
        match slot {
            StageSlot::Install => &self.install_stage,
            StageSlot::Build => &self.build_stage,
            StageSlot::Start => &self.start_stage,
        }
    }

    pub fn stage_mut(&mut self, slot: StageSlot) -> &mut Stage {
        match slot {
            StageSlot::Install => &mut self.install_stage,
            StageSlot::Build => &mut self.build_stage,
            StageSlot::Start => &mut self.start_stage,
        }
    }

    pub fn defines_all_stages(&self) -> bool {
        StageSlot::ALL.iter().all(|slot| !self.stage(*slot).is_absent())
    }

    /// True when the plan contributes nothing: no packages, stages or hooks
    pub fn is_empty(&self) -> bool {
        self.dev_packages.is_empty()
            && self.runtime_packages.is_empty()
            && StageSlot::ALL.iter().all(|slot| self.stage(*slot).is_absent())
            && self.shell_init_hook.is_empty()
            && self.error.is_none()
    }

    pub fn is_invalid(&self) -> bool {
        self.error.is_some()
    }

    pub fn planner_name(&self) -> &str {
        self.planner.as_deref().unwrap_or("inferred")
    }
}

/// Ordered union: everything in `first`, then entries of `second` not yet seen
pub fn union(first: &[String], second: &[String]) -> Vec<String> {
    let mut merged = Vec::with_capacity(first.len() + second.len());
    for pkg in first.iter().chain(second) {
        push_unique(&mut merged, pkg.clone());
    }
    merged
}

/// Every entry of `list` that is not in `remove`, order preserved
pub fn exclude(list: &[String], remove: &[String]) -> Vec<String> {
    list.iter()
        .filter(|pkg| !remove.contains(pkg))
        .cloned()
        .collect()
}

pub(crate) fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
