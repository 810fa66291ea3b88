//! Output formatting for `devbox plan`
//!
//! JSON and YAML are the serialized [`Plan`]; the human format is a short
//! report meant for a terminal.

use anyhow::{Context, Result};

use crate::plan::{Plan, StageSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_plan(&self, plan: &Plan) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(plan).context("Failed to serialize plan to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(plan).context("Failed to serialize plan to YAML")
            }
            OutputFormat::Human => Ok(self.format_plan_human(plan)),
        }
    }

    fn format_plan_human(&self, plan: &Plan) -> String {
        let mut output = String::new();

        output.push_str(&format!("Plan ({})\n", plan.planner_name()));
        output.push_str(&"\u{2501}".repeat(42));
        output.push_str("\n\n");

        output.push_str(&format!(
            "Dev packages:     {}\n",
            list_or_none(&plan.dev_packages)
        ));
        output.push_str(&format!(
            "Runtime packages: {}\n",
            list_or_none(&plan.runtime_packages)
        ));

        for slot in StageSlot::ALL {
            let stage = plan.stage(slot);
            let pinned = if plan.is_pinned(slot) {
                " (pinned)"
            } else {
                ""
            };
            output.push_str(&format!("\n{} stage{}:\n", capitalize(slot), pinned));
            if stage.is_absent() {
                output.push_str("  (none)\n");
            }
            for command in &stage.command {
                output.push_str(&format!("  $ {}\n", command));
            }
        }

        if !plan.shell_init_hook.is_empty() {
            output.push_str("\nShell init hook:\n");
            for line in &plan.shell_init_hook {
                output.push_str(&format!("  {}\n", line));
            }
        }

        if let Some(error) = &plan.error {
            output.push_str(&format!("\n\u{2717} Error: {}\n", error));
        }

        if !plan.warnings.is_empty() {
            output.push_str("\nWarnings:\n");
            for warning in &plan.warnings {
                output.push_str(&format!("  \u{26a0} {}\n", warning));
            }
        }

        output
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

fn capitalize(slot: StageSlot) -> String {
    let name = slot.to_string();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    }
}
