//! Plan merging
//!
//! Combines the plan declared in `devbox.json` with the plan inferred from the
//! project tree:
//! - Packages: union, user packages first
//! - Stages: a declared user stage replaces the inferred stage entirely
//! - Shell init hook: user hook if any, otherwise the inferred hook
//!
//! A merge fails only on explicit contradictions reported by the planner.

use super::{push_unique, union, Plan, StageSlot};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The planner recognised the project but could not build a plan for it
    #[error("the {planner} planner could not build a plan: {reason}. Declare install_stage, build_stage and start_stage in devbox.json to override it")]
    PlannerFailed { planner: String, reason: String },

    /// The user replaced a stage that an inherited stage depends on
    #[error("{slot} stage {user:?} replaces the {planner} planner's {inferred:?}, which its {dependent} stage depends on. Declare {dependent}_stage in devbox.json or drop the {slot}_stage override")]
    PinnedStageOverridden {
        planner: String,
        slot: StageSlot,
        dependent: StageSlot,
        user: Vec<String>,
        inferred: Vec<String>,
    },
}

/// Merges `user` over `inferred`, returning a fresh plan.
///
/// Neither input is modified. Advisory messages end up in
/// [`Plan::warnings`] of the result.
pub fn merge_user_plan(user: &Plan, inferred: &Plan) -> Result<Plan, MergeError> {
    let planner = inferred.planner_name().to_string();
    let fully_overridden = user.defines_all_stages();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(reason) = &inferred.error {
        if !fully_overridden {
            return Err(MergeError::PlannerFailed {
                planner,
                reason: reason.clone(),
            });
        }
        push_unique(
            &mut warnings,
            format!(
                "ignoring {} planner error because devbox.json declares every stage: {}",
                planner, reason
            ),
        );
    }

    if !fully_overridden {
        check_pinned_stages(user, inferred, &planner)?;
    }

    let mut merged = Plan {
        dev_packages: union(&user.dev_packages, &inferred.dev_packages),
        runtime_packages: union(&user.runtime_packages, &inferred.runtime_packages),
        planner: inferred.planner.clone(),
        ..Plan::default()
    };

    for slot in StageSlot::ALL {
        let user_stage = user.stage(slot);
        if user_stage.is_absent() {
            *merged.stage_mut(slot) = inferred.stage(slot).clone();
            merged.pinned_stages.extend(
                inferred
                    .pinned_stages
                    .iter()
                    .filter(|pin| pin.slot == slot)
                    .cloned(),
            );
        } else {
            debug!(%slot, "user stage overrides inferred stage");
            *merged.stage_mut(slot) = user_stage.clone();
        }
    }

    merged.shell_init_hook = if user.shell_init_hook.is_empty() {
        inferred.shell_init_hook.clone()
    } else {
        user.shell_init_hook.clone()
    };

    if inferred.is_empty() {
        push_unique(
            &mut warnings,
            "no ecosystem detected, using the plan declared in devbox.json only".to_string(),
        );
    } else if fully_overridden && inferred.error.is_none() {
        push_unique(
            &mut warnings,
            format!(
                "a {} plan was inferred but devbox.json overrides every stage of it",
                planner
            ),
        );
    }

    for warning in user.warnings.iter().chain(&inferred.warnings).cloned() {
        push_unique(&mut merged.warnings, warning);
    }
    for warning in warnings {
        push_unique(&mut merged.warnings, warning);
    }

    Ok(merged)
}

fn check_pinned_stages(user: &Plan, inferred: &Plan, planner: &str) -> Result<(), MergeError> {
    for pin in &inferred.pinned_stages {
        let user_stage = user.stage(pin.slot);
        let inferred_stage = inferred.stage(pin.slot);
        if user_stage.is_absent() || user_stage == inferred_stage {
            continue;
        }

        let inherited_dependent = pin.dependents.iter().find(|&&dependent| {
            user.stage(dependent).is_absent() && !inferred.stage(dependent).is_absent()
        });
        if let Some(&dependent) = inherited_dependent {
            return Err(MergeError::PinnedStageOverridden {
                planner: planner.to_string(),
                slot: pin.slot,
                dependent,
                user: user_stage.command.clone(),
                inferred: inferred_stage.command.clone(),
            });
        }
    }
    Ok(())
}
