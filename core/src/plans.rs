//! 修复方案审阅：查找、命令编辑与安全校验。

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;

use crate::error::PlanError;
use crate::model::{ExecutionResult, FixPlan};

/// How a plan reference was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMatch {
    Exact,
    /// `plan_N`, 1-based
    Index,
    /// Substring of the id or issue text. Best effort; may pick the wrong plan.
    Fuzzy,
}

/// Find a plan: exact id, then `plan_N` position, then substring.
pub fn resolve_plan(plans: &[FixPlan], plan_ref: &str) -> Result<(usize, PlanMatch), PlanError> {
    let wanted = plan_ref.trim();
    if wanted.is_empty() {
        return Err(PlanError::NotFound(plan_ref.to_string()));
    }

    if let Some(pos) = plans.iter().position(|p| p.id == wanted) {
        return Ok((pos, PlanMatch::Exact));
    }

    if let Some(n) = wanted
        .strip_prefix("plan_")
        .and_then(|n| n.parse::<usize>().ok())
    {
        if (1..=plans.len()).contains(&n) {
            return Ok((n - 1, PlanMatch::Index));
        }
    }

    plans
        .iter()
        .position(|p| p.id.contains(wanted) || p.issue.contains(wanted))
        .map(|pos| (pos, PlanMatch::Fuzzy))
        .ok_or_else(|| PlanError::NotFound(wanted.to_string()))
}

const DENYLIST: &[(&str, &str)] = &[
    (
        r"\brm\s+-[a-zA-Z]*[rR][a-zA-Z]*\s+(?:-[a-zA-Z]+\s+)*/(?:\*|\s|$)",
        "rm -rf /",
    ),
    (r"\bmkfs(?:\.\w+)?\b", "mkfs"),
    (r"\bdd\s+if=", "dd if="),
    (r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:", "fork bomb"),
    (r"\b(?:shutdown|reboot|halt|poweroff)\b", "shutdown/reboot"),
    (r">\s*/dev/sd[a-z]", "> /dev/sd*"),
    (r"\b(?:curl|wget)\b[^|]*\|\s*(?:sudo\s+)?(?:ba)?sh\b", "pipe to shell"),
    (r"\bchmod\s+(?:-R\s+)?777\s+/(?:\s|$)", "chmod 777 /"),
];

fn denylist() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        DENYLIST
            .iter()
            .filter_map(|(pattern, label)| match Regex::new(pattern) {
                Ok(re) => Some((re, *label)),
                Err(e) => {
                    tracing::warn!(target: "yunwei.plans", stage = "plans.bad_pattern", pattern, error = %e);
                    None
                }
            })
            .collect()
    })
}

/// Minimal denylist for user-edited commands. Not a sandbox.
pub fn validate_command(command: &str) -> Result<(), PlanError> {
    let command = command.trim();
    if command.is_empty() {
        return Err(PlanError::EmptyCommand);
    }
    match denylist().iter().find(|(re, _)| re.is_match(command)) {
        Some((_, label)) => Err(PlanError::UnsafeCommand((*label).to_string())),
        None => Ok(()),
    }
}

/// Replace one command of a plan. Returns the previous command text.
pub fn edit_command(
    plan: &mut FixPlan,
    index: usize,
    new_command: &str,
) -> Result<String, PlanError> {
    let len = plan.commands.len();
    if index >= len {
        return Err(PlanError::InvalidCommandIndex {
            plan_id: plan.id.clone(),
            index,
            len,
        });
    }
    validate_command(new_command)?;

    let cmd = &mut plan.commands[index];
    let previous = cmd.command.clone();
    cmd.apply_edit(new_command.trim());
    plan.user_edited = true;
    Ok(previous)
}

/// Structured result of a plan review operation.
#[derive(Debug, Clone, Serialize)]
pub struct PlanActionResult {
    pub success: bool,
    pub plan_id: String,
    pub message: String,
    pub results: Vec<ExecutionResult>,
    pub total_success: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlanActionResult {
    pub fn ok(plan_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            plan_id: plan_id.into(),
            message: message.into(),
            results: Vec::new(),
            total_success: 0,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn failed(plan_id: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            plan_id: plan_id.into(),
            message: "操作失败".to_string(),
            results: Vec::new(),
            total_success: 0,
            duration_ms: 0,
            error: Some(err.to_string()),
        }
    }

    pub fn executed(plan_id: impl Into<String>, results: Vec<ExecutionResult>, duration_ms: u64) -> Self {
        let total_success = results.iter().filter(|r| r.success).count();
        Self {
            success: total_success == results.len(),
            plan_id: plan_id.into(),
            message: format!("执行完成: 成功 {}/{}", total_success, results.len()),
            results,
            total_success,
            duration_ms,
            error: None,
        }
    }
}

/// Stamp generated ids on plans that arrived without one.
pub fn ensure_plan_ids(plans: &mut [FixPlan]) {
    for (i, plan) in plans.iter_mut().enumerate() {
        if plan.id.trim().is_empty() {
            plan.id = format!("plan_{}_{}", i + 1, Utc::now().timestamp_millis());
        }
    }
}
