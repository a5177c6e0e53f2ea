//! Branch predicates evaluated after steps with conditional edges.
//!
//! Each returns one of the labels declared on its edge in `definitions`.

use crate::state::SessionState;

pub const SUCCESS: &str = "success";
pub const ERROR: &str = "error";
pub const NEEDS_ACTION: &str = "needs_action";
pub const HEALTHY: &str = "healthy";
pub const EXECUTE: &str = "execute";
pub const SKIP_EXECUTION: &str = "skip_execution";

/// After collection: an error or an empty metric set sends the run to error handling.
pub fn metrics_check(state: &SessionState) -> &'static str {
    if state.has_error() || state.metrics.is_empty() {
        ERROR
    } else {
        SUCCESS
    }
}

/// After analysis: plan only when the report names issues.
pub fn analysis_check(state: &SessionState) -> &'static str {
    if state.has_error() {
        return ERROR;
    }
    match &state.analysis {
        None => ERROR,
        Some(_) if !state.detected_issues.is_empty() => NEEDS_ACTION,
        Some(_) => HEALTHY,
    }
}

/// After planning: execute a non-empty plan when auto-fix is allowed or urgency is high.
pub fn plan_check(state: &SessionState) -> &'static str {
    if state.execution_plan.is_empty() {
        return SKIP_EXECUTION;
    }
    match &state.analysis {
        Some(report) if report.auto_fixable || report.urgency.is_pressing() => EXECUTE,
        _ => SKIP_EXECUTION,
    }
}
