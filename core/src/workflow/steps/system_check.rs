use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use super::{render, StepLibrary};
use crate::analysis::{generate_execution_plan, parse_analysis, prompt};
use crate::providers::{run_commands, CommandSpec};
use crate::state::{ExecutionPhase, ResponseType, SessionState, SystemStatus};

impl StepLibrary {
    pub(super) async fn analyze_system(&self, state: &mut SessionState) {
        let user_prompt = prompt::analysis_prompt(
            &state.metrics,
            &state.alerts,
            &self.settings.thresholds,
            Utc::now(),
        );
        let raw = match self.complete(prompt::SYSTEM_PROMPT, &user_prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(target: "yunwei.steps", stage = "analysis.llm_failed", error = %e);
                state.fail(format!("系统分析失败: {e}"));
                return;
            }
        };

        let outcome = parse_analysis(&raw);
        let parse_fallback = outcome.is_fallback();
        if parse_fallback {
            warn!(target: "yunwei.steps", stage = "analysis.parse_fallback", raw_len = raw.len());
        }
        let report = outcome.into_report();
        let details = json!({
            "analysis_urgency": report.urgency.as_str(),
            "auto_fixable": report.auto_fixable,
            "issues_count": report.issues.len(),
            "fix_plans_count": report.fix_plans.as_ref().map_or(0, Vec::len),
            "parse_fallback": parse_fallback,
        });

        let replaced = state.apply_analysis(raw, report);
        if !replaced {
            info!(
                target: "yunwei.steps",
                stage = "analysis.user_plans_kept",
                session_id = %state.session_id
            );
        }
        state.record_action("analyze_system", details);
    }

    pub(super) fn generate_plan(&self, state: &mut SessionState) {
        let Some(report) = state.analysis.as_ref() else {
            state.fail("缺少分析结果，无法生成执行计划");
            return;
        };
        let plan = generate_execution_plan(report);
        let details = json!({
            "plan_commands": plan.len(),
            "auto_fix_recommended": report.auto_fixable,
            "urgency": report.urgency.as_str(),
        });
        state.set_execution_plan(plan);
        state.record_action("generate_plan", details);
    }

    /// Runs the whole plan, continuing past failed commands.
    pub(super) async fn execute_plan(&self, state: &mut SessionState) {
        if state.execution_plan.is_empty() {
            return;
        }
        if let Err(e) = state.transition_phase(ExecutionPhase::Executing) {
            state.fail(format!("计划执行失败: {e}"));
            return;
        }

        let specs: Vec<CommandSpec> = state
            .execution_plan
            .iter()
            .map(|cmd| CommandSpec::new(cmd.clone(), self.settings.command_timeout))
            .collect();

        match run_commands(self.services.executor.as_ref(), &specs).await {
            Ok(results) => {
                let executed = results.len();
                for result in results {
                    state.add_execution_result(result);
                }
                let success_count = state.successful_executions();
                // 单条命令失败不算计划失败
                let _ = state.transition_phase(ExecutionPhase::Completed);
                state.record_action(
                    "execute_plan",
                    json!({"commands_executed": executed, "success_count": success_count}),
                );
            }
            Err(e) => {
                let _ = state.transition_phase(ExecutionPhase::Failed);
                state.fail(format!("计划执行失败: {e}"));
            }
        }
    }

    /// Final report. An error report written by `handle_errors` stays on top.
    pub(super) fn report_results(&self, state: &mut SessionState) {
        let report = render::system_check_report(state, Utc::now());
        let response = match (state.response_type, state.ai_response.take()) {
            (Some(ResponseType::Error), Some(error_report)) => {
                format!("{error_report}\n{report}")
            }
            _ => {
                state.response_type = Some(ResponseType::SystemCheck);
                report
            }
        };
        state.record_action(
            "report_results",
            json!({
                "report_length": response.chars().count(),
                "system_status": state.system_status.as_str(),
            }),
        );
        state.ai_response = Some(response);
    }

    pub(super) fn handle_errors(&self, state: &mut SessionState) {
        let message = state
            .error_message
            .clone()
            .unwrap_or_else(|| "未知错误".to_string());
        state.system_status = SystemStatus::Critical;
        state.ai_response = Some(render::error_report(&message, Utc::now()));
        state.response_type = Some(ResponseType::Error);
        state.record_action("handle_errors", json!({"error_message": message}));
    }
}
