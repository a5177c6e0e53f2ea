use chrono::Utc;
use serde_json::json;
use tracing::warn;

use super::{render, StepLibrary};
use crate::analysis::prompt;
use crate::intent::IntentAnalysis;
use crate::state::{ResponseType, SessionState};

fn query_of(state: &SessionState) -> String {
    state.user_query.clone().unwrap_or_default()
}

impl StepLibrary {
    /// 若运行前未分类，则在此补做意图识别
    pub(super) fn route_intent(&self, state: &mut SessionState) {
        if state.intent.is_none() {
            state.intent = Some(self.classifier.classify(&query_of(state)));
        }
        if let Some(intent) = &state.intent {
            let details = json!({
                "intent_type": intent.intent_type.as_str(),
                "confidence": intent.confidence,
            });
            state.record_action("route_intent", details);
        }
    }

    pub(super) async fn chat_response(&self, state: &mut SessionState) {
        let query = query_of(state);
        let intent = state
            .intent
            .clone()
            .unwrap_or_else(IntentAnalysis::default_chat);
        let snapshot = if intent.requires_metrics {
            self.cache.get()
        } else {
            None
        };
        let context = prompt::chat_context(&intent, snapshot.as_deref());
        let user_prompt = prompt::chat_prompt(&context, &query);

        match self.complete(prompt::SYSTEM_PROMPT, &user_prompt).await {
            Ok(reply) => {
                state.ai_response = Some(reply);
                state.response_type = Some(ResponseType::Chat);
            }
            Err(e) => {
                warn!(target: "yunwei.steps", stage = "chat.llm_failed", error = %e);
                state.fail(format!("生成回复失败: {e}"));
                state.ai_response = Some(format!(
                    "抱歉，暂时无法生成回复（{e}）。如需检查系统，请发送“检查系统”。"
                ));
                state.response_type = Some(ResponseType::Error);
            }
        }
    }

    pub(super) async fn provide_system_info(&self, state: &mut SessionState) {
        let intent = state
            .intent
            .clone()
            .unwrap_or_else(IntentAnalysis::default_chat);
        let user_prompt = prompt::system_info_prompt(&query_of(state), &intent, &state.metrics);

        // 模型解读是附加内容，失败时仍输出模板报告
        let interpretation = if state.metrics.is_empty() {
            None
        } else {
            match self.complete(prompt::SYSTEM_PROMPT, &user_prompt).await {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(target: "yunwei.steps", stage = "system_info.llm_failed", error = %e);
                    None
                }
            }
        };

        let report = render::system_info_report(state, interpretation.as_deref(), Utc::now());
        state.record_action(
            "provide_system_info",
            json!({
                "metrics_count": state.metrics.len(),
                "interpreted": interpretation.is_some(),
            }),
        );
        state.ai_response = Some(report);
        state.response_type = Some(ResponseType::SystemInfo);
    }

    pub(super) async fn analyze_problem(&self, state: &mut SessionState) {
        let user_prompt = prompt::problem_prompt(
            &query_of(state),
            state.intent.as_ref(),
            &state.metrics,
            &state.alerts,
        );
        match self
            .complete(prompt::PROBLEM_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(analysis) => {
                state.record_action(
                    "analyze_problem",
                    json!({"analysis_length": analysis.chars().count()}),
                );
                state.problem_analysis = Some(analysis);
            }
            Err(e) => {
                warn!(target: "yunwei.steps", stage = "problem.llm_failed", error = %e);
                state.fail(format!("问题分析失败: {e}"));
            }
        }
    }

    pub(super) async fn provide_solution(&self, state: &mut SessionState) {
        let analysis = state.problem_analysis.clone().unwrap_or_default();
        let user_prompt = prompt::solution_prompt(&query_of(state), &analysis);

        match self
            .complete(prompt::SOLUTION_SYSTEM_PROMPT, &user_prompt)
            .await
        {
            Ok(solution) => {
                state.ai_response = Some(solution);
                state.response_type = Some(ResponseType::Solution);
                state.record_action("provide_solution", json!({"has_analysis": !analysis.is_empty()}));
            }
            Err(e) => {
                warn!(target: "yunwei.steps", stage = "solution.llm_failed", error = %e);
                if !state.has_error() {
                    state.fail(format!("解决方案生成失败: {e}"));
                }
                let fallback = if analysis.is_empty() {
                    format!("解决方案生成失败: {e}\n\n请稍后重试或手动排查。")
                } else {
                    format!("## 问题分析\n{analysis}\n\n解决方案生成失败: {e}")
                };
                state.ai_response = Some(fallback);
                state.response_type = Some(ResponseType::Error);
            }
        }
    }
}
