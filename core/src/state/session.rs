//! 会话状态：一次工作流运行内被各步骤原地修改的聚合体。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::transitions::{PhaseTransition, StatusTransition, TransitionError};
use super::types::{ActionRecord, ConversationEntry, ExecutionPhase, ResponseType, SystemStatus};
use crate::analysis::AnalysisReport;
use crate::intent::IntentAnalysis;
use crate::model::{Alert, AlertLevel, ExecutionResult, FixPlan, Metric};

/// 会话状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub system_status: SystemStatus,

    // 监控数据
    pub metrics: Vec<Metric>,
    pub alerts: Vec<Alert>,

    // 分析结果
    /// 模型原始回复
    pub analysis_result: Option<String>,
    pub analysis: Option<AnalysisReport>,
    pub detected_issues: Vec<String>,

    // 修复计划
    pub fix_plans: Vec<FixPlan>,
    pub selected_plan: Option<String>,
    pub execution_plan: Vec<String>,
    pub execution_results: Vec<ExecutionResult>,
    pub execution_phase: ExecutionPhase,

    // 用户交互
    pub user_query: Option<String>,
    pub ai_response: Option<String>,
    pub response_type: Option<ResponseType>,
    pub requires_approval: bool,
    pub user_approval: Option<bool>,
    pub intent: Option<IntentAnalysis>,
    pub problem_analysis: Option<String>,

    pub context: Map<String, Value>,
    pub error_message: Option<String>,

    // 历史记录
    pub conversation_history: Vec<ConversationEntry>,
    pub action_history: Vec<ActionRecord>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            system_status: SystemStatus::Unknown,
            metrics: Vec::new(),
            alerts: Vec::new(),
            analysis_result: None,
            analysis: None,
            detected_issues: Vec::new(),
            fix_plans: Vec::new(),
            selected_plan: None,
            execution_plan: Vec::new(),
            execution_results: Vec::new(),
            execution_phase: ExecutionPhase::Idle,
            user_query: None,
            ai_response: None,
            response_type: None,
            requires_approval: false,
            user_approval: None,
            intent: None,
            problem_analysis: None,
            context: Map::new(),
            error_message: None,
            conversation_history: Vec::new(),
            action_history: Vec::new(),
        }
    }

    /// Clear per-run fields before a new run.
    ///
    /// Session id, histories, context and user-edited fix plans survive.
    pub fn reset_for_run(&mut self, user_query: Option<String>) {
        self.timestamp = Utc::now();
        self.system_status = SystemStatus::Unknown;
        self.metrics.clear();
        self.alerts.clear();
        self.analysis_result = None;
        self.analysis = None;
        self.detected_issues.clear();
        self.fix_plans.retain(|p| p.user_edited);
        self.selected_plan = None;
        self.execution_plan.clear();
        self.execution_results.clear();
        self.execution_phase = ExecutionPhase::Idle;
        self.user_query = user_query;
        self.ai_response = None;
        self.response_type = None;
        self.requires_approval = !self.fix_plans.is_empty();
        self.user_approval = None;
        self.intent = None;
        self.problem_analysis = None;
        self.error_message = None;
    }

    pub fn has_error(&self) -> bool {
        self.error_message.is_some()
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Store a collection pass: metrics replace, alerts append, status only escalates.
    pub fn apply_collection(&mut self, metrics: Vec<Metric>, alerts: Vec<Alert>) {
        self.metrics = metrics;
        self.timestamp = Utc::now();
        self.system_status = StatusTransition::after_collection(self.system_status);
        for alert in alerts {
            self.add_alert(alert);
        }
    }

    pub fn add_alert(&mut self, alert: Alert) {
        self.system_status = StatusTransition::apply_alert(self.system_status, alert.level);
        self.alerts.push(alert);
    }

    pub fn critical_alert_count(&self) -> usize {
        self.alerts
            .iter()
            .filter(|a| a.level == AlertLevel::Critical)
            .count()
    }

    /// Record an analysis. Returns false when existing user-edited plans were kept.
    pub fn apply_analysis(&mut self, raw: String, report: AnalysisReport) -> bool {
        self.analysis_result = Some(raw);
        self.detected_issues = report.issues.clone();
        let merged = match report.fix_plans.clone() {
            Some(plans) => self.merge_fix_plans(plans),
            None => true,
        };
        self.analysis = Some(report);
        merged
    }

    /// Replace the plan list unless any current plan carries the user-edited flag.
    pub fn merge_fix_plans(&mut self, plans: Vec<FixPlan>) -> bool {
        if self.fix_plans.iter().any(|p| p.user_edited) {
            return false;
        }
        self.set_fix_plans(plans);
        true
    }

    pub fn set_fix_plans(&mut self, plans: Vec<FixPlan>) {
        self.requires_approval = !plans.is_empty();
        self.fix_plans = plans;
    }

    pub fn set_execution_plan(&mut self, plan: Vec<String>) {
        self.requires_approval = !plan.is_empty() || !self.fix_plans.is_empty();
        self.execution_plan = plan;
    }

    pub fn add_execution_result(&mut self, result: ExecutionResult) {
        self.execution_results.push(result);
    }

    pub fn successful_executions(&self) -> usize {
        self.execution_results.iter().filter(|r| r.success).count()
    }

    pub fn transition_phase(&mut self, to: ExecutionPhase) -> Result<(), TransitionError> {
        PhaseTransition::validate(self.execution_phase, to)?;
        self.execution_phase = to;
        Ok(())
    }

    pub fn record_action(&mut self, action_type: &str, details: Value) {
        self.action_history.push(ActionRecord {
            action_type: action_type.to_string(),
            details,
            timestamp: Utc::now(),
        });
    }

    pub fn add_conversation(&mut self, user: impl Into<String>, ai: impl Into<String>) {
        self.conversation_history.push(ConversationEntry {
            user: user.into(),
            ai: ai.into(),
            timestamp: Utc::now(),
        });
    }

    /// 状态摘要
    pub fn summary(&self) -> String {
        let mut summary = format!("系统状态: {}\n", self.system_status);
        summary.push_str(&format!("监控指标: {}个\n", self.metrics.len()));
        summary.push_str(&format!(
            "告警数量: {}个 (严重: {})\n",
            self.alerts.len(),
            self.critical_alert_count()
        ));
        if !self.detected_issues.is_empty() {
            summary.push_str(&format!("检测到问题: {}个\n", self.detected_issues.len()));
        }
        if !self.execution_plan.is_empty() {
            summary.push_str(&format!("待执行操作: {}个\n", self.execution_plan.len()));
        }
        if self.execution_phase != ExecutionPhase::Idle {
            summary.push_str(&format!(
                "执行阶段: {}\n",
                PhaseTransition::phase_description(self.execution_phase)
            ));
        }
        summary
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisReport;
    use crate::model::PlanCommand;
    use pretty_assertions::assert_eq;

    fn alert(level: AlertLevel) -> Alert {
        Alert {
            metric_name: "cpu_usage_percent".to_string(),
            level,
            message: "CPU使用率过高".to_string(),
            value: 99.0,
            threshold: 80.0,
            timestamp: Utc::now(),
            suggested_actions: Vec::new(),
        }
    }

    fn edited_plan() -> FixPlan {
        let mut cmd = PlanCommand::new(1, "清理", "rm -rf /tmp/cache");
        cmd.apply_edit("rm -rf /tmp/cache/app");
        let mut plan = FixPlan::new("plan_1", "磁盘空间不足").with_command(cmd);
        plan.user_edited = true;
        plan
    }

    #[test]
    fn test_collection_escalates_status() {
        let mut state = SessionState::new();
        state.apply_collection(
            vec![Metric::evaluated("cpu_usage_percent", 10.0, "percent", Some(80.0))],
            Vec::new(),
        );
        assert_eq!(state.system_status, SystemStatus::Healthy);

        state.apply_collection(
            Vec::new(),
            vec![alert(AlertLevel::Critical), alert(AlertLevel::Warning)],
        );
        assert_eq!(state.system_status, SystemStatus::Critical);
        assert_eq!(state.critical_alert_count(), 1);
    }

    #[test]
    fn test_user_edited_plans_survive_analysis() {
        let mut state = SessionState::new();
        let plan = edited_plan();
        state.set_fix_plans(vec![plan.clone()]);

        let mut report = AnalysisReport::fallback("a", "b", "c");
        report.fix_plans = Some(vec![FixPlan::new("plan_1", "新的方案")
            .with_command(PlanCommand::new(1, "new", "echo new"))]);

        assert!(!state.apply_analysis("raw".to_string(), report));
        assert_eq!(state.fix_plans, vec![plan]);
        assert_eq!(state.fix_plans[0].commands[0].command, "rm -rf /tmp/cache/app");
    }

    #[test]
    fn test_unedited_plans_replaced() {
        let mut state = SessionState::new();
        state.set_fix_plans(vec![FixPlan::new("plan_1", "旧")]);
        let mut report = AnalysisReport::fallback("a", "b", "c");
        report.fix_plans = Some(vec![FixPlan::new("plan_9", "新")]);

        assert!(state.apply_analysis("raw".to_string(), report));
        assert_eq!(state.fix_plans[0].id, "plan_9");
        assert!(state.requires_approval);
    }

    #[test]
    fn test_reset_keeps_identity_and_history() {
        let mut state = SessionState::new();
        let id = state.session_id.clone();
        state.add_conversation("你好", "您好");
        state.record_action("collect_metrics", serde_json::json!({"metrics_count": 3}));
        state.fail("boom");
        state.add_alert(alert(AlertLevel::Critical));
        state.set_fix_plans(vec![FixPlan::new("plan_2", "x"), edited_plan()]);

        state.reset_for_run(Some("检查系统".to_string()));

        assert_eq!(state.session_id, id);
        assert_eq!(state.conversation_history.len(), 1);
        assert_eq!(state.action_history.len(), 1);
        assert!(state.error_message.is_none());
        assert!(state.alerts.is_empty());
        assert_eq!(state.system_status, SystemStatus::Unknown);
        assert_eq!(state.fix_plans.len(), 1);
        assert_eq!(state.fix_plans[0].id, "plan_1");
        assert_eq!(state.user_query.as_deref(), Some("检查系统"));
    }

    #[test]
    fn test_summary() {
        let mut state = SessionState::new();
        state.apply_collection(
            vec![Metric::evaluated("cpu_usage_percent", 99.0, "percent", Some(80.0))],
            vec![alert(AlertLevel::Critical)],
        );
        state.detected_issues = vec!["CPU使用率过高".to_string()];
        state.set_execution_plan(vec!["ps aux".to_string()]);

        assert_eq!(
            state.summary(),
            "系统状态: critical\n监控指标: 1个\n告警数量: 1个 (严重: 1)\n检测到问题: 1个\n待执行操作: 1个\n"
        );

        state.transition_phase(ExecutionPhase::Executing).unwrap();
        assert!(state.summary().ends_with("执行阶段: 执行中\n"));
    }
}
