use serde::{Deserialize, Serialize};

use crate::intent::{IntentAnalysis, IntentType};

/// 工作流标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowId {
    Chat,
    SystemCheck,
    SystemInfo,
    Troubleshoot,
}

impl WorkflowId {
    pub const ALL: [WorkflowId; 4] = [
        Self::Chat,
        Self::SystemCheck,
        Self::SystemInfo,
        Self::Troubleshoot,
    ];

    /// Pick the workflow for a classification.
    ///
    /// `CommandExec`, `Performance` and `Optimization` have no workflow of their
    /// own and are answered by the chat workflow.
    pub fn select(intent: &IntentAnalysis) -> Self {
        match intent.intent_type {
            IntentType::SystemCheck => Self::SystemCheck,
            IntentType::SystemInfo => Self::SystemInfo,
            IntentType::Troubleshoot => Self::Troubleshoot,
            IntentType::Chat
            | IntentType::CommandExec
            | IntentType::Performance
            | IntentType::Optimization => Self::Chat,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::SystemCheck => "system_check",
            Self::SystemInfo => "system_info",
            Self::Troubleshoot => "troubleshoot",
        }
    }
}

impl std::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 步骤标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    RouteIntent,
    ChatResponse,
    CollectMetrics,
    CollectBasicMetrics,
    CollectRelevantMetrics,
    AnalyzeSystem,
    GeneratePlan,
    ExecutePlan,
    ReportResults,
    HandleErrors,
    ProvideSystemInfo,
    AnalyzeProblem,
    ProvideSolution,
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RouteIntent => "route_intent",
            Self::ChatResponse => "chat_response",
            Self::CollectMetrics => "collect_metrics",
            Self::CollectBasicMetrics => "collect_basic_metrics",
            Self::CollectRelevantMetrics => "collect_relevant_metrics",
            Self::AnalyzeSystem => "analyze_system",
            Self::GeneratePlan => "generate_plan",
            Self::ExecutePlan => "execute_plan",
            Self::ReportResults => "report_results",
            Self::HandleErrors => "handle_errors",
            Self::ProvideSystemInfo => "provide_system_info",
            Self::AnalyzeProblem => "analyze_problem",
            Self::ProvideSolution => "provide_solution",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
