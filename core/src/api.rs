//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `yunwei_core::api` instead of reaching into internal modules.

pub use crate::analysis::{parse_analysis, AnalysisOutcome, AnalysisReport, Urgency};
pub use crate::assistant::{OpsAssistant, RunOutcome};
pub use crate::cache::{Clock, ManualClock, MetricsCache, MetricsSnapshot, SystemClock};
pub use crate::config::{
    get_yunwei_data_dir, load_default, load_from_path, AppConfig, ExecutorConfig, LlmConfig,
    LoggingConfig, MetricsConfig, SessionConfig, ThresholdsConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{GraphError, PlanError, ProviderError, WorkflowError};
pub use crate::intent::{IntentAnalysis, IntentClassifier, IntentType};
pub use crate::journal::JournalTx;
pub use crate::model::{
    detect_alerts, Alert, AlertLevel, ExecutionResult, FixPlan, Metric, PlanCommand, Priority,
    RiskLevel,
};
pub use crate::plans::{PlanActionResult, PlanMatch};
pub use crate::providers::{ExecutorPlugin, ExecutorSession, LlmPlugin, MetricsPlugin};
pub use crate::state::{
    ExecutionPhase, ResponseType, SessionManager, SessionState, StateEvent, SystemStatus,
};
pub use crate::workflow::{StepId, WorkflowId, WorkflowTrace};
