//! 运维领域数据模型：指标、告警、执行结果、修复方案。

pub mod execution;
pub mod metric;
pub mod plan;

pub use execution::ExecutionResult;
pub use metric::{
    alert_message, detect_alerts, suggested_actions, Alert, AlertLevel, Metric,
    CRITICAL_MULTIPLIER,
};
pub use plan::{FixPlan, PlanCommand, Priority, RiskLevel};
