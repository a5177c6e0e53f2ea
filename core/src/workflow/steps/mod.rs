//! 步骤库：工作流中每个节点的实现。
//!
//! 步骤只通过 [`SessionState`] 交换数据，自身错误写入 `error_message`，不向引擎抛出。

mod collect;
mod conversation;
pub mod render;
mod system_check;

use std::sync::Arc;
use std::time::Duration;

use crate::cache::MetricsCache;
use crate::config::{AppConfig, ThresholdsConfig};
use crate::context::Services;
use crate::error::ProviderError;
use crate::intent::IntentClassifier;
use crate::model::Metric;
use crate::providers::call_with_timeout;
use crate::state::SessionState;

use super::types::StepId;

/// Deadlines and thresholds the steps read from configuration.
#[derive(Debug, Clone)]
pub struct StepSettings {
    pub llm_timeout_secs: u64,
    pub metrics_timeout_secs: u64,
    pub command_timeout: Duration,
    pub thresholds: ThresholdsConfig,
}

impl StepSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            llm_timeout_secs: cfg.llm.timeout_secs,
            metrics_timeout_secs: cfg.metrics.timeout_secs,
            command_timeout: Duration::from_secs(cfg.executor.command_timeout_secs),
            thresholds: cfg.metrics.thresholds.clone(),
        }
    }
}

impl Default for StepSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Clone)]
pub struct StepLibrary {
    services: Services,
    cache: Arc<MetricsCache>,
    classifier: Arc<IntentClassifier>,
    settings: StepSettings,
}

impl StepLibrary {
    pub fn new(
        services: Services,
        cache: Arc<MetricsCache>,
        classifier: Arc<IntentClassifier>,
        settings: StepSettings,
    ) -> Self {
        Self {
            services,
            cache,
            classifier,
            settings,
        }
    }

    pub async fn run(&self, step: StepId, state: &mut SessionState) {
        match step {
            StepId::RouteIntent => self.route_intent(state),
            StepId::ChatResponse => self.chat_response(state).await,
            StepId::CollectMetrics => self.collect_metrics(state).await,
            StepId::CollectBasicMetrics => self.collect_basic_metrics(state).await,
            StepId::CollectRelevantMetrics => self.collect_relevant_metrics(state).await,
            StepId::AnalyzeSystem => self.analyze_system(state).await,
            StepId::GeneratePlan => self.generate_plan(state),
            StepId::ExecutePlan => self.execute_plan(state).await,
            StepId::ReportResults => self.report_results(state),
            StepId::HandleErrors => self.handle_errors(state),
            StepId::ProvideSystemInfo => self.provide_system_info(state).await,
            StepId::AnalyzeProblem => self.analyze_problem(state).await,
            StepId::ProvideSolution => self.provide_solution(state).await,
        }
    }

    async fn fetch_metrics(&self) -> Result<Vec<Metric>, ProviderError> {
        call_with_timeout(
            "metrics provider",
            self.settings.metrics_timeout_secs,
            self.services.metrics.fetch(),
            ProviderError::metrics,
        )
        .await
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError> {
        call_with_timeout(
            "llm",
            self.settings.llm_timeout_secs,
            self.services.llm.complete(system_prompt, user_prompt),
            ProviderError::llm,
        )
        .await
    }
}
