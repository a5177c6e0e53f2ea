use std::sync::Arc;

use anyhow::Result;
use yunwei_core::api::{AppConfig, ExecutorPlugin, LlmPlugin, MetricsPlugin};

use crate::executor::LocalShellExecutor;
use crate::llm::OpenAiCompatLlm;
use crate::metrics::HostMetricsProvider;

pub fn build_llm(cfg: &AppConfig) -> Result<Arc<dyn LlmPlugin>> {
    if cfg.llm.api_key.trim().is_empty() {
        tracing::warn!(
            target: "yunwei.plugins",
            stage = "plugins.llm_no_key",
            base_url = %cfg.llm.base_url
        );
    }
    Ok(Arc::new(OpenAiCompatLlm::new(&cfg.llm)?))
}

pub fn build_metrics(cfg: &AppConfig) -> Arc<dyn MetricsPlugin> {
    Arc::new(HostMetricsProvider::new(cfg.metrics.thresholds.clone()))
}

pub fn build_executor(cfg: &AppConfig) -> Arc<dyn ExecutorPlugin> {
    Arc::new(LocalShellExecutor::new(cfg.executor.shell.clone()))
}
