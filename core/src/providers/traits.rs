use std::time::Duration;

use async_trait::async_trait;

use crate::model::{self, Alert, ExecutionResult, Metric};

#[async_trait]
pub trait MetricsPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// May fail on transport errors.
    async fn fetch(&self) -> anyhow::Result<Vec<Metric>>;

    fn detect_alerts(&self, metrics: &[Metric]) -> Vec<Alert> {
        model::detect_alerts(metrics)
    }
}

#[async_trait]
pub trait LlmPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String>;
}

/// Scoped connection: `connect`, run N commands, `close`.
#[async_trait]
pub trait ExecutorPlugin: Send + Sync {
    fn name(&self) -> &str;

    async fn connect(&self) -> anyhow::Result<Box<dyn ExecutorSession>>;
}

#[async_trait]
pub trait ExecutorSession: Send {
    /// Never fails; errors are reported through the result.
    async fn run(&mut self, command: &str, timeout: Duration) -> ExecutionResult;

    async fn close(&mut self);
}
