//! ServicesFactory 实现：从配置构建 metrics/llm/executor，供 CLI 复用。
use async_trait::async_trait;
use yunwei_core::api::{AppConfig, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services> {
        Ok(Services {
            metrics: factory::build_metrics(cfg),
            llm: factory::build_llm(cfg)?,
            executor: factory::build_executor(cfg),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builds_default_services() {
        let services = PluginServicesFactory
            .build_services(&AppConfig::default())
            .await
            .unwrap();
        assert_eq!(services.llm.name(), "openai_compat");
        assert_eq!(services.metrics.name(), "host_sysinfo");
        assert_eq!(services.executor.name(), "local_shell");
    }
}
