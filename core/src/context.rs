use crate::config::AppConfig;
use crate::journal::{start_journal, JournalTx};
use crate::providers::{ExecutorPlugin, LlmPlugin, MetricsPlugin};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub metrics: Arc<dyn MetricsPlugin>,
    pub llm: Arc<dyn LlmPlugin>,
    pub executor: Arc<dyn ExecutorPlugin>,
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> anyhow::Result<Services>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    journal: Option<JournalTx>,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub async fn new(
        cfg: AppConfig,
        services_factory: Option<Arc<dyn ServicesFactory>>,
    ) -> anyhow::Result<Self> {
        let journal = start_journal(&cfg.journal)
            .await
            .with_context(|| format!("open journal {}", cfg.journal.path))?;
        Ok(Self {
            cfg,
            journal,
            services_factory,
        })
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn journal(&self) -> Option<JournalTx> {
        self.journal.clone()
    }

    pub async fn build_services(&self) -> anyhow::Result<Services> {
        let Some(factory) = self.services_factory.as_ref() else {
            anyhow::bail!("services_factory missing (cannot build plugins/services)");
        };
        factory.build_services(&self.cfg).await
    }
}
