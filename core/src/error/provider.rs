use thiserror::Error;

/// Collaborator failures, converted into `error_message` at the step boundary.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("metrics provider failed: {0}")]
    Metrics(String),
    #[error("llm provider failed: {0}")]
    Llm(String),
    #[error("executor failed: {0}")]
    Executor(String),
    #[error("{what} timed out after {secs}s")]
    Timeout { what: &'static str, secs: u64 },
}

impl ProviderError {
    pub fn metrics(err: anyhow::Error) -> Self {
        Self::Metrics(format!("{err:#}"))
    }

    pub fn llm(err: anyhow::Error) -> Self {
        Self::Llm(format!("{err:#}"))
    }

    pub fn executor(err: anyhow::Error) -> Self {
        Self::Executor(format!("{err:#}"))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
