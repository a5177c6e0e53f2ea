use yunwei_core::api::WorkflowError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
