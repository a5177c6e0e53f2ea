pub mod plan;
pub mod provider;
pub mod workflow;

pub use plan::PlanError;
pub use provider::ProviderError;
pub use workflow::{GraphError, WorkflowError};
