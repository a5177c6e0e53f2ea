pub mod executor;
pub mod factory;
pub mod llm;
pub mod metrics;
pub mod services;
