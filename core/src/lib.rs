//! yunwei-core: intent routing and workflow orchestration for the ops assistant.
//!
//! Prefer importing from [`api`] instead of reaching into internal modules.

pub mod analysis;
pub mod api;
pub mod assistant;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod intent;
pub mod journal;
pub mod model;
pub mod plans;
pub mod providers;
pub mod state;
pub mod workflow;
