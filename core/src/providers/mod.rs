//! 外部协作方接口：指标提供方、大模型、命令执行器。

pub mod batch;
pub mod timeout;
pub mod traits;

pub use batch::{run_commands, CommandSpec};
pub use timeout::call_with_timeout;
pub use traits::{ExecutorPlugin, ExecutorSession, LlmPlugin, MetricsPlugin};
