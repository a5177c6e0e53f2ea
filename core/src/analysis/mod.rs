//! 系统分析：提示词构建、模型输出解析、执行计划生成。

pub mod commands;
pub mod extract;
pub mod prompt;
pub mod report;

pub use commands::{command_for_action, generate_execution_plan};
pub use extract::{balanced_json_blocks, parse_analysis};
pub use report::{AnalysisOutcome, AnalysisReport, Urgency};
