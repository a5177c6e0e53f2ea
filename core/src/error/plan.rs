use thiserror::Error;

/// 修复方案操作错误，对调用方表现为结构化失败结果。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("未找到修复方案: {0}")]
    NotFound(String),

    #[error("命令索引无效: 方案 {plan_id} 共 {len} 条命令, 收到索引 {index}")]
    InvalidCommandIndex {
        plan_id: String,
        index: usize,
        len: usize,
    },

    #[error("命令不能为空")]
    EmptyCommand,

    #[error("命令包含危险操作: {0}")]
    UnsafeCommand(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),
}
