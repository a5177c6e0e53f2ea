use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 命令执行结果，每条尝试执行的远程命令对应一条，记录后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub command: String,
    pub success: bool,
    pub output: String,
    #[serde(default)]
    pub error: Option<String>,
    /// 执行耗时（毫秒）
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn succeeded(command: impl Into<String>, output: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            command: command.into(),
            success: true,
            output: output.into(),
            error: None,
            duration_ms,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(command: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            command: command.into(),
            success: false,
            output: String::new(),
            error: Some(error.into()),
            duration_ms,
            timestamp: Utc::now(),
        }
    }
}
