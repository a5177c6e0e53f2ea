//! 状态类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 系统总体状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Healthy,
    Warning,
    Critical,
    #[default]
    Unknown,
}

impl SystemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 响应类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Chat,
    SystemCheck,
    SystemInfo,
    Solution,
    Error,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::SystemCheck => "system_check",
            Self::SystemInfo => "system_info",
            Self::Solution => "solution",
            Self::Error => "error",
        }
    }
}

/// 修复方案执行阶段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    #[default]
    Idle,
    Executing,
    Completed,
    Failed,
}

/// 对话记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub user: String,
    pub ai: String,
    pub timestamp: DateTime<Utc>,
}

/// 操作记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub action_type: String,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// 状态事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StateEvent {
    SessionCreated {
        session_id: String,
        timestamp: DateTime<Utc>,
    },
    RunStarted {
        session_id: String,
        workflow: String,
        timestamp: DateTime<Utc>,
    },
    RunFinished {
        session_id: String,
        workflow: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    PlanApproved {
        session_id: String,
        plan_id: String,
        total_success: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },
    PlanRejected {
        session_id: String,
        plan_id: String,
        timestamp: DateTime<Utc>,
    },
    PlanEdited {
        session_id: String,
        plan_id: String,
        command_index: usize,
        timestamp: DateTime<Utc>,
    },
    /// closed / idle / capacity
    SessionRemoved {
        session_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl StateEvent {
    pub fn session_id(&self) -> &str {
        match self {
            Self::SessionCreated { session_id, .. }
            | Self::RunStarted { session_id, .. }
            | Self::RunFinished { session_id, .. }
            | Self::PlanApproved { session_id, .. }
            | Self::PlanRejected { session_id, .. }
            | Self::PlanEdited { session_id, .. }
            | Self::SessionRemoved { session_id, .. } => session_id,
        }
    }
}
