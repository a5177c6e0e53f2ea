use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 用户意图类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Chat,
    SystemCheck,
    SystemInfo,
    Troubleshoot,
    CommandExec,
    Performance,
    Optimization,
}

impl IntentType {
    /// Scoring order. Ties resolve to the earlier entry.
    pub const SCORED: [IntentType; 7] = [
        Self::SystemCheck,
        Self::Chat,
        Self::SystemInfo,
        Self::Troubleshoot,
        Self::CommandExec,
        Self::Performance,
        Self::Optimization,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::SystemCheck => "system_check",
            Self::SystemInfo => "system_info",
            Self::Troubleshoot => "troubleshoot",
            Self::CommandExec => "command_exec",
            Self::Performance => "performance",
            Self::Optimization => "optimization",
        }
    }

    pub fn requires_metrics(self) -> bool {
        matches!(
            self,
            Self::SystemCheck
                | Self::SystemInfo
                | Self::Troubleshoot
                | Self::Performance
                | Self::Optimization
        )
    }

    pub fn requires_execution(self) -> bool {
        matches!(self, Self::SystemCheck | Self::CommandExec)
    }

    /// Guidance line handed to the chat prompt.
    pub fn guidance(self) -> Option<&'static str> {
        match self {
            Self::Chat => Some("直接与用户对话，提供有用的运维建议和知识"),
            Self::SystemInfo => Some("提供用户查询的系统资源信息，如CPU、内存、磁盘等"),
            Self::Troubleshoot => Some("帮助用户分析和解决系统问题"),
            Self::Performance => Some("分析系统性能状况并提供优化建议"),
            Self::Optimization => Some("提供系统优化和配置建议"),
            Self::SystemCheck | Self::CommandExec => None,
        }
    }
}

impl std::fmt::Display for IntentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 意图分析结果，每条消息重新计算，不跨运行保存。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub intent_type: IntentType,
    pub confidence: f64,
    pub requires_metrics: bool,
    pub requires_execution: bool,
    #[serde(default)]
    pub extracted_params: BTreeMap<String, String>,
    pub reasoning: String,
}

impl IntentAnalysis {
    /// Stand-in used when a run reaches the chat step without a classification.
    pub fn default_chat() -> Self {
        Self {
            intent_type: IntentType::Chat,
            confidence: 0.5,
            requires_metrics: false,
            requires_execution: false,
            extracted_params: BTreeMap::new(),
            reasoning: "默认聊天意图".to_string(),
        }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.extracted_params.get(key).map(String::as_str)
    }
}
