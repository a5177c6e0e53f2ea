use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

fn default_command_timeout() -> u64 {
    30
}

// 模型输出的字段类型并不稳定：数字可能是字符串，枚举可能大小写混用。
fn number_of(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| *f >= 0.0).map(|f| f as u64),
        _ => None,
    }
}

fn lenient_step<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(number_of(&v)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_default())
}

fn lenient_timeout<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(number_of(&v)
        .filter(|n| *n > 0)
        .unwrap_or_else(default_command_timeout))
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                Value::String(_) | Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

/// Unknown or mistyped values fall back to the default level.
fn lenient_level<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s.parse().unwrap_or_default(),
        _ => T::default(),
    })
}

/// 修复方案优先级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "低" => Ok(Self::Low),
            "medium" | "中" => Ok(Self::Medium),
            "high" | "高" => Ok(Self::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// 修复方案风险等级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "低" => Ok(Self::Low),
            "medium" | "中" => Ok(Self::Medium),
            "high" | "高" => Ok(Self::High),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// 修复方案中的单条命令
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCommand {
    #[serde(default, deserialize_with = "lenient_step")]
    pub step: u32,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    pub command: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub expected_output: String,
    /// 单条命令超时（秒）
    #[serde(default = "default_command_timeout", deserialize_with = "lenient_timeout")]
    pub timeout: u64,

    // 用户编辑痕迹
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_command: Option<String>,
    #[serde(default)]
    pub user_modified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl PlanCommand {
    pub fn new(step: u32, description: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            step,
            description: description.into(),
            command: command.into(),
            expected_output: String::new(),
            timeout: default_command_timeout(),
            original_command: None,
            user_modified: false,
            modified_at: None,
        }
    }

    /// Replace the command text, keeping the very first original around.
    pub fn apply_edit(&mut self, new_command: impl Into<String>) {
        if self.original_command.is_none() {
            self.original_command = Some(self.command.clone());
        }
        self.command = new_command.into();
        self.user_modified = true;
        self.modified_at = Some(Utc::now());
    }
}

/// 结构化修复方案，由分析步骤从模型输出中解析得到，可被用户逐条编辑。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixPlan {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub issue: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_level")]
    pub priority: Priority,
    #[serde(default)]
    pub commands: Vec<PlanCommand>,
    #[serde(default, deserialize_with = "lenient_level")]
    pub risk_level: RiskLevel,
    /// 预估执行时间（分钟），模型可能给数字也可能给文本
    #[serde(default, deserialize_with = "lenient_string")]
    pub estimated_time: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub preconditions: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub verification_commands: Vec<String>,
    #[serde(default, alias = "_user_edited")]
    pub user_edited: bool,
}

impl FixPlan {
    pub fn new(id: impl Into<String>, issue: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issue: issue.into(),
            description: String::new(),
            priority: Priority::default(),
            commands: Vec::new(),
            risk_level: RiskLevel::default(),
            estimated_time: String::new(),
            preconditions: Vec::new(),
            verification_commands: Vec::new(),
            user_edited: false,
        }
    }

    pub fn with_command(mut self, command: PlanCommand) -> Self {
        self.commands.push(command);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerant_deserialize() {
        let plan: FixPlan = serde_json::from_value(serde_json::json!({
            "id": "plan_1",
            "issue": "CPU使用率过高",
            "priority": "high",
            "commands": [{"step": 1, "command": "ps aux"}],
            "_user_edited": true
        }))
        .unwrap();
        assert_eq!(plan.priority, Priority::High);
        assert_eq!(plan.risk_level, RiskLevel::Low);
        assert_eq!(plan.commands[0].timeout, 30);
        assert!(plan.user_edited);
    }

    #[test]
    fn test_mixed_type_fields_are_accepted() {
        let plan: FixPlan = serde_json::from_value(serde_json::json!({
            "id": 7,
            "issue": "磁盘空间不足",
            "priority": "HIGH",
            "risk_level": "Medium",
            "estimated_time": 5,
            "preconditions": "确认有备份",
            "commands": [
                {"step": "2", "command": "df -h", "timeout": "45"},
                {"step": 3.0, "command": "du -sh /var/log", "timeout": null}
            ]
        }))
        .unwrap();
        assert_eq!(plan.id, "7");
        assert_eq!(plan.priority, Priority::High);
        assert_eq!(plan.risk_level, RiskLevel::Medium);
        assert_eq!(plan.estimated_time, "5");
        assert_eq!(plan.preconditions, vec!["确认有备份"]);
        assert_eq!(plan.commands[0].step, 2);
        assert_eq!(plan.commands[0].timeout, 45);
        assert_eq!(plan.commands[1].step, 3);
        assert_eq!(plan.commands[1].timeout, 30);
    }

    #[test]
    fn test_unknown_levels_fall_back_to_default() {
        let plan: FixPlan = serde_json::from_value(serde_json::json!({
            "issue": "x",
            "priority": "urgent",
            "risk_level": 3
        }))
        .unwrap();
        assert_eq!(plan.priority, Priority::Medium);
        assert_eq!(plan.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_apply_edit_keeps_first_original() {
        let mut cmd = PlanCommand::new(1, "list", "ps aux");
        cmd.apply_edit("ps aux | head");
        cmd.apply_edit("ps aux | head -5");
        assert_eq!(cmd.original_command.as_deref(), Some("ps aux"));
        assert_eq!(cmd.command, "ps aux | head -5");
        assert!(cmd.user_modified);
        assert!(cmd.modified_at.is_some());
    }
}
