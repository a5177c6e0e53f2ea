//! 提示词构建。措辞不追求与任何版本一致，只保证结构稳定。

use chrono::{DateTime, Utc};

use crate::cache::MetricsSnapshot;
use crate::config::ThresholdsConfig;
use crate::intent::IntentAnalysis;
use crate::model::{Alert, AlertLevel, Metric};

pub const SYSTEM_PROMPT: &str = "你是一个专业的Linux系统运维专家和智能运维助手。你的职责：\n\
1. 系统监控分析：分析CPU、内存、磁盘、网络等指标，识别瓶颈与异常，评估健康状态\n\
2. 问题诊断：基于监控数据定位根因并评估影响\n\
3. 解决方案建议：给出具体修复步骤、预防措施和操作风险\n\
4. 自动化决策：判断是否需要自动修复并确定优先级\n\n\
分析原则：优先保证系统稳定和数据安全，遵循最小干预原则，建议需可操作并考虑回滚方案。\n\
回复使用简洁的技术语言，按优先级列出建议操作。";

pub const PROBLEM_SYSTEM_PROMPT: &str = "你是一个专业的系统故障诊断专家。";

pub const SOLUTION_SYSTEM_PROMPT: &str = "你是一个专业的系统问题解决专家。";

/// Format a value the way reports print it: integral values keep one decimal.
pub fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn bucket<'a>(metrics: &'a [Metric], pred: impl Fn(&str) -> bool) -> Vec<&'a Metric> {
    metrics
        .iter()
        .filter(|m| pred(&m.name.to_lowercase()))
        .collect()
}

fn format_metric_group(metrics: &[&Metric]) -> String {
    if metrics.is_empty() {
        return "无数据".to_string();
    }
    metrics
        .iter()
        .map(|m| {
            let threshold = m
                .threshold
                .map(|t| format!(" (阈值: {})", fmt_value(t)))
                .unwrap_or_default();
            format!(
                "{} {}: {}{}{}",
                m.status.icon(),
                m.name,
                fmt_value(m.value),
                m.unit,
                threshold
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_alerts(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return "无活跃告警".to_string();
    }
    let mut lines = Vec::new();
    for alert in alerts {
        let icon = if alert.level == AlertLevel::Critical {
            "🔴"
        } else {
            "🟡"
        };
        lines.push(format!("{icon} {}: {}", alert.metric_name, alert.message));
        lines.push(format!(
            "   当前值: {}, 阈值: {}",
            fmt_value(alert.value),
            fmt_value(alert.threshold)
        ));
        if !alert.suggested_actions.is_empty() {
            lines.push(format!("   建议操作: {}", alert.suggested_actions.join(", ")));
        }
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Structured analysis prompt: grouped metrics, alert counts, thresholds and the JSON reply schema.
pub fn analysis_prompt(
    metrics: &[Metric],
    alerts: &[Alert],
    thresholds: &ThresholdsConfig,
    now: DateTime<Utc>,
) -> String {
    let cpu = bucket(metrics, |n| n.contains("cpu"));
    let memory = bucket(metrics, |n| n.contains("memory"));
    let disk = bucket(metrics, |n| n.contains("disk"));
    let network = bucket(metrics, |n| n.contains("network") || n.contains("tcp"));
    let system = bucket(metrics, |n| n.contains("load"));

    let critical = alerts
        .iter()
        .filter(|a| a.level == AlertLevel::Critical)
        .count();
    let warning = alerts
        .iter()
        .filter(|a| a.level == AlertLevel::Warning)
        .count();

    format!(
        r#"请分析以下Linux系统监控数据，并提供专业的运维建议：

## 系统监控概览
- 分析时间: {time}
- 总指标数: {total}
- 告警数量: {alert_count} (严重: {critical}, 警告: {warning})

## 关键指标数据

### CPU指标
{cpu}

### 内存指标
{memory}

### 磁盘指标
{disk}

### 网络指标
{network}

### 系统指标
{system}

## 活跃告警
{alerts}

## 配置的阈值
- CPU使用率阈值: {cpu_t}%
- 内存使用率阈值: {mem_t}%
- 磁盘使用率阈值: {disk_t}%
- 系统负载阈值: {load_t}
- TCP连接数阈值: {conn_t}

请基于以上数据提供：
1. 系统状态总体评估
2. 检测到的具体问题
3. 详细的解决建议
4. 操作风险评估
5. 是否建议自动修复
6. 针对每个问题的结构化修复方案

请按以下JSON格式回复：
{{
    "overall_status": "healthy|warning|critical",
    "issues": ["问题1", "问题2"],
    "actions": ["具体操作1", "具体操作2"],
    "risks": ["风险1", "风险2"],
    "urgency": "low|medium|high|critical",
    "auto_fixable": true|false,
    "fix_plans": [
        {{
            "id": "plan_1",
            "issue": "对应的问题",
            "description": "方案说明",
            "priority": "low|medium|high",
            "commands": [
                {{"step": 1, "description": "步骤说明", "command": "具体命令", "expected_output": "预期输出", "timeout": 30}}
            ],
            "risk_level": "low|medium|high",
            "estimated_time": "预计耗时",
            "preconditions": ["前置条件"],
            "verification_commands": ["验证命令"]
        }}
    ]
}}
"#,
        time = now.to_rfc3339(),
        total = metrics.len(),
        alert_count = alerts.len(),
        cpu = format_metric_group(&cpu),
        memory = format_metric_group(&memory),
        disk = format_metric_group(&disk),
        network = format_metric_group(&network),
        system = format_metric_group(&system),
        alerts = format_alerts(alerts),
        cpu_t = fmt_value(thresholds.cpu_usage),
        mem_t = fmt_value(thresholds.memory_usage),
        disk_t = fmt_value(thresholds.disk_usage),
        load_t = fmt_value(thresholds.load_average),
        conn_t = fmt_value(thresholds.connection_count),
    )
}

fn format_params(intent: &IntentAnalysis) -> String {
    intent
        .extracted_params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Context block for the chat step: intent, key metrics if any, and per-intent guidance.
pub fn chat_context(intent: &IntentAnalysis, snapshot: Option<&MetricsSnapshot>) -> String {
    let mut parts = vec![format!("用户意图: {}", intent.intent_type)];

    if !intent.extracted_params.is_empty() {
        parts.push(format!("提取参数: {}", format_params(intent)));
    }

    if let Some(snapshot) = snapshot {
        parts.push("当前系统指标:".to_string());
        let find = |name: &str| snapshot.metrics.iter().find(|m| m.name == name);
        if let Some(m) = find("cpu_usage_percent") {
            parts.push(format!("- CPU使用率: {}%", fmt_value(m.value)));
        }
        if let Some(m) = find("memory_usage_percent") {
            parts.push(format!("- 内存使用率: {}%", fmt_value(m.value)));
        }
        if let Some(m) = find("disk_usage_percent") {
            parts.push(format!("- 磁盘使用率: {}%", fmt_value(m.value)));
        }
        if !snapshot.alerts.is_empty() {
            parts.push(format!("- 活跃告警数: {}", snapshot.alerts.len()));
        }
    }

    if let Some(guidance) = intent.intent_type.guidance() {
        parts.push(format!("处理指导: {guidance}"));
    }

    parts.join("\n")
}

pub fn chat_prompt(context: &str, user_query: &str) -> String {
    format!(
        "你是一个专业的Linux系统运维助手。请基于以下信息回答用户问题：\n\n\
{context}\n\n\
用户问题：{user_query}\n\n\
请提供专业、准确、有用的回答。如果是技术问题，请提供具体的操作建议。\n\
如果用户询问系统状态，请基于当前提供的数据进行分析。\n\
如果需要执行系统检查，请提示用户发送“检查系统”。\n"
    )
}

/// Narrow prompt for a system-info question scoped to the requested resource.
pub fn system_info_prompt(user_query: &str, intent: &IntentAnalysis, metrics: &[Metric]) -> String {
    let resource = intent.param("resource_type");
    let relevant: Vec<&Metric> = match resource {
        Some(kind) => metrics
            .iter()
            .filter(|m| m.name.to_lowercase().contains(kind))
            .collect(),
        None => metrics.iter().collect(),
    };
    format!(
        "用户查询: {user_query}\n关注资源: {}\n\n相关指标:\n{}\n\n请用两三句话解读这些指标，指出是否需要关注。\n",
        intent.param("resource_name").unwrap_or("整体系统"),
        format_metric_group(&relevant)
    )
}

pub fn problem_prompt(
    user_query: &str,
    intent: Option<&IntentAnalysis>,
    metrics: &[Metric],
    alerts: &[Alert],
) -> String {
    let params = intent.map(format_params).unwrap_or_default();
    let abnormal: Vec<&Metric> = metrics.iter().filter(|m| m.is_abnormal()).collect();
    format!(
        "请分析以下系统问题：\n\n\
用户描述: {user_query}\n\
提取的参数: {params}\n\n\
当前系统状态:\n\
- 监控指标数量: {}\n\
- 活跃告警数量: {}\n\
异常指标:\n{}\n\n\
请分析可能的问题原因并提供初步的诊断结果。\n",
        metrics.len(),
        alerts.len(),
        format_metric_group(&abnormal),
    )
}

pub fn solution_prompt(user_query: &str, problem_analysis: &str) -> String {
    format!(
        "基于以下问题分析，请提供详细的解决方案：\n\n\
用户问题: {user_query}\n\
问题分析: {problem_analysis}\n\n\
请提供：\n\
1. 问题的根本原因\n\
2. 具体的解决步骤\n\
3. 预防措施\n\
4. 如果需要，相关的命令示例\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::IntentClassifier;
    use crate::model::detect_alerts;

    fn sample() -> Vec<Metric> {
        vec![
            Metric::evaluated("cpu_usage_percent", 95.0, "%", Some(80.0)),
            Metric::evaluated("memory_usage_percent", 40.5, "%", Some(85.0)),
            Metric::evaluated("tcp_connections", 12.0, "", Some(1000.0)),
        ]
    }

    #[test]
    fn test_analysis_prompt_groups_metrics() {
        let metrics = sample();
        let alerts = detect_alerts(&metrics);
        let prompt = analysis_prompt(&metrics, &alerts, &ThresholdsConfig::default(), Utc::now());

        assert!(prompt.contains("告警数量: 1 (严重: 0, 警告: 1)"));
        assert!(prompt.contains("⚠️ cpu_usage_percent: 95.0% (阈值: 80.0)"));
        assert!(prompt.contains("✅ tcp_connections: 12.0 (阈值: 1000.0)"));
        assert!(prompt.contains("### 磁盘指标\n无数据"));
        assert!(prompt.contains("建议操作: 检查CPU占用高的进程"));
        assert!(prompt.contains("\"fix_plans\""));
    }

    #[test]
    fn test_chat_context_includes_snapshot_and_guidance() {
        let intent = IntentClassifier::new().classify("现在CPU使用率是多少");
        let metrics = sample();
        let snapshot = MetricsSnapshot {
            alerts: detect_alerts(&metrics),
            metrics,
            captured_at: Utc::now(),
        };
        let ctx = chat_context(&intent, Some(&snapshot));
        assert!(ctx.starts_with("用户意图: system_info"));
        assert!(ctx.contains("resource_type=cpu"));
        assert!(ctx.contains("- CPU使用率: 95.0%"));
        assert!(ctx.contains("- 活跃告警数: 1"));
        assert!(ctx.contains("处理指导: 提供用户查询的系统资源信息"));
    }

    #[test]
    fn test_system_info_prompt_filters_resource() {
        let intent = IntentClassifier::new().classify("内存使用率");
        let prompt = system_info_prompt("内存使用率", &intent, &sample());
        assert!(prompt.contains("memory_usage_percent"));
        assert!(!prompt.contains("cpu_usage_percent"));
    }
}
