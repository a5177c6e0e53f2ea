//! Markdown 报告模板

use chrono::{DateTime, Utc};

use crate::analysis::prompt::fmt_value;
use crate::model::{Alert, AlertLevel};
use crate::state::SessionState;

const FOOTER: &str = "\n---\n*报告由智能运维助手自动生成*";

fn ts(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn alert_icon(alert: &Alert) -> &'static str {
    if alert.level == AlertLevel::Critical {
        "🔴"
    } else {
        "🟡"
    }
}

pub fn error_report(message: &str, now: DateTime<Utc>) -> String {
    format!(
        "## 错误报告\n\n\
**错误信息**: {message}\n\n\
**时间**: {}\n\n\
**建议操作**:\n\
1. 检查系统连接状态\n\
2. 验证配置参数\n\
3. 查看详细日志\n\
4. 手动检查系统状态\n\n\
**系统状态**: 严重异常，需要人工干预\n",
        ts(now)
    )
}

/// Full system-check report assembled from everything the run collected.
pub fn system_check_report(state: &SessionState, now: DateTime<Utc>) -> String {
    let mut out = Vec::new();
    out.push("# 智能运维助手报告\n".to_string());
    out.push(format!("**生成时间**: {}", ts(now)));
    out.push(format!("**会话ID**: {}\n", state.session_id));

    out.push("## 系统状态概览".to_string());
    out.push(format!("- **总体状态**: {}", state.system_status));
    out.push(format!("- **监控指标数量**: {}", state.metrics.len()));
    out.push(format!("- **活跃告警数量**: {}\n", state.alerts.len()));

    let abnormal: Vec<_> = state.metrics.iter().filter(|m| m.is_abnormal()).collect();
    if !abnormal.is_empty() {
        out.push("## 关键指标".to_string());
        out.push("### 异常指标".to_string());
        for m in abnormal.iter().take(5) {
            let threshold = m
                .threshold
                .map(|t| format!(" (阈值: {})", fmt_value(t)))
                .unwrap_or_default();
            out.push(format!(
                "- {} **{}**: {}{}{}",
                m.status.icon(),
                m.name,
                fmt_value(m.value),
                m.unit,
                threshold
            ));
        }
        out.push(String::new());
    }

    if !state.alerts.is_empty() {
        out.push("## 活跃告警".to_string());
        for alert in state.alerts.iter().take(3) {
            out.push(format!("### {} {}", alert_icon(alert), alert.message));
            out.push(format!(
                "- **当前值**: {} / **阈值**: {}",
                fmt_value(alert.value),
                fmt_value(alert.threshold)
            ));
            if !alert.suggested_actions.is_empty() {
                let actions: Vec<&str> = alert
                    .suggested_actions
                    .iter()
                    .take(2)
                    .map(String::as_str)
                    .collect();
                out.push(format!("- **建议操作**: {}", actions.join(", ")));
            }
            out.push(String::new());
        }
    }

    if let Some(raw) = &state.analysis_result {
        out.push("## 智能分析结果".to_string());
        out.push(raw.clone());
        out.push(String::new());
    }

    if !state.execution_plan.is_empty() {
        out.push("## 自动执行计划".to_string());
        for (i, cmd) in state.execution_plan.iter().enumerate() {
            out.push(format!("{}. `{}`", i + 1, cmd));
        }
        out.push(String::new());
    }

    if !state.execution_results.is_empty() {
        out.push("## 执行结果".to_string());
        out.push(format!(
            "- **成功执行**: {}/{} 个操作",
            state.successful_executions(),
            state.execution_results.len()
        ));
        let skip = state.execution_results.len().saturating_sub(3);
        for result in state.execution_results.iter().skip(skip) {
            let icon = if result.success { "✅" } else { "❌" };
            out.push(format!("- {icon} `{}`", result.command));
            if let Some(err) = result.error.as_deref().filter(|e| !e.is_empty()) {
                out.push(format!("  错误: {err}"));
            }
        }
        out.push(String::new());
    }

    if let Some(err) = &state.error_message {
        out.push("## ⚠️ 错误信息".to_string());
        out.push(err.clone());
        out.push(String::new());
    }

    out.push(FOOTER.to_string());
    out.join("\n")
}

/// Lightweight report for system-info questions, optionally followed by a model interpretation.
pub fn system_info_report(
    state: &SessionState,
    interpretation: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let mut out = format!("# 系统信息报告\n\n**生成时间**: {}\n\n", ts(now));

    if let Some(name) = state.intent.as_ref().and_then(|i| i.param("resource_name")) {
        out.push_str(&format!("## {name} 信息\n\n"));
    }

    out.push_str("## 系统状态概览\n");
    out.push_str(&format!("- 监控指标数量: {}\n", state.metrics.len()));
    out.push_str(&format!("- 活跃告警数量: {}\n\n", state.alerts.len()));

    if !state.metrics.is_empty() {
        out.push_str("### 关键指标\n");
        for m in state.metrics.iter().take(5) {
            out.push_str(&format!(
                "- {} {}: {}{}\n",
                m.status.icon(),
                m.name,
                fmt_value(m.value),
                m.unit
            ));
        }
        out.push('\n');
    }

    if !state.alerts.is_empty() {
        out.push_str("### 当前告警\n");
        for alert in state.alerts.iter().take(3) {
            out.push_str(&format!("- {} {}\n", alert_icon(alert), alert.message));
        }
        out.push('\n');
    }

    if let Some(text) = interpretation.map(str::trim).filter(|t| !t.is_empty()) {
        out.push_str("## 智能解读\n");
        out.push_str(text);
        out.push('\n');
    }

    out.push_str(FOOTER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{detect_alerts, ExecutionResult, Metric};

    fn state_with_alert() -> SessionState {
        let metrics = vec![
            Metric::evaluated("cpu_usage_percent", 97.0, "%", Some(80.0)),
            Metric::evaluated("memory_usage_percent", 30.0, "%", Some(85.0)),
        ];
        let alerts = detect_alerts(&metrics);
        let mut s = SessionState::with_id("sess-1");
        s.apply_collection(metrics, alerts);
        s
    }

    #[test]
    fn test_error_report_sections() {
        let r = error_report("监控数据收集失败: boom", Utc::now());
        assert!(r.starts_with("## 错误报告"));
        assert!(r.contains("**错误信息**: 监控数据收集失败: boom"));
        assert!(r.contains("4. 手动检查系统状态"));
        assert!(r.contains("严重异常，需要人工干预"));
    }

    #[test]
    fn test_system_check_report() {
        let mut s = state_with_alert();
        s.analysis_result = Some("{\"overall_status\":\"critical\"}".into());
        s.set_execution_plan(vec!["ps aux --sort=-%cpu | head -10".into()]);
        s.add_execution_result(ExecutionResult::succeeded("ps aux", "ok", 3));
        s.add_execution_result(ExecutionResult::failed("df -h", "denied", 1));

        let r = system_check_report(&s, Utc::now());
        assert!(r.starts_with("# 智能运维助手报告"));
        assert!(r.contains("**会话ID**: sess-1"));
        assert!(r.contains("- **总体状态**: critical"));
        assert!(r.contains("❌ **cpu_usage_percent**: 97.0% (阈值: 80.0)"));
        assert!(r.contains("### 🔴 CPU使用率过高: 97.0%"));
        assert!(r.contains("1. `ps aux --sort=-%cpu | head -10`"));
        assert!(r.contains("- **成功执行**: 1/2 个操作"));
        assert!(r.contains("  错误: denied"));
        assert!(!r.contains("## ⚠️ 错误信息"));
        assert!(r.ends_with("*报告由智能运维助手自动生成*"));
    }

    #[test]
    fn test_system_info_report_interpretation_optional() {
        let s = state_with_alert();
        let plain = system_info_report(&s, None, Utc::now());
        assert!(plain.contains("- 监控指标数量: 2"));
        assert!(plain.contains("- ❌ cpu_usage_percent: 97.0%"));
        assert!(plain.contains("### 当前告警\n- 🔴 CPU使用率过高"));
        assert!(!plain.contains("智能解读"));

        let with = system_info_report(&s, Some("CPU 偏高"), Utc::now());
        assert!(with.contains("## 智能解读\nCPU 偏高\n"));
    }
}
