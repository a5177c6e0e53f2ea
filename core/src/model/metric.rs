use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A breach is escalated to critical once the value exceeds `threshold * CRITICAL_MULTIPLIER`.
pub const CRITICAL_MULTIPLIER: f64 = 1.2;

/// 告警级别
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl AlertLevel {
    /// Derive a level from a value and an optional threshold.
    ///
    /// No threshold means the metric can never breach.
    pub fn classify(value: f64, threshold: Option<f64>) -> Self {
        match threshold {
            Some(t) if value > t * CRITICAL_MULTIPLIER => Self::Critical,
            Some(t) if value > t => Self::Warning,
            _ => Self::Normal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Normal => "✅",
            Self::Warning => "⚠️",
            Self::Critical => "❌",
        }
    }
}

/// 监控指标值（由指标提供方产生后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub status: AlertLevel,
}

impl Metric {
    /// Build a metric stamped with the current time; status is derived once, here.
    pub fn evaluated(
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        threshold: Option<f64>,
    ) -> Self {
        Self::at(name, value, unit, threshold, Utc::now())
    }

    pub fn at(
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        threshold: Option<f64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            timestamp,
            threshold,
            status: AlertLevel::classify(value, threshold),
        }
    }

    pub fn is_abnormal(&self) -> bool {
        self.status != AlertLevel::Normal
    }
}

/// 系统告警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub metric_name: String,
    pub level: AlertLevel,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub suggested_actions: Vec<String>,
}

/// Detect alerts for every metric whose value is strictly above its threshold.
pub fn detect_alerts(metrics: &[Metric]) -> Vec<Alert> {
    metrics
        .iter()
        .filter_map(|metric| {
            let threshold = metric.threshold?;
            if metric.value <= threshold {
                return None;
            }
            Some(Alert {
                metric_name: metric.name.clone(),
                level: AlertLevel::classify(metric.value, Some(threshold)),
                message: alert_message(metric),
                value: metric.value,
                threshold,
                timestamp: metric.timestamp,
                suggested_actions: suggested_actions(&metric.name),
            })
        })
        .collect()
}

pub fn alert_message(metric: &Metric) -> String {
    match metric.name.as_str() {
        "cpu_usage_percent" => format!("CPU使用率过高: {:.1}%", metric.value),
        "memory_usage_percent" => format!("内存使用率过高: {:.1}%", metric.value),
        "disk_usage_percent" => format!("磁盘使用率过高: {:.1}%", metric.value),
        "load_1m" => format!("系统负载过高: {:.2}", metric.value),
        "tcp_connections" => format!("TCP连接数过多: {}", metric.value as i64),
        other => format!("指标 {} 异常: {}", other, metric.value),
    }
}

pub fn suggested_actions(metric_name: &str) -> Vec<String> {
    let actions: &[&str] = match metric_name {
        "cpu_usage_percent" => &[
            "检查CPU占用高的进程",
            "考虑终止非必要进程",
            "检查系统是否有异常计算任务",
        ],
        "memory_usage_percent" => &[
            "检查内存占用高的进程",
            "清理系统缓存",
            "考虑重启内存泄露的服务",
        ],
        "disk_usage_percent" => &["清理临时文件", "删除不必要的日志文件", "检查大文件并清理"],
        "load_1m" => &["检查系统负载高的原因", "查看运行中的进程", "考虑优化系统配置"],
        "tcp_connections" => &["检查网络连接状态", "查看是否有异常连接", "考虑调整网络参数"],
        _ => &[],
    };
    actions.iter().map(|s| s.to_string()).collect()
}
