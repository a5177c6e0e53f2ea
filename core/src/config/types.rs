use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub journal: JournalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "yunwei=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    false
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// OpenAI 兼容的大模型接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
}

fn default_llm_model() -> String {
    "qwen-max".to_string()
}

fn default_llm_temperature() -> f32 {
    0.1
}

fn default_llm_max_tokens() -> u32 {
    2000
}

fn default_llm_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

fn default_metrics_timeout_secs() -> u64 {
    30
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_metrics_timeout_secs(),
            thresholds: ThresholdsConfig::default(),
        }
    }
}

/// 告警阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_cpu_usage")]
    pub cpu_usage: f64,
    #[serde(default = "default_memory_usage")]
    pub memory_usage: f64,
    #[serde(default = "default_disk_usage")]
    pub disk_usage: f64,
    #[serde(default = "default_load_average")]
    pub load_average: f64,
    #[serde(default = "default_connection_count")]
    pub connection_count: f64,
}

fn default_cpu_usage() -> f64 {
    80.0
}

fn default_memory_usage() -> f64 {
    85.0
}

fn default_disk_usage() -> f64 {
    90.0
}

fn default_load_average() -> f64 {
    2.0
}

fn default_connection_count() -> f64 {
    1000.0
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            cpu_usage: default_cpu_usage(),
            memory_usage: default_memory_usage(),
            disk_usage: default_disk_usage(),
            load_average: default_load_average(),
            connection_count: default_connection_count(),
        }
    }
}

impl ThresholdsConfig {
    /// Threshold for a well-known metric name.
    pub fn for_metric(&self, name: &str) -> Option<f64> {
        match name {
            "cpu_usage_percent" => Some(self.cpu_usage),
            "memory_usage_percent" => Some(self.memory_usage),
            "disk_usage_percent" => Some(self.disk_usage),
            "load_1m" => Some(self.load_average),
            "tcp_connections" => Some(self.connection_count),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_executor_shell")]
    pub shell: String,

    /// Fallback per-command timeout when a plan step carries none.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

fn default_executor_shell() -> String {
    "sh".to_string()
}

fn default_command_timeout_secs() -> u64 {
    30
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            shell: default_executor_shell(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 指标快照有效期（秒）
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// 内存会话的回收策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// 空闲多久后回收（秒）
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

fn default_max_sessions() -> usize {
    256
}

fn default_idle_ttl_secs() -> u64 {
    3600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_journal_path")]
    pub path: String,
    #[serde(default = "default_journal_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_journal_drop_when_full")]
    pub drop_when_full: bool,
}

fn default_journal_path() -> String {
    "./yunwei.journal.jsonl".to_string()
}

fn default_journal_channel_capacity() -> usize {
    1024
}

fn default_journal_drop_when_full() -> bool {
    true
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_journal_path(),
            channel_capacity: default_journal_channel_capacity(),
            drop_when_full: default_journal_drop_when_full(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
[llm]
model = "qwen-plus"

[metrics.thresholds]
cpu_usage = 70.0
"#,
        )
        .unwrap();

        assert_eq!(cfg.llm.model, "qwen-plus");
        assert_eq!(cfg.llm.max_tokens, 2000);
        assert_eq!(cfg.metrics.thresholds.cpu_usage, 70.0);
        assert_eq!(cfg.metrics.thresholds.memory_usage, 85.0);
        assert_eq!(cfg.cache.ttl_secs, 300);
        assert_eq!(cfg.session.max_sessions, 256);
        assert!(!cfg.journal.enabled);
    }

    #[test]
    fn test_threshold_lookup() {
        let t = ThresholdsConfig::default();
        assert_eq!(t.for_metric("load_1m"), Some(2.0));
        assert_eq!(t.for_metric("tcp_connections"), Some(1000.0));
        assert_eq!(t.for_metric("network_receive_bytes"), None);
    }
}
