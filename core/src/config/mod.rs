pub mod load;
pub mod types;

pub use load::{get_yunwei_data_dir, load_default, load_from_path};
pub use types::{
    AppConfig, CacheConfig, ExecutorConfig, JournalConfig, LlmConfig, LoggingConfig,
    MetricsConfig, SessionConfig, ThresholdsConfig,
};
