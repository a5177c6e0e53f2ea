use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

/// Get the default data directory: ~/.yunwei
pub fn get_yunwei_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Cannot determine home directory")?;
    Ok(home.join(".yunwei"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.yunwei/config.toml
    let data_dir = get_yunwei_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml
    let local_config = Path::new("config.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    if cfg
        .logging
        .directory
        .as_ref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Environment variable overrides (highest priority).
fn apply_env_overrides(cfg: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("YUNWEI_LLM_BASE_URL") {
        cfg.llm.base_url = v;
    }
    if let Some(v) = non_empty("YUNWEI_LLM_API_KEY") {
        cfg.llm.api_key = v;
    }
    if let Some(v) = non_empty("YUNWEI_LLM_MODEL") {
        cfg.llm.model = v;
    }
}
