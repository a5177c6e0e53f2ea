use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::config::JournalConfig;
use crate::state::{ActionRecord, ConversationEntry};

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JournalLine<'a> {
    Action {
        session_id: &'a str,
        #[serde(flatten)]
        record: &'a ActionRecord,
    },
    Conversation {
        session_id: &'a str,
        #[serde(flatten)]
        entry: &'a ConversationEntry,
    },
}

#[derive(Clone)]
pub struct JournalTx {
    tx: mpsc::Sender<String>,
    dropped: Arc<AtomicU64>,
    drop_when_full: bool,
}

impl JournalTx {
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub async fn record_action(&self, session_id: &str, record: &ActionRecord) {
        self.send(&JournalLine::Action { session_id, record }).await;
    }

    pub async fn record_conversation(&self, session_id: &str, entry: &ConversationEntry) {
        self.send(&JournalLine::Conversation { session_id, entry })
            .await;
    }

    async fn send(&self, line: &JournalLine<'_>) {
        let Ok(line) = serde_json::to_string(line) else {
            return;
        };
        if self.drop_when_full {
            if self.tx.try_send(line).is_err() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        } else if self.tx.send(line).await.is_err() {
            // writer closed
        }
    }
}

/// Start the writer task. Returns `None` when the journal is disabled.
pub async fn start_journal(cfg: &JournalConfig) -> std::io::Result<Option<JournalTx>> {
    if !cfg.enabled || cfg.path.trim().is_empty() {
        return Ok(None);
    }

    let mut writer: Box<dyn tokio::io::AsyncWrite + Unpin + Send> = if cfg.path == "stdout:" {
        Box::new(tokio::io::stdout())
    } else {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&cfg.path)
            .await?;
        Box::new(file)
    };

    let (tx, mut rx) = mpsc::channel::<String>(cfg.channel_capacity.max(1));
    let path = cfg.path.clone();

    tokio::spawn(async move {
        while let Some(mut line) = rx.recv().await {
            line.push('\n');
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                tracing::warn!(
                    target: "yunwei.journal",
                    stage = "journal.write_failed",
                    path = %path,
                    error = %e
                );
                return;
            }
            let _ = writer.flush().await;
        }
    });

    Ok(Some(JournalTx {
        tx,
        dropped: Arc::new(AtomicU64::new(0)),
        drop_when_full: cfg.drop_when_full,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_disabled_returns_none() {
        let cfg = JournalConfig::default();
        assert!(start_journal(&cfg).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_lines_written_as_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let cfg = JournalConfig {
            enabled: true,
            path: path.to_string_lossy().to_string(),
            channel_capacity: 16,
            drop_when_full: false,
        };
        let tx = start_journal(&cfg).await.unwrap().unwrap();

        let action = ActionRecord {
            action_type: "collect_metrics".to_string(),
            details: serde_json::json!({"metrics_count": 4}),
            timestamp: Utc::now(),
        };
        let conversation = ConversationEntry {
            user: "你好".to_string(),
            ai: "您好".to_string(),
            timestamp: Utc::now(),
        };
        tx.record_action("s1", &action).await;
        tx.record_conversation("s1", &conversation).await;

        let mut lines = Vec::new();
        for _ in 0..100 {
            let content = tokio::fs::read_to_string(&path).await.unwrap_or_default();
            lines = content.lines().map(str::to_string).collect::<Vec<_>>();
            if lines.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["kind"], "action");
        assert_eq!(first["session_id"], "s1");
        assert_eq!(first["type"], "collect_metrics");
        assert_eq!(first["details"]["metrics_count"], 4);

        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["kind"], "conversation");
        assert_eq!(second["ai"], "您好");
    }
}
