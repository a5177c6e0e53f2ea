//! 只写的 JSONL 会话日志：操作记录与对话记录各一行。

pub mod writer;

pub use crate::config::JournalConfig;
pub use writer::{start_journal, JournalTx};
