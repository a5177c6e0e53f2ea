//! # 意图识别
//!
//! 基于规则的用户意图分类，不调用模型、不做 I/O。
//!
//! 优先级：
//! 1. 强制巡检关键词 → `SystemCheck` (0.95)
//! 2. 问候/闲聊关键词 → `Chat` (0.98)
//! 3. 各类别模式打分取最高；低于 0.3 时回落到 `Chat` (0.6)

pub mod classifier;
pub mod patterns;
pub mod types;

pub use classifier::IntentClassifier;
pub use types::{IntentAnalysis, IntentType};
