//! # 状态管理模块
//!
//! 负责运维助手的会话状态：一次工作流运行内被各步骤原地修改的 [`SessionState`]，
//! 以及按会话 ID 管理多个会话的 [`SessionManager`]。
//!
//! ## 设计原则
//!
//! 1. **强类型**：会话状态是显式字段的结构体，而非松散字典
//! 2. **单次运行独占**：同一会话的运行串行执行，不同会话可并发
//! 3. **事件驱动**：会话创建、运行开始/结束、方案审批都会广播事件
//! 4. **状态只升不降**：单次采集内系统状态只会升级

pub mod manager;
pub mod session;
pub mod transitions;
pub mod types;

pub use manager::{SessionLimits, SessionManager};
pub use session::SessionState;
pub use transitions::TransitionError;
pub use types::{
    ActionRecord, ConversationEntry, ExecutionPhase, ResponseType, StateEvent, SystemStatus,
};
