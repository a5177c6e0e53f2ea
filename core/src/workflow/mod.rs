//! # 工作流
//!
//! 每个工作流是一张由步骤组成的小型有向图，终止于 `End`。
//! 引擎按图顺序执行步骤，在带条件出边的步骤之后求值分支谓词。
//!
//! - Chat: route_intent → chat_response → End
//! - SystemCheck: collect_metrics → analyze_system → generate_plan → execute_plan → report_results
//!   （任一环节失败转 handle_errors）
//! - SystemInfo: collect_basic_metrics → provide_system_info → End
//! - Troubleshoot: collect_relevant_metrics → analyze_problem → provide_solution → End

pub mod definitions;
pub mod engine;
pub mod graph;
pub mod predicates;
pub mod steps;
pub mod types;

pub use definitions::{build_workflow, WorkflowSet};
pub use engine::{StepTrace, WorkflowEngine, WorkflowTrace};
pub use graph::{Edge, GraphBuilder, Predicate, Target, WorkflowGraph};
pub use steps::{StepLibrary, StepSettings};
pub use types::{StepId, WorkflowId};
