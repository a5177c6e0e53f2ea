use thiserror::Error;

/// Workflow definition errors, raised while a graph is being built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("workflow '{workflow}': duplicate step '{step}'")]
    DuplicateStep { workflow: String, step: String },

    #[error("workflow '{workflow}': edge from '{from}' targets unknown step '{to}'")]
    MissingTarget {
        workflow: String,
        from: String,
        to: String,
    },

    #[error("workflow '{workflow}': edge declared from unknown step '{step}'")]
    UnknownSource { workflow: String, step: String },

    #[error("workflow '{workflow}': step '{step}' has more than one outgoing edge")]
    DuplicateEdge { workflow: String, step: String },

    #[error("workflow '{workflow}': entry step missing")]
    NoEntry { workflow: String },

    #[error("workflow '{workflow}': step '{step}' is unreachable from entry")]
    Unreachable { workflow: String, step: String },

    #[error("workflow '{workflow}': step '{step}' has no outgoing edge")]
    DanglingStep { workflow: String, step: String },

    #[error("workflow '{workflow}': cycle detected at step '{step}'")]
    Cycle { workflow: String, step: String },
}

/// Errors that may escape a workflow run. All of them indicate a bug.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("workflow '{workflow}': branch '{label}' after step '{step}' has no target")]
    Routing {
        workflow: String,
        step: String,
        label: String,
    },

    #[error("workflow '{workflow}': step '{step}' is not part of the graph")]
    UnknownStep { workflow: String, step: String },

    #[error("invalid workflow graph: {0}")]
    InvalidGraph(#[from] GraphError),
}
