use std::time::Instant;

use serde::Serialize;
use tracing::Instrument;

use crate::error::WorkflowError;
use crate::state::SessionState;

use super::graph::{Target, WorkflowGraph};
use super::steps::StepLibrary;
use super::types::{StepId, WorkflowId};

#[derive(Debug, Clone, Serialize)]
pub struct StepTrace {
    pub step: StepId,
    /// Branch label chosen after this step, for conditional edges.
    pub branch: Option<&'static str>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowTrace {
    pub workflow: WorkflowId,
    pub steps: Vec<StepTrace>,
}

impl WorkflowTrace {
    pub fn visited(&self) -> Vec<StepId> {
        self.steps.iter().map(|s| s.step).collect()
    }
}

/// Sequential graph runner. One step at a time, from entry to `End`.
#[derive(Clone)]
pub struct WorkflowEngine {
    steps: StepLibrary,
}

impl WorkflowEngine {
    pub fn new(steps: StepLibrary) -> Self {
        Self { steps }
    }

    /// Run `graph` against `state`. Step failures live in the state; only routing faults return Err.
    pub async fn run(
        &self,
        graph: &WorkflowGraph,
        state: &mut SessionState,
    ) -> Result<WorkflowTrace, WorkflowError> {
        let workflow = graph.id();
        let mut trace = WorkflowTrace {
            workflow,
            steps: Vec::new(),
        };

        // 图已校验无环，每个步骤至多执行一次
        let mut current = Target::Step(graph.entry());
        while let Target::Step(step) = current {
            if trace.steps.len() >= graph.steps().len() {
                return Err(WorkflowError::Routing {
                    workflow: workflow.to_string(),
                    step: step.to_string(),
                    label: "step budget exhausted".to_string(),
                });
            }

            let span = tracing::info_span!(
                "workflow.step",
                workflow = %workflow,
                step = %step,
                session_id = %state.session_id
            );
            let started = Instant::now();
            let steps = &self.steps;
            async {
                tracing::debug!(target: "yunwei.workflow", stage = "step.start");
                steps.run(step, &mut *state).await;
            }
            .instrument(span.clone())
            .await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let (next, branch) = graph.next(step, state)?;
            span.in_scope(|| {
                tracing::info!(
                    target: "yunwei.workflow",
                    stage = "step.finish",
                    elapsed_ms,
                    branch = branch.unwrap_or("-"),
                    has_error = state.has_error()
                );
            });
            trace.steps.push(StepTrace {
                step,
                branch,
                elapsed_ms,
            });
            current = next;
        }

        Ok(trace)
    }
}
