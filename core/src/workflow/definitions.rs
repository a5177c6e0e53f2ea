use crate::error::GraphError;

use super::graph::{Target, WorkflowGraph};
use super::predicates::{
    analysis_check, metrics_check, plan_check, ERROR, EXECUTE, HEALTHY, NEEDS_ACTION,
    SKIP_EXECUTION, SUCCESS,
};
use super::types::{StepId, WorkflowId};

/// Build and validate one of the four workflow graphs.
pub fn build_workflow(id: WorkflowId) -> Result<WorkflowGraph, GraphError> {
    match id {
        WorkflowId::Chat => chat(),
        WorkflowId::SystemCheck => system_check(),
        WorkflowId::SystemInfo => system_info(),
        WorkflowId::Troubleshoot => troubleshoot(),
    }
}

fn chat() -> Result<WorkflowGraph, GraphError> {
    WorkflowGraph::builder(WorkflowId::Chat)
        .step(StepId::RouteIntent)
        .step(StepId::ChatResponse)
        .entry(StepId::RouteIntent)
        .edge(StepId::RouteIntent, Target::Step(StepId::ChatResponse))
        .edge(StepId::ChatResponse, Target::End)
        .build()
}

fn system_check() -> Result<WorkflowGraph, GraphError> {
    use StepId::*;

    WorkflowGraph::builder(WorkflowId::SystemCheck)
        .step(CollectMetrics)
        .step(AnalyzeSystem)
        .step(GeneratePlan)
        .step(ExecutePlan)
        .step(ReportResults)
        .step(HandleErrors)
        .entry(CollectMetrics)
        .conditional(
            CollectMetrics,
            "metrics_check",
            metrics_check,
            &[
                (SUCCESS, Target::Step(AnalyzeSystem)),
                (ERROR, Target::Step(HandleErrors)),
            ],
        )
        .conditional(
            AnalyzeSystem,
            "analysis_check",
            analysis_check,
            &[
                (NEEDS_ACTION, Target::Step(GeneratePlan)),
                (HEALTHY, Target::Step(ReportResults)),
                (ERROR, Target::Step(HandleErrors)),
            ],
        )
        .conditional(
            GeneratePlan,
            "plan_check",
            plan_check,
            &[
                (EXECUTE, Target::Step(ExecutePlan)),
                (SKIP_EXECUTION, Target::Step(ReportResults)),
            ],
        )
        .edge(ExecutePlan, Target::Step(ReportResults))
        .edge(HandleErrors, Target::Step(ReportResults))
        .edge(ReportResults, Target::End)
        .build()
}

fn system_info() -> Result<WorkflowGraph, GraphError> {
    WorkflowGraph::builder(WorkflowId::SystemInfo)
        .step(StepId::CollectBasicMetrics)
        .step(StepId::ProvideSystemInfo)
        .entry(StepId::CollectBasicMetrics)
        .edge(
            StepId::CollectBasicMetrics,
            Target::Step(StepId::ProvideSystemInfo),
        )
        .edge(StepId::ProvideSystemInfo, Target::End)
        .build()
}

fn troubleshoot() -> Result<WorkflowGraph, GraphError> {
    WorkflowGraph::builder(WorkflowId::Troubleshoot)
        .step(StepId::CollectRelevantMetrics)
        .step(StepId::AnalyzeProblem)
        .step(StepId::ProvideSolution)
        .entry(StepId::CollectRelevantMetrics)
        .edge(
            StepId::CollectRelevantMetrics,
            Target::Step(StepId::AnalyzeProblem),
        )
        .edge(StepId::AnalyzeProblem, Target::Step(StepId::ProvideSolution))
        .edge(StepId::ProvideSolution, Target::End)
        .build()
}

/// All four graphs, validated once at startup.
#[derive(Clone)]
pub struct WorkflowSet {
    chat: WorkflowGraph,
    system_check: WorkflowGraph,
    system_info: WorkflowGraph,
    troubleshoot: WorkflowGraph,
}

impl WorkflowSet {
    pub fn new() -> Result<Self, GraphError> {
        Ok(Self {
            chat: chat()?,
            system_check: system_check()?,
            system_info: system_info()?,
            troubleshoot: troubleshoot()?,
        })
    }

    pub fn get(&self, id: WorkflowId) -> &WorkflowGraph {
        match id {
            WorkflowId::Chat => &self.chat,
            WorkflowId::SystemCheck => &self.system_check,
            WorkflowId::SystemInfo => &self.system_info,
            WorkflowId::Troubleshoot => &self.troubleshoot,
        }
    }
}
