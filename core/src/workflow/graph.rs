use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{GraphError, WorkflowError};
use crate::state::SessionState;

use super::types::{StepId, WorkflowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Step(StepId),
    End,
}

/// Branch predicate: inspects state and returns a branch label.
pub type Predicate = fn(&SessionState) -> &'static str;

#[derive(Clone)]
pub enum Edge {
    Direct(Target),
    Conditional {
        name: &'static str,
        predicate: Predicate,
        branches: Vec<(&'static str, Target)>,
    },
}

impl Edge {
    fn targets(&self) -> Vec<Target> {
        match self {
            Self::Direct(t) => vec![*t],
            Self::Conditional { branches, .. } => branches.iter().map(|(_, t)| *t).collect(),
        }
    }
}

/// A validated workflow graph. Only [`GraphBuilder::build`] creates one.
#[derive(Clone)]
pub struct WorkflowGraph {
    id: WorkflowId,
    entry: StepId,
    /// Insertion order
    steps: Vec<StepId>,
    edges: HashMap<StepId, Edge>,
}

impl WorkflowGraph {
    pub fn builder(id: WorkflowId) -> GraphBuilder {
        GraphBuilder::new(id)
    }

    pub fn id(&self) -> WorkflowId {
        self.id
    }

    pub fn entry(&self) -> StepId {
        self.entry
    }

    pub fn steps(&self) -> &[StepId] {
        &self.steps
    }

    pub fn contains(&self, step: StepId) -> bool {
        self.steps.contains(&step)
    }

    /// Resolve the successor of `from`. Returns the branch label taken, if any.
    pub fn next(
        &self,
        from: StepId,
        state: &SessionState,
    ) -> Result<(Target, Option<&'static str>), WorkflowError> {
        let edge = self.edges.get(&from).ok_or_else(|| WorkflowError::UnknownStep {
            workflow: self.id.to_string(),
            step: from.to_string(),
        })?;

        match edge {
            Edge::Direct(target) => Ok((*target, None)),
            Edge::Conditional {
                predicate,
                branches,
                ..
            } => {
                let label = predicate(state);
                branches
                    .iter()
                    .find(|(l, _)| *l == label)
                    .map(|(_, target)| (*target, Some(label)))
                    .ok_or_else(|| WorkflowError::Routing {
                        workflow: self.id.to_string(),
                        step: from.to_string(),
                        label: label.to_string(),
                    })
            }
        }
    }
}

pub struct GraphBuilder {
    id: WorkflowId,
    entry: Option<StepId>,
    steps: Vec<StepId>,
    edges: Vec<(StepId, Edge)>,
}

impl GraphBuilder {
    pub fn new(id: WorkflowId) -> Self {
        Self {
            id,
            entry: None,
            steps: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn step(mut self, step: StepId) -> Self {
        self.steps.push(step);
        self
    }

    pub fn entry(mut self, step: StepId) -> Self {
        self.entry = Some(step);
        self
    }

    pub fn edge(mut self, from: StepId, to: Target) -> Self {
        self.edges.push((from, Edge::Direct(to)));
        self
    }

    pub fn conditional(
        mut self,
        from: StepId,
        name: &'static str,
        predicate: Predicate,
        branches: &[(&'static str, Target)],
    ) -> Self {
        self.edges.push((
            from,
            Edge::Conditional {
                name,
                predicate,
                branches: branches.to_vec(),
            },
        ));
        self
    }

    /// Validate and freeze the graph.
    pub fn build(self) -> Result<WorkflowGraph, GraphError> {
        let workflow = self.id.to_string();

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(*step) {
                return Err(GraphError::DuplicateStep {
                    workflow,
                    step: step.to_string(),
                });
            }
        }

        let entry = match self.entry {
            Some(entry) if seen.contains(&entry) => entry,
            _ => return Err(GraphError::NoEntry { workflow }),
        };

        let mut edges = HashMap::new();
        for (from, edge) in self.edges {
            if !seen.contains(&from) {
                return Err(GraphError::UnknownSource {
                    workflow,
                    step: from.to_string(),
                });
            }
            for target in edge.targets() {
                if let Target::Step(to) = target {
                    if !seen.contains(&to) {
                        return Err(GraphError::MissingTarget {
                            workflow,
                            from: from.to_string(),
                            to: to.to_string(),
                        });
                    }
                }
            }
            if edges.insert(from, edge).is_some() {
                return Err(GraphError::DuplicateEdge {
                    workflow,
                    step: from.to_string(),
                });
            }
        }

        for step in &self.steps {
            if !edges.contains_key(step) {
                return Err(GraphError::DanglingStep {
                    workflow,
                    step: step.to_string(),
                });
            }
        }

        let graph = WorkflowGraph {
            id: self.id,
            entry,
            steps: self.steps,
            edges,
        };

        if let Some(step) = graph.first_unreachable() {
            return Err(GraphError::Unreachable {
                workflow,
                step: step.to_string(),
            });
        }

        if let Some(cycle) = graph.detect_cycle() {
            return Err(GraphError::Cycle {
                workflow,
                step: cycle,
            });
        }

        Ok(graph)
    }
}

impl WorkflowGraph {
    fn successors(&self, step: StepId) -> Vec<StepId> {
        self.edges
            .get(&step)
            .map(|edge| {
                edge.targets()
                    .into_iter()
                    .filter_map(|t| match t {
                        Target::Step(s) => Some(s),
                        Target::End => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn first_unreachable(&self) -> Option<StepId> {
        let mut visited = HashSet::from([self.entry]);
        let mut queue = VecDeque::from([self.entry]);
        while let Some(step) = queue.pop_front() {
            for next in self.successors(step) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        self.steps.iter().copied().find(|s| !visited.contains(s))
    }

    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for step in &self.steps {
            if !visited.contains(step) && self.dfs_cycle(*step, &mut visited, &mut stack) {
                return Some(format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: StepId,
        visited: &mut HashSet<StepId>,
        stack: &mut Vec<StepId>,
    ) -> bool {
        visited.insert(node);
        stack.push(node);

        for next in self.successors(node) {
            // 当前路径上再次出现即成环
            if let Some(pos) = stack.iter().position(|s| *s == next) {
                stack.push(next);
                *stack = stack[pos..].to_vec();
                return true;
            }

            if !visited.contains(&next) && self.dfs_cycle(next, visited, stack) {
                return true;
            }
        }

        stack.pop();
        false
    }
}

fn format_cycle_path(stack: &[StepId]) -> String {
    stack
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_yes(_: &SessionState) -> &'static str {
        "yes"
    }

    fn always_maybe(_: &SessionState) -> &'static str {
        "maybe"
    }

    fn two_step(predicate: Predicate) -> WorkflowGraph {
        WorkflowGraph::builder(WorkflowId::Chat)
            .step(StepId::RouteIntent)
            .step(StepId::ChatResponse)
            .entry(StepId::RouteIntent)
            .conditional(
                StepId::RouteIntent,
                "check",
                predicate,
                &[
                    ("yes", Target::Step(StepId::ChatResponse)),
                    ("no", Target::End),
                ],
            )
            .edge(StepId::ChatResponse, Target::End)
            .build()
            .unwrap()
    }

    #[test]
    fn test_conditional_routing() {
        let graph = two_step(always_yes);
        let state = SessionState::new();
        let (target, label) = graph.next(StepId::RouteIntent, &state).unwrap();
        assert_eq!(target, Target::Step(StepId::ChatResponse));
        assert_eq!(label, Some("yes"));
        assert_eq!(
            graph.next(StepId::ChatResponse, &state).unwrap(),
            (Target::End, None)
        );
    }

    #[test]
    fn test_unmatched_label_is_routing_error() {
        let graph = two_step(always_maybe);
        let err = graph
            .next(StepId::RouteIntent, &SessionState::new())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Routing { ref label, .. } if label == "maybe"));
    }

    #[test]
    fn test_unknown_step() {
        let graph = two_step(always_yes);
        assert!(matches!(
            graph.next(StepId::ExecutePlan, &SessionState::new()),
            Err(WorkflowError::UnknownStep { .. })
        ));
    }

    #[test]
    fn test_build_rejects_invalid_graphs() {
        let dup = WorkflowGraph::builder(WorkflowId::Chat)
            .step(StepId::RouteIntent)
            .step(StepId::RouteIntent)
            .entry(StepId::RouteIntent)
            .build();
        assert!(matches!(dup, Err(GraphError::DuplicateStep { .. })));

        let no_entry = WorkflowGraph::builder(WorkflowId::Chat)
            .step(StepId::RouteIntent)
            .edge(StepId::RouteIntent, Target::End)
            .build();
        assert!(matches!(no_entry, Err(GraphError::NoEntry { .. })));

        let missing = WorkflowGraph::builder(WorkflowId::Chat)
            .step(StepId::RouteIntent)
            .entry(StepId::RouteIntent)
            .edge(StepId::RouteIntent, Target::Step(StepId::ChatResponse))
            .build();
        assert!(matches!(missing, Err(GraphError::MissingTarget { .. })));

        let dangling = WorkflowGraph::builder(WorkflowId::Chat)
            .step(StepId::RouteIntent)
            .entry(StepId::RouteIntent)
            .build();
        assert!(matches!(dangling, Err(GraphError::DanglingStep { .. })));

        let unreachable = WorkflowGraph::builder(WorkflowId::Chat)
            .step(StepId::RouteIntent)
            .step(StepId::ChatResponse)
            .entry(StepId::RouteIntent)
            .edge(StepId::RouteIntent, Target::End)
            .edge(StepId::ChatResponse, Target::End)
            .build();
        assert!(matches!(unreachable, Err(GraphError::Unreachable { .. })));
    }

    #[test]
    fn test_build_rejects_cycle() {
        let cyclic = WorkflowGraph::builder(WorkflowId::SystemCheck)
            .step(StepId::CollectMetrics)
            .step(StepId::AnalyzeSystem)
            .entry(StepId::CollectMetrics)
            .edge(StepId::CollectMetrics, Target::Step(StepId::AnalyzeSystem))
            .edge(StepId::AnalyzeSystem, Target::Step(StepId::CollectMetrics))
            .build();
        match cyclic {
            Err(GraphError::Cycle { step, .. }) => {
                assert_eq!(step, "collect_metrics -> analyze_system -> collect_metrics");
            }
            other => panic!("expected cycle, got {:?}", other.err()),
        }
    }
}
