//! 运维助手门面：会话、意图路由、工作流执行与修复方案审阅。

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::cache::MetricsCache;
use crate::config::AppConfig;
use crate::context::{AppContext, Services};
use crate::error::{PlanError, WorkflowError};
use crate::intent::IntentClassifier;
use crate::journal::JournalTx;
use crate::model::FixPlan;
use crate::plans::{edit_command, ensure_plan_ids, resolve_plan, PlanActionResult};
use crate::providers::{run_commands, CommandSpec, ExecutorPlugin};
use crate::state::{
    ExecutionPhase, ResponseType, SessionLimits, SessionManager, SessionState, StateEvent,
};
use crate::workflow::{
    StepLibrary, StepSettings, WorkflowEngine, WorkflowId, WorkflowSet, WorkflowTrace,
};

/// Result of one `run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub success: bool,
    pub response: String,
    pub summary: String,
    pub state: SessionState,
    pub session_id: String,
    pub workflow: WorkflowId,
    pub response_type: Option<ResponseType>,
    pub processing_ms: u64,
    pub error: Option<String>,
    pub trace: WorkflowTrace,
}

#[derive(Clone)]
pub struct OpsAssistant {
    sessions: SessionManager,
    classifier: Arc<IntentClassifier>,
    workflows: WorkflowSet,
    engine: WorkflowEngine,
    executor: Arc<dyn ExecutorPlugin>,
    command_timeout: Duration,
    journal: Option<JournalTx>,
}

impl OpsAssistant {
    pub fn new(
        services: Services,
        cfg: &AppConfig,
        journal: Option<JournalTx>,
    ) -> Result<Self, WorkflowError> {
        let cache = Arc::new(MetricsCache::new(Duration::from_secs(cfg.cache.ttl_secs)));
        Self::with_cache(services, cfg, journal, cache)
    }

    /// Same as [`OpsAssistant::new`] with a caller-provided cache (for an injected clock).
    pub fn with_cache(
        services: Services,
        cfg: &AppConfig,
        journal: Option<JournalTx>,
        cache: Arc<MetricsCache>,
    ) -> Result<Self, WorkflowError> {
        let classifier = Arc::new(IntentClassifier::new());
        let settings = StepSettings::from_config(cfg);
        let command_timeout = settings.command_timeout;
        let executor = services.executor.clone();
        let steps = StepLibrary::new(services, cache, classifier.clone(), settings);

        Ok(Self {
            sessions: SessionManager::with_limits(SessionLimits::from_config(&cfg.session)),
            classifier,
            workflows: WorkflowSet::new()?,
            engine: WorkflowEngine::new(steps),
            executor,
            command_timeout,
            journal,
        })
    }

    pub async fn from_context(ctx: &AppContext) -> anyhow::Result<Self> {
        let services = ctx.build_services().await?;
        Ok(Self::new(services, ctx.cfg(), ctx.journal())?)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Run a query in a fresh session.
    pub async fn run(&self, query: &str) -> Result<RunOutcome, WorkflowError> {
        let session_id = self.sessions.create_session().await;
        self.run_in_session(&session_id, query).await
    }

    /// Classify, pick a workflow and run it. Runs on one session are serialized.
    pub async fn run_in_session(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<RunOutcome, WorkflowError> {
        let session_id = self.sessions.ensure_session(session_id).await;
        let lock = self.sessions.run_lock(&session_id).await;
        let _guard = lock.lock().await;

        let mut state = self
            .sessions
            .get_session(&session_id)
            .await
            .unwrap_or_else(|_| SessionState::with_id(session_id.clone()));
        let actions_from = state.action_history.len();
        let conversations_from = state.conversation_history.len();

        state.reset_for_run(Some(query.to_string()));
        let intent = self.classifier.classify(query);
        let workflow = WorkflowId::select(&intent);
        tracing::info!(
            target: "yunwei.assistant",
            stage = "run.start",
            session_id = %session_id,
            workflow = %workflow,
            intent = %intent.intent_type,
            confidence = intent.confidence
        );
        state.intent = Some(intent);

        self.sessions.emit_event(StateEvent::RunStarted {
            session_id: session_id.clone(),
            workflow: workflow.to_string(),
            timestamp: Utc::now(),
        });

        let started = Instant::now();
        let result = self
            .engine
            .run(self.workflows.get(workflow), &mut state)
            .await;
        let processing_ms = started.elapsed().as_millis() as u64;

        let trace = match result {
            Ok(trace) => trace,
            Err(e) => {
                tracing::error!(
                    target: "yunwei.assistant",
                    stage = "run.routing_error",
                    session_id = %session_id,
                    error = %e
                );
                self.sessions.store_session(state).await;
                self.emit_finished(&session_id, workflow, false, processing_ms);
                return Err(e);
            }
        };

        let response = state.ai_response.clone().unwrap_or_default();
        if !query.trim().is_empty() && !response.is_empty() {
            state.add_conversation(query, response.clone());
        }
        self.forward_to_journal(&state, actions_from, conversations_from)
            .await;

        let success = !state.has_error();
        let outcome = RunOutcome {
            success,
            response,
            summary: state.summary(),
            session_id: session_id.clone(),
            workflow,
            response_type: state.response_type,
            processing_ms,
            error: state.error_message.clone(),
            trace,
            state: state.clone(),
        };
        self.sessions.store_session(state).await;
        self.emit_finished(&session_id, workflow, success, processing_ms);

        tracing::info!(
            target: "yunwei.assistant",
            stage = "run.finish",
            session_id = %session_id,
            success,
            processing_ms
        );
        Ok(outcome)
    }

    /// Drop a session and its run lock. Waits for an in-flight run on it to finish.
    pub async fn end_session(&self, session_id: &str) -> bool {
        let lock = self.sessions.run_lock(session_id).await;
        let _guard = lock.lock().await;
        self.sessions.remove_session(session_id).await
    }

    pub async fn current_state(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.get_session(session_id).await.ok()
    }

    pub async fn list_fix_plans(&self, session_id: &str) -> Result<Vec<FixPlan>, PlanError> {
        self.load(session_id).await.map(|s| s.fix_plans)
    }

    /// Approve a plan and run its commands in order, continuing past failures.
    pub async fn approve_fix_plan(&self, session_id: &str, plan_ref: &str) -> PlanActionResult {
        let lock = self.sessions.run_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut state = match self.load(session_id).await {
            Ok(state) => state,
            Err(e) => return PlanActionResult::failed(plan_ref, e),
        };
        let (pos, matched) = match resolve_plan(&state.fix_plans, plan_ref) {
            Ok(found) => found,
            Err(e) => return PlanActionResult::failed(plan_ref, e),
        };
        let plan = state.fix_plans[pos].clone();
        let actions_from = state.action_history.len();

        state.user_approval = Some(true);
        state.selected_plan = Some(plan.id.clone());
        if let Err(e) = state.transition_phase(ExecutionPhase::Executing) {
            return PlanActionResult::failed(plan.id, e);
        }

        let specs: Vec<CommandSpec> = plan
            .commands
            .iter()
            .map(|c| {
                let timeout = if c.timeout > 0 {
                    Duration::from_secs(c.timeout)
                } else {
                    self.command_timeout
                };
                CommandSpec::new(c.command.clone(), timeout)
            })
            .collect();

        let started = Instant::now();
        let result = match run_commands(self.executor.as_ref(), &specs).await {
            Ok(results) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                for r in &results {
                    state.add_execution_result(r.clone());
                }
                let _ = state.transition_phase(ExecutionPhase::Completed);
                PlanActionResult::executed(plan.id.clone(), results, duration_ms)
            }
            Err(e) => {
                let _ = state.transition_phase(ExecutionPhase::Failed);
                PlanActionResult::failed(plan.id.clone(), e)
            }
        };

        state.record_action(
            "approve_plan",
            json!({
                "plan_id": plan.id,
                "matched_by": format!("{matched:?}").to_lowercase(),
                "commands": specs.len(),
                "success_count": result.total_success,
                "user_edited": plan.user_edited,
            }),
        );
        self.forward_to_journal(&state, actions_from, state.conversation_history.len())
            .await;
        self.sessions.store_session(state).await;
        self.sessions.emit_event(StateEvent::PlanApproved {
            session_id: session_id.to_string(),
            plan_id: plan.id,
            total_success: result.total_success,
            total: result.results.len(),
            timestamp: Utc::now(),
        });
        result
    }

    /// Record a rejection. The plan stays in the list.
    pub async fn reject_fix_plan(&self, session_id: &str, plan_ref: &str) -> PlanActionResult {
        let lock = self.sessions.run_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut state = match self.load(session_id).await {
            Ok(state) => state,
            Err(e) => return PlanActionResult::failed(plan_ref, e),
        };
        let plan_id = match resolve_plan(&state.fix_plans, plan_ref) {
            Ok((pos, _)) => state.fix_plans[pos].id.clone(),
            Err(e) => return PlanActionResult::failed(plan_ref, e),
        };
        let actions_from = state.action_history.len();

        state.user_approval = Some(false);
        state.record_action("reject_plan", json!({"plan_id": plan_id}));
        self.forward_to_journal(&state, actions_from, state.conversation_history.len())
            .await;
        self.sessions.store_session(state).await;
        self.sessions.emit_event(StateEvent::PlanRejected {
            session_id: session_id.to_string(),
            plan_id: plan_id.clone(),
            timestamp: Utc::now(),
        });
        PlanActionResult::ok(plan_id, "已拒绝修复方案")
    }

    pub async fn edit_plan_command(
        &self,
        session_id: &str,
        plan_ref: &str,
        command_index: usize,
        new_command: &str,
    ) -> PlanActionResult {
        let lock = self.sessions.run_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut state = match self.load(session_id).await {
            Ok(state) => state,
            Err(e) => return PlanActionResult::failed(plan_ref, e),
        };
        let pos = match resolve_plan(&state.fix_plans, plan_ref) {
            Ok((pos, _)) => pos,
            Err(e) => return PlanActionResult::failed(plan_ref, e),
        };
        let plan_id = state.fix_plans[pos].id.clone();
        let previous = match edit_command(&mut state.fix_plans[pos], command_index, new_command) {
            Ok(previous) => previous,
            Err(e) => return PlanActionResult::failed(plan_id, e),
        };
        let actions_from = state.action_history.len();

        state.record_action(
            "edit_plan_command",
            json!({
                "plan_id": plan_id,
                "command_index": command_index,
                "previous_command": previous,
                "new_command": new_command.trim(),
            }),
        );
        self.forward_to_journal(&state, actions_from, state.conversation_history.len())
            .await;
        self.sessions.store_session(state).await;
        self.sessions.emit_event(StateEvent::PlanEdited {
            session_id: session_id.to_string(),
            plan_id: plan_id.clone(),
            command_index,
            timestamp: Utc::now(),
        });
        PlanActionResult::ok(plan_id, "命令已更新")
    }

    /// Replace the session's plan list, e.g. with follow-up plans.
    pub async fn save_fix_plans(
        &self,
        session_id: &str,
        mut plans: Vec<FixPlan>,
    ) -> Result<usize, PlanError> {
        let lock = self.sessions.run_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut state = self.load(session_id).await?;
        let actions_from = state.action_history.len();
        ensure_plan_ids(&mut plans);
        let count = plans.len();
        state.set_fix_plans(plans);
        state.record_action("save_fix_plans", json!({"count": count}));
        self.forward_to_journal(&state, actions_from, state.conversation_history.len())
            .await;
        self.sessions.store_session(state).await;
        Ok(count)
    }

    async fn load(&self, session_id: &str) -> Result<SessionState, PlanError> {
        self.sessions
            .get_session(session_id)
            .await
            .map_err(|_| PlanError::SessionNotFound(session_id.to_string()))
    }

    fn emit_finished(&self, session_id: &str, workflow: WorkflowId, success: bool, ms: u64) {
        self.sessions.emit_event(StateEvent::RunFinished {
            session_id: session_id.to_string(),
            workflow: workflow.to_string(),
            success,
            duration_ms: ms,
            timestamp: Utc::now(),
        });
    }

    async fn forward_to_journal(
        &self,
        state: &SessionState,
        actions_from: usize,
        conversations_from: usize,
    ) {
        let Some(journal) = &self.journal else {
            return;
        };
        for record in state.action_history.iter().skip(actions_from) {
            journal.record_action(&state.session_id, record).await;
        }
        for entry in state.conversation_history.iter().skip(conversations_from) {
            journal.record_conversation(&state.session_id, entry).await;
        }
    }
}
