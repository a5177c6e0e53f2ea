#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use yunwei_core::api::{
    AppConfig, ExecutionResult, ExecutorPlugin, ExecutorSession, LlmPlugin, Metric, MetricsCache,
    MetricsPlugin, OpsAssistant, Services,
};

/// Metrics provider returning a fixed set, optionally failing.
pub struct FakeMetrics {
    pub metrics: Mutex<Vec<Metric>>,
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl FakeMetrics {
    pub fn new(metrics: Vec<Metric>) -> Arc<Self> {
        Arc::new(Self {
            metrics: Mutex::new(metrics),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        let m = Self::new(Vec::new());
        m.fail.store(true, Ordering::SeqCst);
        m
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsPlugin for FakeMetrics {
    fn name(&self) -> &str {
        "fake-metrics"
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Metric>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("prometheus unreachable");
        }
        Ok(self.metrics.lock().unwrap().clone())
    }
}

/// LLM that replays scripted replies, then falls back to a default.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
    default_reply: String,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedLlm {
    pub fn new(default_reply: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: default_reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn push_ok(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_err(&self, err: &str) {
        self.replies.lock().unwrap().push_back(Err(err.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmPlugin for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted-llm"
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => Ok(self.default_reply.clone()),
        }
    }
}

/// Executor recording every command; commands containing `fail_marker` fail.
pub struct RecordingExecutor {
    pub commands: Arc<Mutex<Vec<String>>>,
    pub connects: AtomicUsize,
    fail_marker: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            commands: Arc::new(Mutex::new(Vec::new())),
            connects: AtomicUsize::new(0),
            fail_marker: None,
        })
    }

    pub fn failing_on(marker: &str) -> Arc<Self> {
        Arc::new(Self {
            commands: Arc::new(Mutex::new(Vec::new())),
            connects: AtomicUsize::new(0),
            fail_marker: Some(marker.to_string()),
        })
    }

    pub fn ran(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

struct RecordingSession {
    commands: Arc<Mutex<Vec<String>>>,
    fail_marker: Option<String>,
}

#[async_trait]
impl ExecutorPlugin for RecordingExecutor {
    fn name(&self) -> &str {
        "recording"
    }

    async fn connect(&self) -> anyhow::Result<Box<dyn ExecutorSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingSession {
            commands: self.commands.clone(),
            fail_marker: self.fail_marker.clone(),
        }))
    }
}

#[async_trait]
impl ExecutorSession for RecordingSession {
    async fn run(&mut self, command: &str, _timeout: Duration) -> ExecutionResult {
        self.commands.lock().unwrap().push(command.to_string());
        match &self.fail_marker {
            Some(marker) if command.contains(marker.as_str()) => {
                ExecutionResult::failed(command, "exit status 1", 1)
            }
            _ => ExecutionResult::succeeded(command, "ok", 1),
        }
    }

    async fn close(&mut self) {}
}

pub fn healthy_metrics() -> Vec<Metric> {
    vec![
        Metric::evaluated("cpu_usage_percent", 20.0, "%", Some(80.0)),
        Metric::evaluated("memory_usage_percent", 40.0, "%", Some(85.0)),
        Metric::evaluated("disk_usage_percent", 50.0, "%", Some(90.0)),
    ]
}

pub fn services(
    metrics: Arc<FakeMetrics>,
    llm: Arc<ScriptedLlm>,
    executor: Arc<RecordingExecutor>,
) -> Services {
    Services {
        metrics,
        llm,
        executor,
    }
}

pub fn assistant(
    metrics: Arc<FakeMetrics>,
    llm: Arc<ScriptedLlm>,
    executor: Arc<RecordingExecutor>,
) -> OpsAssistant {
    OpsAssistant::new(services(metrics, llm, executor), &AppConfig::default(), None).unwrap()
}

pub fn assistant_with_cache(
    metrics: Arc<FakeMetrics>,
    llm: Arc<ScriptedLlm>,
    executor: Arc<RecordingExecutor>,
    cache: Arc<MetricsCache>,
) -> OpsAssistant {
    OpsAssistant::with_cache(
        services(metrics, llm, executor),
        &AppConfig::default(),
        None,
        cache,
    )
    .unwrap()
}
