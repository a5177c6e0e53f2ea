//! 本地 shell 执行器：`sh -c <command>`，每条命令独立超时。

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use yunwei_core::api::{ExecutionResult, ExecutorPlugin, ExecutorSession};

pub struct LocalShellExecutor {
    shell: String,
}

impl LocalShellExecutor {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

#[async_trait]
impl ExecutorPlugin for LocalShellExecutor {
    fn name(&self) -> &str {
        "local_shell"
    }

    async fn connect(&self) -> anyhow::Result<Box<dyn ExecutorSession>> {
        Ok(Box::new(LocalShellSession {
            shell: self.shell.clone(),
        }))
    }
}

struct LocalShellSession {
    shell: String,
}

#[async_trait]
impl ExecutorSession for LocalShellSession {
    async fn run(&mut self, command: &str, timeout: Duration) -> ExecutionResult {
        let started = Instant::now();
        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let outcome = tokio::time::timeout(timeout, child).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                ExecutionResult {
                    command: command.to_string(),
                    success: output.status.success(),
                    output: String::from_utf8_lossy(&output.stdout).into_owned(),
                    error: (!stderr.is_empty()).then_some(stderr),
                    duration_ms,
                    timestamp: Utc::now(),
                }
            }
            Ok(Err(e)) => ExecutionResult::failed(command, format!("spawn {}: {e}", self.shell), duration_ms),
            Err(_) => ExecutionResult::failed(
                command,
                format!("command timed out after {}s", timeout.as_secs()),
                duration_ms,
            ),
        }
    }

    async fn close(&mut self) {}
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    async fn run(cmd: &str, timeout: Duration) -> ExecutionResult {
        let exec = LocalShellExecutor::new("sh");
        let mut session = exec.connect().await.unwrap();
        let r = session.run(cmd, timeout).await;
        session.close().await;
        r
    }

    #[tokio::test]
    async fn test_success_captures_stdout() {
        let r = run("echo hello", Duration::from_secs(5)).await;
        assert!(r.success);
        assert_eq!(r.output.trim(), "hello");
        assert!(r.error.is_none());
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let r = run("echo boom >&2; exit 3", Duration::from_secs(5)).await;
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_timeout_is_a_failed_result() {
        let r = run("sleep 5", Duration::from_millis(100)).await;
        assert!(!r.success);
        assert!(r.error.unwrap().contains("timed out"));
    }
}
