use std::time::Duration;

use crate::error::ProviderError;
use crate::model::ExecutionResult;

use super::traits::ExecutorPlugin;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }
}

/// Run commands in order over one connection. A failing command does not stop the batch.
///
/// Only a failed `connect` is an error; the session is closed on every other path.
pub async fn run_commands(
    executor: &dyn ExecutorPlugin,
    commands: &[CommandSpec],
) -> Result<Vec<ExecutionResult>, ProviderError> {
    if commands.is_empty() {
        return Ok(Vec::new());
    }

    let mut session = executor.connect().await.map_err(ProviderError::executor)?;
    let mut results = Vec::with_capacity(commands.len());

    for (i, cmd) in commands.iter().enumerate() {
        tracing::info!(
            target: "yunwei.executor",
            stage = "executor.command",
            executor = executor.name(),
            index = i + 1,
            total = commands.len(),
            command = %cmd.command
        );
        let result = session.run(&cmd.command, cmd.timeout).await;
        if !result.success {
            tracing::warn!(
                target: "yunwei.executor",
                stage = "executor.command_failed",
                command = %cmd.command,
                error = result.error.as_deref().unwrap_or("")
            );
        }
        results.push(result);
    }

    session.close().await;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ExecutorSession;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recording {
        ran: Mutex<Vec<String>>,
        closed: AtomicBool,
    }

    struct Exec(Arc<Recording>);

    struct Session(Arc<Recording>);

    #[async_trait]
    impl ExecutorPlugin for Exec {
        fn name(&self) -> &str {
            "recording"
        }

        async fn connect(&self) -> anyhow::Result<Box<dyn ExecutorSession>> {
            Ok(Box::new(Session(self.0.clone())))
        }
    }

    #[async_trait]
    impl ExecutorSession for Session {
        async fn run(&mut self, command: &str, _timeout: Duration) -> ExecutionResult {
            self.0.ran.lock().unwrap().push(command.to_string());
            if command.starts_with("fail") {
                ExecutionResult::failed(command, "exit status 1", 1)
            } else {
                ExecutionResult::succeeded(command, "ok", 1)
            }
        }

        async fn close(&mut self) {
            self.0.closed.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_continue_on_failure_and_close() {
        let rec = Arc::new(Recording::default());
        let exec = Exec(rec.clone());
        let specs = vec![
            CommandSpec::new("fail cmd1", Duration::from_secs(1)),
            CommandSpec::new("cmd2", Duration::from_secs(1)),
        ];

        let results = run_commands(&exec, &specs).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[1].success);
        assert_eq!(*rec.ran.lock().unwrap(), vec!["fail cmd1", "cmd2"]);
        assert!(rec.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_batch_does_not_connect() {
        struct NoConnect;

        #[async_trait]
        impl ExecutorPlugin for NoConnect {
            fn name(&self) -> &str {
                "no-connect"
            }

            async fn connect(&self) -> anyhow::Result<Box<dyn ExecutorSession>> {
                anyhow::bail!("should not connect")
            }
        }

        assert!(run_commands(&NoConnect, &[]).await.unwrap().is_empty());
        let err = run_commands(&NoConnect, &[CommandSpec::new("x", Duration::from_secs(1))])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Executor(_)));
    }
}
