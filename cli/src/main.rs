use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use yunwei_core::api::{AppContext, LoggingConfig, OpsAssistant, StateEvent};
use yunwei_plugins::services::PluginServicesFactory;

mod app;
mod commands;
mod error;

use commands::cli::{self, Commands};
use error::CliError;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = match args.config.as_deref() {
        Some(path) => yunwei_core::api::load_from_path(Path::new(path)),
        None => yunwei_core::api::load_default(),
    }
    .map_err(|e| CliError::Config(format!("{e:#}")))?;
    init_tracing(&cfg.logging).map_err(CliError::Config)?;

    let ctx = AppContext::new(cfg, Some(Arc::new(PluginServicesFactory))).await?;
    let ops = OpsAssistant::from_context(&ctx).await?;
    spawn_event_logger(&ops);

    let fresh = new_session_id;
    match args.command {
        Commands::Ask { session, query } => {
            let session = session.unwrap_or_else(fresh);
            app::ask(&ops, &session, &query.join(" "), args.json).await
        }
        Commands::Repl { session } => {
            let session = session.unwrap_or_else(fresh);
            app::repl(&ops, &session, args.json).await
        }
        Commands::Plans { query, action } => {
            app::plans(&ops, &fresh(), &query, &action, args.json).await
        }
        Commands::State { query } => app::state(&ops, &fresh(), &query).await,
    }
}

fn new_session_id() -> String {
    format!("cli-{}", uuid::Uuid::new_v4())
}

fn spawn_event_logger(ops: &OpsAssistant) {
    let mut event_rx = ops.sessions().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            match event {
                StateEvent::RunFinished {
                    session_id,
                    workflow,
                    success,
                    duration_ms,
                    ..
                } => {
                    tracing::info!(
                        target: "yunwei.cli",
                        stage = "session.run_finished",
                        session_id = %session_id,
                        workflow = %workflow,
                        success,
                        duration_ms
                    );
                }
                other => {
                    tracing::debug!(
                        target: "yunwei.cli",
                        stage = "session.event",
                        session_id = %other.session_id()
                    );
                }
            }
        }
    });
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 1: the run or plan action reported failure (returned as a normal exit code)
    // 11: config error
    // 20: IO error
    // 30: workflow routing bug
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Io(_) => 20,
        CliError::Workflow(_) => 30,
        CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("yunwei"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let appender = tracing_appender::rolling::daily(dir, "yunwei.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Ok(());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
