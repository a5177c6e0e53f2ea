use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use yunwei_core::api::{OpsAssistant, PlanActionResult, RunOutcome};

use crate::commands::cli::PlanAction;
use crate::error::CliError;

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(anyhow::Error::from)?;
    println!("{text}");
    Ok(())
}

fn print_outcome(outcome: &RunOutcome, json: bool) -> Result<(), CliError> {
    if json {
        return print_json(outcome);
    }
    println!("{}", outcome.response);
    let path: Vec<String> = outcome
        .trace
        .visited()
        .iter()
        .map(ToString::to_string)
        .collect();
    eprintln!(
        "[{} | {} | {}ms | {}]",
        outcome.workflow,
        if outcome.success { "ok" } else { "failed" },
        outcome.processing_ms,
        path.join(" → ")
    );
    Ok(())
}

fn print_plan_result(result: &PlanActionResult, json: bool) -> Result<i32, CliError> {
    if json {
        print_json(result)?;
    } else {
        match &result.error {
            Some(err) => println!("❌ {}: {err}", result.plan_id),
            None => println!("✅ {}: {}", result.plan_id, result.message),
        }
        for r in &result.results {
            let icon = if r.success { "✅" } else { "❌" };
            println!("  {icon} {} ({}ms)", r.command, r.duration_ms);
            if let Some(err) = &r.error {
                println!("     {err}");
            }
        }
    }
    Ok(if result.success { 0 } else { 1 })
}

pub async fn ask(ops: &OpsAssistant, session: &str, query: &str, json: bool) -> Result<i32, CliError> {
    let outcome = ops.run_in_session(session, query).await?;
    print_outcome(&outcome, json)?;
    Ok(if outcome.success { 0 } else { 1 })
}

pub async fn state(ops: &OpsAssistant, session: &str, query: &str) -> Result<i32, CliError> {
    let outcome = ops.run_in_session(session, query).await?;
    print_json(&outcome.state)?;
    Ok(0)
}

/// Run `query` first so the session has plans to review.
pub async fn plans(
    ops: &OpsAssistant,
    session: &str,
    query: &str,
    action: &PlanAction,
    json: bool,
) -> Result<i32, CliError> {
    let outcome = ops.run_in_session(session, query).await?;
    if !outcome.success {
        eprintln!("{}", outcome.response);
    }
    plan_action(ops, session, action, json).await
}

pub async fn plan_action(
    ops: &OpsAssistant,
    session: &str,
    action: &PlanAction,
    json: bool,
) -> Result<i32, CliError> {
    match action {
        PlanAction::List => {
            let plans = ops
                .list_fix_plans(session)
                .await
                .map_err(anyhow::Error::from)?;
            if json {
                print_json(&plans)?;
            } else if plans.is_empty() {
                println!("暂无修复方案");
            } else {
                for (i, plan) in plans.iter().enumerate() {
                    let edited = if plan.user_edited { " (已编辑)" } else { "" };
                    println!("{}. [{}] {}{edited}", i + 1, plan.id, plan.issue);
                    for (j, cmd) in plan.commands.iter().enumerate() {
                        println!("     {j}: {}", cmd.command);
                    }
                }
            }
            Ok(0)
        }
        PlanAction::Approve { plan_id, yes } => {
            if !yes {
                eprintln!("approving runs the plan's commands on this host; pass --yes to confirm");
                return Ok(1);
            }
            print_plan_result(&ops.approve_fix_plan(session, plan_id).await, json)
        }
        PlanAction::Reject { plan_id } => {
            print_plan_result(&ops.reject_fix_plan(session, plan_id).await, json)
        }
        PlanAction::Edit {
            plan_id,
            index,
            command,
        } => {
            let result = ops
                .edit_plan_command(session, plan_id, *index, &command.join(" "))
                .await;
            print_plan_result(&result, json)
        }
    }
}

/// Parse a `/command` line typed in the REPL.
fn parse_repl_command(line: &str) -> Option<ReplCommand> {
    let mut parts = line.trim().trim_start_matches('/').split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();
    let cmd = match (head, rest.as_slice()) {
        ("quit" | "exit", _) => ReplCommand::Quit,
        ("state", _) => ReplCommand::State,
        ("plans", _) => ReplCommand::Plan(PlanAction::List),
        ("approve", [id]) => ReplCommand::Plan(PlanAction::Approve {
            plan_id: id.to_string(),
            yes: true,
        }),
        ("reject", [id]) => ReplCommand::Plan(PlanAction::Reject {
            plan_id: id.to_string(),
        }),
        ("edit", [id, index, command @ ..]) if !command.is_empty() => {
            ReplCommand::Plan(PlanAction::Edit {
                plan_id: id.to_string(),
                index: index.parse().ok()?,
                command: command.iter().map(|s| s.to_string()).collect(),
            })
        }
        _ => return None,
    };
    Some(cmd)
}

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Quit,
    State,
    Plan(PlanAction),
}

const REPL_HELP: &str = "命令: /plans  /approve <id>  /reject <id>  /edit <id> <序号> <命令>  /state  /quit";

pub async fn repl(ops: &OpsAssistant, session: &str, json: bool) -> Result<i32, CliError> {
    println!("智能运维助手 (会话 {session})");
    println!("{REPL_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('/') {
            match parse_repl_command(line) {
                Some(ReplCommand::Quit) => break,
                Some(ReplCommand::State) => match ops.current_state(session).await {
                    Some(state) => print_json(&state)?,
                    None => println!("会话尚无状态"),
                },
                Some(ReplCommand::Plan(action)) => {
                    plan_action(ops, session, &action, json).await?;
                }
                None => println!("{REPL_HELP}"),
            }
            continue;
        }

        match ops.run_in_session(session, line).await {
            Ok(outcome) => print_outcome(&outcome, json)?,
            Err(e) => {
                tracing::error!(target: "yunwei.cli", stage = "repl.run_failed", error = %e);
                eprintln!("内部错误: {e}");
            }
        }
    }
    ops.end_session(session).await;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repl_commands() {
        assert_eq!(parse_repl_command("/quit"), Some(ReplCommand::Quit));
        assert_eq!(
            parse_repl_command("/approve plan_1"),
            Some(ReplCommand::Plan(PlanAction::Approve {
                plan_id: "plan_1".into(),
                yes: true
            }))
        );
        assert_eq!(
            parse_repl_command("/edit plan_1 0 du -sh /var"),
            Some(ReplCommand::Plan(PlanAction::Edit {
                plan_id: "plan_1".into(),
                index: 0,
                command: vec!["du".into(), "-sh".into(), "/var".into()]
            }))
        );
        assert_eq!(parse_repl_command("/edit plan_1 x ls"), None);
        assert_eq!(parse_repl_command("/approve"), None);
        assert_eq!(parse_repl_command("/unknown"), None);
    }
}
