use super::report::AnalysisReport;

struct Rule {
    all_of: &'static [&'static [&'static str]],
    command: &'static str,
}

// 顺序即优先级
const RULES: &[Rule] = &[
    Rule {
        all_of: &[&["cpu"], &["进程", "process"]],
        command: "ps aux --sort=-%cpu | head -10",
    },
    Rule {
        all_of: &[&["内存", "memory"], &["缓存", "cache"]],
        command: "sync && echo 3 > /proc/sys/vm/drop_caches",
    },
    Rule {
        all_of: &[&["磁盘", "disk"], &["清理", "clean"]],
        command: "find /tmp -type f -atime +7 -delete",
    },
    Rule {
        all_of: &[&["临时文件", "temp"]],
        command: "find /tmp -type f -size +100M -exec ls -lh {} \\;",
    },
    Rule {
        all_of: &[&["系统", "system"], &["状态", "status"]],
        command: "top -bn1 | head -20",
    },
    Rule {
        all_of: &[&["网络", "network"], &["连接", "connection"]],
        command: "netstat -an | grep ESTABLISHED | wc -l",
    },
    Rule {
        all_of: &[&["检查", "check"]],
        command: "uptime && free -h && df -h",
    },
];

/// Map a natural-language suggestion onto a literal shell command.
pub fn command_for_action(action: &str) -> Option<&'static str> {
    let lower = action.to_lowercase();
    RULES
        .iter()
        .find(|rule| {
            rule.all_of
                .iter()
                .all(|any_of| any_of.iter().any(|kw| lower.contains(kw)))
        })
        .map(|rule| rule.command)
}

/// Commands for an auto-fixable analysis, in suggestion order, each kept once.
pub fn generate_execution_plan(report: &AnalysisReport) -> Vec<String> {
    if !report.auto_fixable {
        return Vec::new();
    }
    let mut plan: Vec<String> = Vec::new();
    for action in &report.actions {
        match command_for_action(action) {
            Some(cmd) if !plan.iter().any(|c| c == cmd) => plan.push(cmd.to_string()),
            Some(_) => {}
            None => tracing::debug!(
                target: "yunwei.analysis",
                stage = "plan.action_dropped",
                action = %action
            ),
        }
    }
    plan
}
