use serde_json::Value;

use super::report::{AnalysisOutcome, AnalysisReport};

/// Balanced `{...}` blocks in order of appearance.
///
/// Braces inside JSON string literals (and escaped quotes) are ignored. An
/// unterminated trailing block is not returned.
pub fn balanced_json_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if depth == 0 {
            if c == '{' {
                depth = 1;
                start = i;
                in_string = false;
                escaped = false;
            }
            continue;
        }

        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    blocks.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    blocks
}

/// Parse the model reply into an analysis report. Never fails.
pub fn parse_analysis(text: &str) -> AnalysisOutcome {
    let blocks = balanced_json_blocks(text);
    if blocks.is_empty() {
        tracing::warn!(
            target: "yunwei.analysis",
            stage = "analysis.no_json",
            reply_len = text.len()
        );
        return AnalysisOutcome::Fallback(AnalysisReport::fallback(
            "分析结果解析失败",
            "请手动检查系统状态",
            "自动分析不可用",
        ));
    }

    for block in &blocks {
        match serde_json::from_str::<Value>(block) {
            Ok(Value::Object(obj)) => {
                return AnalysisOutcome::Parsed(AnalysisReport::from_object(&obj));
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(
                    target: "yunwei.analysis",
                    stage = "analysis.block_invalid",
                    error = %e,
                    block_len = block.len()
                );
            }
        }
    }

    tracing::warn!(
        target: "yunwei.analysis",
        stage = "analysis.parse_failed",
        blocks = blocks.len()
    );
    AnalysisOutcome::Fallback(AnalysisReport::fallback(
        "分析结果解析异常",
        "请查看原始分析结果",
        "自动化分析暂时不可用",
    ))
}
