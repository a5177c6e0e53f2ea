use std::collections::BTreeMap;

use regex::Regex;

use super::patterns::{
    category_patterns, is_plain_text, ACTION_KEYWORDS, CHAT_KEYWORDS, FORCE_CHECK_KEYWORDS,
    PROBLEM_PATTERNS, RESOURCE_KEYWORDS,
};
use super::types::{IntentAnalysis, IntentType};

const EXACT_SCORE: f64 = 1.0;
const CONTAINS_SCORE: f64 = 0.9;
const REGEX_SCORE: f64 = 0.8;
const MIN_CONFIDENCE: f64 = 0.3;
const DEFAULT_CHAT_CONFIDENCE: f64 = 0.6;

struct Pattern {
    raw: &'static str,
    /// `None` if the pattern failed to compile; it is then only matched as text.
    regex: Option<Regex>,
    plain: bool,
}

impl Pattern {
    fn compile(raw: &'static str) -> Self {
        let regex = match Regex::new(raw) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(
                    target: "yunwei.intent",
                    stage = "intent.pattern_invalid",
                    pattern = raw,
                    error = %e
                );
                None
            }
        };
        Self {
            raw,
            regex,
            plain: is_plain_text(raw),
        }
    }

    fn score(&self, query: &str) -> f64 {
        let regex_hit = self.regex.as_ref().is_some_and(|re| re.is_match(query));
        if regex_hit {
            if self.plain && query.contains(self.raw) {
                EXACT_SCORE
            } else {
                REGEX_SCORE
            }
        } else if query.contains(self.raw) {
            CONTAINS_SCORE
        } else {
            0.0
        }
    }
}

/// Deterministic, rule-based intent classifier. Build once and share.
pub struct IntentClassifier {
    categories: Vec<(IntentType, Vec<Pattern>)>,
    problem_patterns: Vec<Regex>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        let categories = IntentType::SCORED
            .iter()
            .map(|&intent| {
                let patterns = category_patterns(intent)
                    .iter()
                    .copied()
                    .map(Pattern::compile)
                    .collect();
                (intent, patterns)
            })
            .collect();

        let problem_patterns = PROBLEM_PATTERNS
            .iter()
            .filter_map(|raw| Regex::new(raw).ok())
            .collect();

        Self {
            categories,
            problem_patterns,
        }
    }

    /// Classify an utterance. Never fails: unmatched input resolves to `Chat`.
    pub fn classify(&self, utterance: &str) -> IntentAnalysis {
        let query = utterance.to_lowercase();

        if let Some(keyword) = FORCE_CHECK_KEYWORDS.iter().find(|k| query.contains(*k)) {
            let analysis = IntentAnalysis {
                intent_type: IntentType::SystemCheck,
                confidence: 0.95,
                requires_metrics: true,
                requires_execution: false,
                extracted_params: BTreeMap::from([("force_check".to_string(), "true".to_string())]),
                reasoning: format!("检测到强制检查关键词: {keyword}"),
            };
            log_classified(&analysis);
            return analysis;
        }

        if let Some(keyword) = CHAT_KEYWORDS.iter().find(|k| query.contains(*k)) {
            let analysis = IntentAnalysis {
                intent_type: IntentType::Chat,
                confidence: 0.98,
                requires_metrics: false,
                requires_execution: false,
                extracted_params: BTreeMap::from([("greeting".to_string(), keyword.to_string())]),
                reasoning: format!("检测到聊天关键词: {keyword}"),
            };
            log_classified(&analysis);
            return analysis;
        }

        let mut best = (IntentType::Chat, 0.0_f64);
        for (intent, patterns) in &self.categories {
            let score = patterns
                .iter()
                .map(|p| p.score(&query))
                .fold(0.0_f64, f64::max);
            if score > best.1 {
                best = (*intent, score);
            }
        }

        let (intent_type, confidence, reasoning) = if best.1 < MIN_CONFIDENCE {
            tracing::debug!(
                target: "yunwei.intent",
                stage = "intent.low_confidence",
                score = best.1
            );
            (
                IntentType::Chat,
                DEFAULT_CHAT_CONFIDENCE,
                "default due to low confidence".to_string(),
            )
        } else {
            (
                best.0,
                best.1,
                format!("最佳匹配意图: {}, 置信度: {:.2}", best.0, best.1),
            )
        };

        let analysis = IntentAnalysis {
            intent_type,
            confidence,
            requires_metrics: intent_type.requires_metrics(),
            requires_execution: intent_type.requires_execution(),
            extracted_params: self.extract_params(utterance, intent_type),
            reasoning,
        };
        log_classified(&analysis);
        analysis
    }

    fn extract_params(&self, utterance: &str, intent: IntentType) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        match intent {
            IntentType::SystemInfo => {
                let lower = utterance.to_lowercase();
                if let Some((_, kind, name)) =
                    RESOURCE_KEYWORDS.iter().find(|(kw, _, _)| lower.contains(kw))
                {
                    params.insert("resource_type".to_string(), kind.to_string());
                    params.insert("resource_name".to_string(), name.to_string());
                }
            }
            IntentType::Troubleshoot => {
                let description = self.problem_patterns.iter().find_map(|re| {
                    re.captures(utterance)
                        .and_then(|caps| caps.get(3))
                        .map(|m| m.as_str().trim().to_string())
                });
                if let Some(desc) = description.filter(|d| !d.is_empty()) {
                    params.insert("error_description".to_string(), desc);
                }
            }
            IntentType::CommandExec => {
                if let Some(action) = ACTION_KEYWORDS.iter().find(|k| utterance.contains(*k)) {
                    params.insert("action".to_string(), action.to_string());
                }
            }
            _ => {}
        }
        params
    }
}

fn log_classified(analysis: &IntentAnalysis) {
    tracing::info!(
        target: "yunwei.intent",
        stage = "intent.classified",
        intent = %analysis.intent_type,
        confidence = analysis.confidence,
        requires_metrics = analysis.requires_metrics,
        requires_execution = analysis.requires_execution
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify(q: &str) -> IntentAnalysis {
        IntentClassifier::new().classify(q)
    }

    #[test]
    fn test_force_check_short_circuits() {
        let a = classify("检查系统");
        assert_eq!(a.intent_type, IntentType::SystemCheck);
        assert_eq!(a.confidence, 0.95);
        assert!(a.requires_metrics);
        assert!(!a.requires_execution);
        assert_eq!(a.param("force_check"), Some("true"));

        // 其他模式同时命中也不影响
        let a = classify("你好，帮我做一次健康检查，cpu使用率是多少");
        assert_eq!(a.intent_type, IntentType::SystemCheck);
        assert!(a.confidence >= 0.95);
    }

    #[test]
    fn test_greeting() {
        let a = classify("你好");
        assert_eq!(a.intent_type, IntentType::Chat);
        assert_eq!(a.confidence, 0.98);
        assert!(!a.requires_metrics);

        assert_eq!(classify("Hi there").intent_type, IntentType::Chat);
    }

    #[test]
    fn test_greeting_matches_as_substring() {
        // "this" 含 "hi"，按子串匹配仍归为闲聊
        let a = classify("this machine cpu使用率");
        assert_eq!(a.intent_type, IntentType::Chat);
        assert_eq!(a.confidence, 0.98);
    }

    #[test]
    fn test_system_info_with_resource() {
        let a = classify("现在CPU使用率是多少");
        assert_eq!(a.intent_type, IntentType::SystemInfo);
        assert_eq!(a.confidence, 1.0);
        assert!(a.requires_metrics);
        assert!(!a.requires_execution);
        assert_eq!(a.param("resource_type"), Some("cpu"));
        assert_eq!(a.param("resource_name"), Some("CPU使用率"));
    }

    #[test]
    fn test_regex_only_match_scores_lower() {
        let a = classify("查看磁盘");
        assert_eq!(a.intent_type, IntentType::SystemInfo);
        assert_eq!(a.confidence, 0.8);
        assert_eq!(a.param("resource_type"), Some("disk"));
    }

    #[test]
    fn test_troubleshoot_extracts_description() {
        let a = classify("数据库报错误：连接超时");
        assert_eq!(a.intent_type, IntentType::Troubleshoot);
        assert_eq!(a.param("error_description"), Some("连接超时"));
    }

    #[test]
    fn test_command_exec_action_and_requirements() {
        let a = classify("停止nginx服务");
        assert_eq!(a.intent_type, IntentType::CommandExec);
        assert!(a.requires_execution);
        assert!(!a.requires_metrics);
        assert_eq!(a.param("action"), Some("停止"));
    }

    #[test]
    fn test_scored_system_check_requires_execution() {
        let a = classify("帮我诊断一下");
        assert_eq!(a.intent_type, IntentType::SystemCheck);
        assert_eq!(a.confidence, 1.0);
        assert!(a.requires_execution);
    }

    #[test]
    fn test_tie_prefers_earlier_category() {
        // "优化" 同时属于 PERFORMANCE 和 OPTIMIZATION
        assert_eq!(classify("优化").intent_type, IntentType::Performance);
    }

    #[test]
    fn test_empty_and_unmatched_default_to_chat() {
        for q in ["", "   ", "lorem ipsum"] {
            let a = classify(q);
            assert_eq!(a.intent_type, IntentType::Chat);
            assert_eq!(a.confidence, 0.6);
            assert!(!a.requires_metrics);
            assert!(!a.requires_execution);
        }
    }

    #[test]
    fn test_requires_metrics_matches_category() {
        let queries = [
            "检查系统",
            "你好",
            "内存使用率",
            "服务故障",
            "运行脚本",
            "系统很慢",
            "清理一下",
            "随便聊聊天气",
        ];
        for q in queries {
            let a = classify(q);
            assert_eq!(a.requires_metrics, a.intent_type.requires_metrics(), "{q}");
        }
    }
}
