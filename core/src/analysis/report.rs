use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::FixPlan;

/// 紧急程度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// high / critical
    pub fn is_pressing(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown urgency: {other}")),
        }
    }
}

/// Structured analysis parsed from the model reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub overall_status: String,
    pub issues: Vec<String>,
    pub actions: Vec<String>,
    pub risks: Vec<String>,
    pub urgency: Urgency,
    pub auto_fixable: bool,
    /// `None` when the reply carried no `fix_plans` key at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_plans: Option<Vec<FixPlan>>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

const KNOWN_KEYS: &[&str] = &[
    "overall_status",
    "issues",
    "actions",
    "risks",
    "urgency",
    "auto_fixable",
    "fix_plans",
];

impl AnalysisReport {
    /// Placeholder report used whenever the reply cannot be understood.
    pub fn fallback(issue: &str, action: &str, risk: &str) -> Self {
        Self {
            overall_status: "unknown".to_string(),
            issues: vec![issue.to_string()],
            actions: vec![action.to_string()],
            risks: vec![risk.to_string()],
            urgency: Urgency::Medium,
            auto_fixable: false,
            fix_plans: None,
            extra: Map::new(),
        }
    }

    /// Build from a parsed JSON object. Missing or mistyped keys fall back to defaults.
    pub fn from_object(obj: &Map<String, Value>) -> Self {
        let urgency = obj
            .get("urgency")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        let auto_fixable = match obj.get("auto_fixable") {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        };

        let extra = obj
            .iter()
            .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            overall_status: obj
                .get("overall_status")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            issues: string_list(obj.get("issues")),
            actions: string_list(obj.get("actions")),
            risks: string_list(obj.get("risks")),
            urgency,
            auto_fixable,
            fix_plans: obj.get("fix_plans").map(parse_fix_plans),
            extra,
        }
    }
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = v else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

/// Invalid entries are skipped; entries without an id get `plan_<n>`.
fn parse_fix_plans(v: &Value) -> Vec<FixPlan> {
    let Value::Array(items) = v else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<FixPlan>(item.clone()) {
            Ok(plan) => Some(plan),
            Err(e) => {
                tracing::debug!(
                    target: "yunwei.analysis",
                    stage = "analysis.fix_plan_skipped",
                    error = %e
                );
                None
            }
        })
        .enumerate()
        .map(|(i, mut plan)| {
            if plan.id.trim().is_empty() {
                plan.id = format!("plan_{}", i + 1);
            }
            plan
        })
        .collect()
}

/// Tagged parse result: the reply was understood, or a safe default stands in for it.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Parsed(AnalysisReport),
    Fallback(AnalysisReport),
}

impl AnalysisOutcome {
    pub fn report(&self) -> &AnalysisReport {
        match self {
            Self::Parsed(r) | Self::Fallback(r) => r,
        }
    }

    pub fn into_report(self) -> AnalysisReport {
        match self {
            Self::Parsed(r) | Self::Fallback(r) => r,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}
