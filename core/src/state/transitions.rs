//! 状态转换规则和验证

use super::types::{ExecutionPhase, SystemStatus};
use crate::model::AlertLevel;
use thiserror::Error;

/// 状态转换错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid execution phase transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ExecutionPhase,
        to: ExecutionPhase,
    },
}

/// 系统状态升级规则
pub struct StatusTransition;

impl StatusTransition {
    /// 严重告警 → Critical；警告只把 Healthy 升为 Warning，绝不覆盖 Critical。
    pub fn apply_alert(current: SystemStatus, level: AlertLevel) -> SystemStatus {
        match (current, level) {
            (_, AlertLevel::Critical) => SystemStatus::Critical,
            (SystemStatus::Healthy, AlertLevel::Warning) => SystemStatus::Warning,
            (status, _) => status,
        }
    }

    /// 采集成功后，未知状态先视为健康，再叠加告警。
    pub fn after_collection(current: SystemStatus) -> SystemStatus {
        match current {
            SystemStatus::Unknown => SystemStatus::Healthy,
            status => status,
        }
    }
}

/// 修复方案执行阶段转换
pub struct PhaseTransition;

impl PhaseTransition {
    pub fn validate(from: ExecutionPhase, to: ExecutionPhase) -> Result<(), TransitionError> {
        let is_valid = match (from, to) {
            // 任何阶段都可以重置
            (_, ExecutionPhase::Idle) => true,

            // 空闲或上一次执行结束后可以开始新的执行
            (ExecutionPhase::Idle, ExecutionPhase::Executing) => true,
            (ExecutionPhase::Completed, ExecutionPhase::Executing) => true,
            (ExecutionPhase::Failed, ExecutionPhase::Executing) => true,

            (ExecutionPhase::Executing, ExecutionPhase::Completed) => true,
            (ExecutionPhase::Executing, ExecutionPhase::Failed) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    pub fn phase_description(phase: ExecutionPhase) -> &'static str {
        match phase {
            ExecutionPhase::Idle => "空闲状态",
            ExecutionPhase::Executing => "执行中",
            ExecutionPhase::Completed => "已完成",
            ExecutionPhase::Failed => "已失败",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn severity(status: SystemStatus) -> u8 {
        match status {
            SystemStatus::Unknown => 0,
            SystemStatus::Healthy => 1,
            SystemStatus::Warning => 2,
            SystemStatus::Critical => 3,
        }
    }

    #[test]
    fn test_critical_after_warning_stays_critical() {
        let s = StatusTransition::after_collection(SystemStatus::Unknown);
        let s = StatusTransition::apply_alert(s, AlertLevel::Warning);
        assert_eq!(s, SystemStatus::Warning);
        let s = StatusTransition::apply_alert(s, AlertLevel::Critical);
        assert_eq!(s, SystemStatus::Critical);
    }

    #[test]
    fn test_warning_never_downgrades_critical() {
        let s = StatusTransition::apply_alert(SystemStatus::Healthy, AlertLevel::Critical);
        let s = StatusTransition::apply_alert(s, AlertLevel::Warning);
        assert_eq!(s, SystemStatus::Critical);
    }

    #[test]
    fn test_warning_does_not_raise_unknown() {
        let s = StatusTransition::apply_alert(SystemStatus::Unknown, AlertLevel::Warning);
        assert_eq!(s, SystemStatus::Unknown);
    }

    #[test]
    fn test_no_alert_sequence_lowers_severity() {
        let levels = [
            AlertLevel::Normal,
            AlertLevel::Warning,
            AlertLevel::Critical,
            AlertLevel::Warning,
            AlertLevel::Normal,
        ];
        let mut status = StatusTransition::after_collection(SystemStatus::Unknown);
        for level in levels {
            let next = StatusTransition::apply_alert(status, level);
            assert!(severity(next) >= severity(status));
            status = next;
        }
        assert_eq!(status, SystemStatus::Critical);
    }

    #[test]
    fn test_phase_transitions() {
        assert!(PhaseTransition::validate(ExecutionPhase::Idle, ExecutionPhase::Executing).is_ok());
        assert!(
            PhaseTransition::validate(ExecutionPhase::Executing, ExecutionPhase::Completed).is_ok()
        );
        assert!(
            PhaseTransition::validate(ExecutionPhase::Completed, ExecutionPhase::Executing).is_ok()
        );
        assert!(PhaseTransition::validate(ExecutionPhase::Idle, ExecutionPhase::Completed).is_err());
        assert_eq!(
            PhaseTransition::phase_description(ExecutionPhase::Executing),
            "执行中"
        );
    }
}
