//! Readiness check types and verdict aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Area a readiness check belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Network,
    Blockchain,
    Ai,
    Security,
}

/// Lifecycle of a single check within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pending,
    Running,
    Passed,
    Failed,
}

impl CheckStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }
}

/// Static description of a check, as supplied by the deployment registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDescriptor {
    pub id: String,
    pub name: String,
    pub category: CheckCategory,
    pub is_critical: bool,
}

impl CheckDescriptor {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: CheckCategory,
        is_critical: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            is_critical,
        }
    }
}

/// One check inside a preflight run.
///
/// Instances are created fresh for every run; the previous run's list is
/// replaced wholesale, never amended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightCheck {
    pub id: String,
    pub name: String,
    pub category: CheckCategory,
    pub is_critical: bool,
    pub status: CheckStatus,
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl PreflightCheck {
    /// Creates a pending check from its descriptor.
    #[must_use]
    pub fn pending(descriptor: &CheckDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            category: descriptor.category,
            is_critical: descriptor.is_critical,
            status: CheckStatus::Pending,
            message: String::new(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

/// Aggregated readiness over a completed run. Always derived from a check
/// list, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightVerdict {
    /// Every check passed. False for an empty run.
    pub all_passed: bool,
    /// Every critical check passed. Optional failures never clear this.
    pub critical_passed: bool,
}

impl PreflightVerdict {
    /// Derives the verdict from a list of checks.
    ///
    /// An empty list is never "ready": both flags are false.
    #[must_use]
    pub fn from_checks(checks: &[PreflightCheck]) -> Self {
        if checks.is_empty() {
            return Self {
                all_passed: false,
                critical_passed: false,
            };
        }

        Self {
            all_passed: checks.iter().all(PreflightCheck::passed),
            critical_passed: checks.iter().filter(|c| c.is_critical).all(PreflightCheck::passed),
        }
    }

    /// Counts of (passed, failed) checks, for log lines.
    #[must_use]
    pub fn tally(checks: &[PreflightCheck]) -> (usize, usize) {
        let passed = checks.iter().filter(|c| c.passed()).count();
        let failed = checks
            .iter()
            .filter(|c| c.status == CheckStatus::Failed)
            .count();
        (passed, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(id: &str, is_critical: bool, status: CheckStatus) -> PreflightCheck {
        let descriptor = CheckDescriptor::new(id, id, CheckCategory::Network, is_critical);
        PreflightCheck {
            status,
            ..PreflightCheck::pending(&descriptor)
        }
    }

    #[test]
    fn critical_and_optional_failed() {
        let checks = vec![
            check("rpc", true, CheckStatus::Failed),
            check("ai", false, CheckStatus::Failed),
        ];
        let verdict = PreflightVerdict::from_checks(&checks);
        assert!(!verdict.all_passed);
        assert!(!verdict.critical_passed);
    }

    #[test]
    fn optional_failure_does_not_block_critical() {
        let checks = vec![
            check("rpc", true, CheckStatus::Passed),
            check("ai", false, CheckStatus::Failed),
        ];
        let verdict = PreflightVerdict::from_checks(&checks);
        assert!(!verdict.all_passed);
        assert!(verdict.critical_passed);
    }

    #[test]
    fn all_passed() {
        let checks = vec![
            check("rpc", true, CheckStatus::Passed),
            check("ai", false, CheckStatus::Passed),
        ];
        let verdict = PreflightVerdict::from_checks(&checks);
        assert!(verdict.all_passed);
        assert!(verdict.critical_passed);
    }

    #[test]
    fn empty_run_is_not_ready() {
        let verdict = PreflightVerdict::from_checks(&[]);
        assert!(!verdict.all_passed);
        assert!(!verdict.critical_passed);
    }

    #[test]
    fn pending_checks_do_not_count_as_passed() {
        let checks = vec![check("rpc", true, CheckStatus::Running)];
        let verdict = PreflightVerdict::from_checks(&checks);
        assert!(!verdict.all_passed);
        assert!(!verdict.critical_passed);
        assert_eq!(PreflightVerdict::tally(&checks), (0, 0));
    }
}
