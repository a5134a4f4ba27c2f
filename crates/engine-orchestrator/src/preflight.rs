//! Preflight validation: runs the registered readiness probes in order and
//! aggregates the outcome into a verdict.

use arb_engine_core::{
    CheckDescriptor, CheckStatus, PreflightCheck, PreflightVerdict, ReadinessProbe,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate preflight check id {0:?}")]
    DuplicateCheck(String),
}

#[derive(Clone)]
struct RegisteredCheck {
    descriptor: CheckDescriptor,
    probe: Arc<dyn ReadinessProbe>,
}

/// Ordered set of checks with their probes. Ids are unique.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: Vec<RegisteredCheck>,
    ids: HashSet<String>,
}

impl CheckRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from descriptors, asking `probe_for` for each probe.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateCheck`] if two descriptors share an id.
    pub fn from_descriptors<F>(
        descriptors: &[CheckDescriptor],
        mut probe_for: F,
    ) -> Result<Self, RegistryError>
    where
        F: FnMut(&CheckDescriptor) -> Arc<dyn ReadinessProbe>,
    {
        let mut registry = Self::new();
        for descriptor in descriptors {
            let probe = probe_for(descriptor);
            registry.register(descriptor.clone(), probe)?;
        }
        Ok(registry)
    }

    /// Appends a check. Checks run in registration order.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateCheck`] if the id is already registered.
    pub fn register(
        &mut self,
        descriptor: CheckDescriptor,
        probe: Arc<dyn ReadinessProbe>,
    ) -> Result<(), RegistryError> {
        if !self.ids.insert(descriptor.id.clone()) {
            return Err(RegistryError::DuplicateCheck(descriptor.id));
        }
        self.checks.push(RegisteredCheck { descriptor, probe });
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &CheckDescriptor> {
        self.checks.iter().map(|c| &c.descriptor)
    }
}

/// Result of one complete run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreflightReport {
    pub checks: Vec<PreflightCheck>,
    pub verdict: PreflightVerdict,
}

pub struct PreflightValidator {
    registry: CheckRegistry,
    probe_timeout: Duration,
}

impl PreflightValidator {
    #[must_use]
    pub const fn new(registry: CheckRegistry, probe_timeout: Duration) -> Self {
        Self {
            registry,
            probe_timeout,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Fresh pending list for a run that is about to start.
    #[must_use]
    pub fn pending_checks(&self) -> Vec<PreflightCheck> {
        self.registry.descriptors().map(PreflightCheck::pending).collect()
    }

    /// Runs every check in registry order.
    ///
    /// `on_progress` receives the full list whenever a check starts running
    /// and again when it passes or fails. A failing check never stops the
    /// run; probe errors and timeouts become `Failed` checks.
    pub async fn run<F>(&self, mut on_progress: F) -> PreflightReport
    where
        F: FnMut(&[PreflightCheck]),
    {
        let mut checks = self.pending_checks();
        tracing::info!("Preflight started with {} checks", checks.len());

        for (idx, entry) in self.registry.checks.iter().enumerate() {
            checks[idx].status = CheckStatus::Running;
            checks[idx].timestamp = Some(Utc::now());
            on_progress(&checks);

            let outcome = tokio::time::timeout(self.probe_timeout, entry.probe.probe()).await;
            let (status, message) = match outcome {
                Ok(Ok(message)) => (CheckStatus::Passed, message),
                Ok(Err(e)) => (CheckStatus::Failed, format!("{e:#}")),
                Err(_) => (
                    CheckStatus::Failed,
                    format!("timed out after {}ms", self.probe_timeout.as_millis()),
                ),
            };

            let check = &mut checks[idx];
            check.status = status;
            check.message = message;
            check.timestamp = Some(Utc::now());

            if status == CheckStatus::Failed {
                let level = if check.is_critical { "critical" } else { "optional" };
                tracing::warn!(
                    "Preflight check {} ({}) failed: {}",
                    check.id,
                    level,
                    check.message
                );
            } else {
                tracing::debug!("Preflight check {} passed", check.id);
            }

            on_progress(&checks);
        }

        let verdict = PreflightVerdict::from_checks(&checks);
        let (passed, failed) = PreflightVerdict::tally(&checks);
        tracing::info!(
            "Preflight finished: {} passed, {} failed, all_passed={}, critical_passed={}",
            passed,
            failed,
            verdict.all_passed,
            verdict.critical_passed
        );

        PreflightReport { checks, verdict }
    }
}
