//! Staged activation run once per entry into SIM or LIVE.

use arb_engine_core::{ActivationStep, EngineMode, StepStatus, StepWork};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Step lists per target mode. Each call to [`steps_for`](Self::steps_for)
/// hands out a fresh, all-pending copy.
#[derive(Debug, Clone)]
pub struct ActivationPlan {
    sim: Vec<ActivationStep>,
    live: Vec<ActivationStep>,
}

impl Default for ActivationPlan {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActivationPlan {
    #[must_use]
    pub fn new(sim: Vec<ActivationStep>, live: Vec<ActivationStep>) -> Self {
        Self { sim, live }
    }

    /// The stock sequences.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            sim: vec![
                ActivationStep::new("load_parameters", "Loading simulation parameters"),
                ActivationStep::new("connect_feeds", "Connecting to market data feeds"),
                ActivationStep::new("paper_execution", "Initializing paper execution"),
                ActivationStep::new("arm_confidence", "Arming confidence tracker"),
            ],
            live: vec![
                ActivationStep::new("verify_wallet", "Verifying execution wallet"),
                ActivationStep::new("reserve_gas", "Reserving gas budget"),
                ActivationStep::new("enable_execution", "Enabling live execution"),
                ActivationStep::new("start_profit_tracking", "Starting profit tracking"),
            ],
        }
    }

    /// Fresh step list for `target`. Empty for modes without activation.
    #[must_use]
    pub fn steps_for(&self, target: EngineMode) -> Vec<ActivationStep> {
        let template = match target {
            EngineMode::Sim => &self.sim,
            EngineMode::Live => &self.live,
            EngineMode::Idle | EngineMode::Preflight => return Vec::new(),
        };

        template
            .iter()
            .map(|step| ActivationStep {
                status: StepStatus::Pending,
                ..step.clone()
            })
            .collect()
    }
}

/// Step work that just waits a fixed delay per step.
#[derive(Debug, Clone, Copy)]
pub struct PacedStepWork {
    delay: Duration,
}

impl PacedStepWork {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl StepWork for PacedStepWork {
    async fn perform(&self, target: EngineMode, step_id: &str) -> Option<String> {
        tracing::trace!("{} activation step {} running", target, step_id);
        tokio::time::sleep(self.delay).await;
        None
    }
}

pub struct ActivationSequencer {
    plan: ActivationPlan,
    work: Arc<dyn StepWork>,
}

impl ActivationSequencer {
    #[must_use]
    pub fn new(plan: ActivationPlan, work: Arc<dyn StepWork>) -> Self {
        Self { plan, work }
    }

    #[must_use]
    pub const fn plan(&self) -> &ActivationPlan {
        &self.plan
    }

    /// Runs the plan for `target` strictly in order.
    ///
    /// Each step flips to `InProgress` before its work starts and to
    /// `Completed` after it resolves; `on_update` sees the full list after
    /// every flip. Cancel by dropping the future.
    pub async fn run<F>(&self, target: EngineMode, mut on_update: F) -> Vec<ActivationStep>
    where
        F: FnMut(&[ActivationStep]),
    {
        let mut steps = self.plan.steps_for(target);
        tracing::info!("Activating {} ({} steps)", target, steps.len());

        for idx in 0..steps.len() {
            steps[idx].status = StepStatus::InProgress;
            on_update(&steps);

            let details = self.work.perform(target, &steps[idx].id).await;

            let step = &mut steps[idx];
            step.status = StepStatus::Completed;
            if details.is_some() {
                step.details = details;
            }
            tracing::debug!("{} activation step {} completed", target, step.id);
            on_update(&steps);
        }

        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_engine_core::activation::in_progress_count;
    use parking_lot::Mutex;

    struct RecordingWork {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StepWork for RecordingWork {
        async fn perform(&self, _target: EngineMode, step_id: &str) -> Option<String> {
            self.calls.lock().push(step_id.to_string());
            Some(format!("{step_id} ok"))
        }
    }

    #[tokio::test]
    async fn steps_run_in_order_with_one_in_progress() {
        let work = Arc::new(RecordingWork {
            calls: Mutex::new(Vec::new()),
        });
        let sequencer = ActivationSequencer::new(ActivationPlan::standard(), work.clone());

        let mut updates: Vec<Vec<ActivationStep>> = Vec::new();
        let steps = sequencer
            .run(EngineMode::Live, |s| updates.push(s.to_vec()))
            .await;

        assert_eq!(updates.len(), steps.len() * 2);
        for (i, update) in updates.iter().enumerate() {
            let expected = usize::from(i % 2 == 0);
            assert_eq!(in_progress_count(update), expected, "update {i}");
        }
        assert!(steps.iter().all(|s| s.status == StepStatus::Completed));
        assert_eq!(steps[0].details.as_deref(), Some("verify_wallet ok"));

        let ids: Vec<_> = steps.iter().map(|s| s.id.clone()).collect();
        assert_eq!(*work.calls.lock(), ids);
    }

    #[tokio::test]
    async fn sim_and_live_use_distinct_sequences() {
        let plan = ActivationPlan::standard();
        let sim = plan.steps_for(EngineMode::Sim);
        let live = plan.steps_for(EngineMode::Live);
        assert!(!sim.is_empty());
        assert_ne!(sim[0].id, live[0].id);
        assert!(plan.steps_for(EngineMode::Idle).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_run_stops_further_updates() {
        let sequencer = ActivationSequencer::new(
            ActivationPlan::standard(),
            Arc::new(PacedStepWork::new(Duration::from_secs(1))),
        );
        let updates = Arc::new(Mutex::new(Vec::<Vec<ActivationStep>>::new()));
        let sink = Arc::clone(&updates);

        let run = sequencer.run(EngineMode::Sim, move |s| sink.lock().push(s.to_vec()));
        let result = tokio::time::timeout(Duration::from_millis(1500), run).await;
        assert!(result.is_err());

        let seen = updates.lock().len();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(updates.lock().len(), seen);
        // first step done, second started
        assert_eq!(seen, 3);
    }
}
