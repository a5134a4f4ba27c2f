use crate::confidence::ConfidenceAccumulator;
use crate::engine_actor::{ActorParts, EngineActor};
use crate::engine_handle::EngineHandle;
use crate::events::EngineStatus;
use crate::history_store::HistoryStore;
use crate::preflight::{CheckRegistry, PreflightValidator};
use crate::sequencer::{ActivationPlan, ActivationSequencer, PacedStepWork};
use crate::withdrawal::WithdrawalScheduler;
use anyhow::{Context, Result};
use arb_engine_core::{
    AppConfig, SignalSource, StepWork, TransferExecutor, WithdrawalConfig, WithdrawalStatus,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Wires collaborators and configuration into a running engine actor.
pub struct EngineBuilder {
    config: AppConfig,
    registry: CheckRegistry,
    signal_source: Arc<dyn SignalSource>,
    transfer_executor: Arc<dyn TransferExecutor>,
    plan: ActivationPlan,
    step_work: Option<Arc<dyn StepWork>>,
    store: Option<HistoryStore>,
    seed: Option<u64>,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(
        config: &AppConfig,
        registry: CheckRegistry,
        signal_source: Arc<dyn SignalSource>,
        transfer_executor: Arc<dyn TransferExecutor>,
    ) -> Self {
        Self {
            config: config.clone(),
            registry,
            signal_source,
            transfer_executor,
            plan: ActivationPlan::standard(),
            step_work: None,
            store: None,
            seed: None,
        }
    }

    #[must_use]
    pub fn plan(mut self, plan: ActivationPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Replaces the default paced step work.
    #[must_use]
    pub fn step_work(mut self, work: Arc<dyn StepWork>) -> Self {
        self.step_work = Some(work);
        self
    }

    /// Persists withdrawal events and restores the ledger on spawn.
    #[must_use]
    pub fn store(mut self, store: HistoryStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Fixes the withdrawal delay jitter.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Spawns the actor on the current runtime.
    ///
    /// # Errors
    /// Returns error if the engine or confidence settings are out of range,
    /// the initial withdrawal settings are invalid, or the history cannot be
    /// restored from the store.
    pub async fn spawn(self) -> Result<EngineHandle> {
        let Self {
            config,
            registry,
            signal_source,
            transfer_executor,
            plan,
            step_work,
            store,
            seed,
        } = self;

        config.validate().context("invalid engine settings")?;
        let withdrawal_config = WithdrawalConfig::default()
            .apply(&config.withdrawal.to_update())
            .context("invalid [withdrawal] settings")?;
        let mut withdrawals =
            WithdrawalScheduler::new(withdrawal_config, seed.or(config.simulation.seed));

        if let Some(store) = &store {
            let entries = store
                .load_latest()
                .await
                .context("failed to restore withdrawal history")?;
            let orphaned = entries
                .iter()
                .filter(|e| e.status == WithdrawalStatus::Pending)
                .count();
            if orphaned > 0 {
                tracing::warn!(
                    "{} withdrawal(s) were pending at last shutdown and will not be retried",
                    orphaned
                );
            }
            tracing::info!("Restored {} withdrawal(s) from history", entries.len());
            withdrawals.restore(entries, Utc::now());
        }

        let step_work = step_work
            .unwrap_or_else(|| Arc::new(PacedStepWork::new(config.activation.step_delay())));

        let parts = ActorParts {
            engine: config.engine.clone(),
            validator: PreflightValidator::new(registry, config.preflight.probe_timeout()),
            sequencer: ActivationSequencer::new(plan, step_work),
            confidence: ConfidenceAccumulator::new(config.confidence.clone()),
            withdrawals,
            signal_source,
            transfer_executor,
            store,
        };

        let (tx, rx) = mpsc::channel(config.engine.command_buffer.max(1));
        let (event_tx, _event_rx) = broadcast::channel(config.engine.event_buffer.max(1));
        let (status_tx, status_rx) = watch::channel(EngineStatus {
            live_gate: config.engine.live_confidence_gate,
            ..EngineStatus::default()
        });

        let handle = EngineHandle::new(tx, event_tx.clone(), status_rx);
        let actor = EngineActor::new(parts, rx, event_tx, status_tx);
        tokio::spawn(actor.run());

        tracing::info!(
            "Engine spawned (gate {:.1}, limited SIM {})",
            config.engine.live_confidence_gate,
            if config.engine.allow_limited_sim { "allowed" } else { "refused" }
        );
        Ok(handle)
    }
}
