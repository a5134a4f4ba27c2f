use crate::commands::{EngineCommand, LoopEvent, LoopEventKind, TransitionReply, TransitionRefused};
use crate::confidence::ConfidenceAccumulator;
use crate::events::{EngineEvent, EngineStatus, ModeTransition};
use crate::history_store::HistoryStore;
use crate::preflight::{PreflightReport, PreflightValidator};
use crate::scheduler::{Epoch, TaskScheduler};
use crate::sequencer::ActivationSequencer;
use crate::signal_book::SignalBook;
use crate::withdrawal::{ScheduledWithdrawal, TransferResult, WithdrawalScheduler};
use arb_engine_core::{
    ActivationStep, EngineConfig, EngineMode, Outcome, PreflightCheck, PreflightVerdict,
    SignalSource, TradeSignal, TransferExecutor, WithdrawalHistoryEntry,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use uuid::Uuid;

/// Newest withdrawals included in status snapshots.
const STATUS_HISTORY_LEN: usize = 20;

/// Everything the actor needs besides its channels.
pub(crate) struct ActorParts {
    pub engine: EngineConfig,
    pub validator: PreflightValidator,
    pub sequencer: ActivationSequencer,
    pub confidence: ConfidenceAccumulator,
    pub withdrawals: WithdrawalScheduler,
    pub signal_source: Arc<dyn SignalSource>,
    pub transfer_executor: Arc<dyn TransferExecutor>,
    pub store: Option<HistoryStore>,
}

#[derive(Debug, Clone, Copy)]
struct PendingActivation {
    target: EngineMode,
    limited: bool,
}

#[derive(Debug)]
struct TransferOutcome {
    id: Uuid,
    result: TransferResult,
}

/// Single owner of all pipeline state. Every mutation happens inside
/// [`run`](Self::run), one command or loop event at a time.
pub struct EngineActor {
    config: EngineConfig,
    rx: mpsc::Receiver<EngineCommand>,
    event_tx: broadcast::Sender<EngineEvent>,
    status_tx: watch::Sender<EngineStatus>,
    loop_tx: mpsc::UnboundedSender<LoopEvent>,
    loop_rx: mpsc::UnboundedReceiver<LoopEvent>,

    tasks: TaskScheduler,
    validator: Arc<PreflightValidator>,
    sequencer: Arc<ActivationSequencer>,
    signal_source: Arc<dyn SignalSource>,
    transfer_executor: Arc<dyn TransferExecutor>,
    store: Option<HistoryStore>,
    transfers: JoinSet<TransferOutcome>,

    mode: EngineMode,
    activating: Option<PendingActivation>,
    limited: bool,
    preflight_checks: Vec<PreflightCheck>,
    verdict: Option<PreflightVerdict>,
    activation_steps: Vec<ActivationStep>,
    confidence: ConfidenceAccumulator,
    signals: SignalBook,
    withdrawals: WithdrawalScheduler,
    stale_updates_dropped: u64,
    last_transition: Option<ModeTransition>,
}

impl EngineActor {
    pub(crate) fn new(
        parts: ActorParts,
        rx: mpsc::Receiver<EngineCommand>,
        event_tx: broadcast::Sender<EngineEvent>,
        status_tx: watch::Sender<EngineStatus>,
    ) -> Self {
        let (loop_tx, loop_rx) = mpsc::unbounded_channel();
        let signals = SignalBook::new(parts.engine.signal_history_len);

        Self {
            config: parts.engine,
            rx,
            event_tx,
            status_tx,
            loop_tx,
            loop_rx,
            tasks: TaskScheduler::new(),
            validator: Arc::new(parts.validator),
            sequencer: Arc::new(parts.sequencer),
            signal_source: parts.signal_source,
            transfer_executor: parts.transfer_executor,
            store: parts.store,
            transfers: JoinSet::new(),
            mode: EngineMode::Idle,
            activating: None,
            limited: false,
            preflight_checks: Vec::new(),
            verdict: None,
            activation_steps: Vec::new(),
            confidence: parts.confidence,
            signals,
            withdrawals: parts.withdrawals,
            stale_updates_dropped: 0,
            last_transition: None,
        }
    }

    /// Runs the actor until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("Engine actor starting in {} mode", self.mode);
        self.publish();

        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd).await,
                },
                Some(event) = self.loop_rx.recv() => self.handle_loop_event(event).await,
                Some(joined) = self.transfers.join_next(), if !self.transfers.is_empty() => {
                    self.handle_transfer(joined).await;
                }
            }
        }

        tracing::info!("Engine actor shutting down");
        self.tasks.advance();
        if !self.transfers.is_empty() {
            tracing::warn!(
                "Abandoning {} scheduled transfer(s) on shutdown; their entries stay pending",
                self.transfers.len()
            );
            self.transfers.abort_all();
        }
        self.set_mode(EngineMode::Idle);
        self.activating = None;
        self.publish();
    }

    // ============================================
    // Commands
    // ============================================

    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::RunPreflight(reply) => {
                let result = self.run_preflight();
                self.finish_transition("run_preflight", result, reply);
            }
            EngineCommand::StartSim(reply) => {
                let result = self.start_sim();
                self.finish_transition("start_sim", result, reply);
            }
            EngineCommand::StartLive(reply) => {
                let result = self.start_live();
                self.finish_transition("start_live", result, reply);
            }
            EngineCommand::Stop(reply) => {
                let stopped = self.stop();
                let _ = reply.send(stopped);
            }
            EngineCommand::IngestSignal(signal) => {
                if self.accepting_signals() {
                    self.observe_signal(*signal);
                    self.publish();
                } else {
                    tracing::trace!(
                        "Ignoring pushed signal {} in {} mode",
                        signal.id,
                        self.mode
                    );
                }
            }
            EngineCommand::AdjustBalance { delta, reply } => {
                let balance = self.withdrawals.adjust_balance(delta);
                tracing::info!("Smart balance adjusted by {} to {}", delta, balance);
                self.publish();
                let _ = reply.send(balance);
            }
            EngineCommand::UpdateWithdrawalConfig { update, reply } => {
                let result = self.withdrawals.update_config(&update).cloned();
                match &result {
                    Ok(_) => self.publish(),
                    Err(e) => tracing::warn!("Withdrawal config update rejected: {}", e),
                }
                let _ = reply.send(result);
            }
            EngineCommand::RequestWithdrawal { request, reply } => {
                let result = self.withdrawals.request_manual(request, Utc::now());
                let reply_value = match result {
                    Ok(scheduled) => {
                        let request = scheduled.request.clone();
                        self.launch_withdrawal(scheduled).await;
                        self.publish();
                        Ok(request)
                    }
                    Err(e) => {
                        tracing::warn!("Withdrawal request refused: {}", e);
                        Err(e)
                    }
                };
                let _ = reply.send(reply_value);
            }
            EngineCommand::GetStatus(reply) => {
                let _ = reply.send(self.snapshot());
            }
            EngineCommand::GetWithdrawalHistory(reply) => {
                let _ = reply.send(self.withdrawals.ledger().entries().to_vec());
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn finish_transition(
        &mut self,
        command: &'static str,
        result: Result<(), TransitionRefused>,
        reply: TransitionReply,
    ) {
        if let Err(refusal) = &result {
            tracing::warn!("{} refused: {}", command, refusal);
            let _ = self.event_tx.send(EngineEvent::TransitionRefused {
                command: command.to_string(),
                refusal: refusal.clone(),
            });
        }
        self.publish();
        let _ = reply.send(result);
    }

    fn ensure_no_activation(&self) -> Result<(), TransitionRefused> {
        match self.activating {
            Some(pending) => Err(TransitionRefused::ActivationInProgress {
                target: pending.target,
            }),
            None => Ok(()),
        }
    }

    fn run_preflight(&mut self) -> Result<(), TransitionRefused> {
        self.ensure_no_activation()?;
        if !matches!(self.mode, EngineMode::Idle | EngineMode::Preflight) {
            return Err(TransitionRefused::invalid_mode("run_preflight", self.mode));
        }

        let epoch = self.tasks.advance();
        self.verdict = None;
        self.preflight_checks = self.validator.pending_checks();
        self.set_mode(EngineMode::Preflight);

        let validator = Arc::clone(&self.validator);
        let tx = self.loop_tx.clone();
        self.tasks.spawn("preflight", async move {
            let report = validator
                .run(|checks| {
                    let _ = tx.send(LoopEvent {
                        epoch,
                        kind: LoopEventKind::PreflightProgress(checks.to_vec()),
                    });
                })
                .await;
            let _ = tx.send(LoopEvent {
                epoch,
                kind: LoopEventKind::PreflightFinished(report),
            });
        });

        Ok(())
    }

    fn start_sim(&mut self) -> Result<(), TransitionRefused> {
        self.ensure_no_activation()?;
        if self.mode != EngineMode::Idle {
            return Err(TransitionRefused::invalid_mode("start_sim", self.mode));
        }

        let verdict = self.verdict.ok_or(TransitionRefused::PreflightMissing)?;
        let limited = if verdict.all_passed {
            false
        } else if self.config.allow_limited_sim && verdict.critical_passed {
            tracing::warn!("Entering limited SIM: optional preflight checks failed");
            true
        } else {
            return Err(TransitionRefused::PreflightNotPassed { verdict });
        };

        self.begin_activation(EngineMode::Sim, limited);
        Ok(())
    }

    fn start_live(&mut self) -> Result<(), TransitionRefused> {
        self.ensure_no_activation()?;
        if self.mode != EngineMode::Sim {
            return Err(TransitionRefused::invalid_mode("start_live", self.mode));
        }

        let score = self.confidence.score();
        let gate = self.config.live_confidence_gate;
        if score < gate {
            return Err(TransitionRefused::InsufficientConfidence { score, gate });
        }

        self.begin_activation(EngineMode::Live, self.limited);
        Ok(())
    }

    /// Stops the current mode's loops and starts the activation sequence
    /// for `target`. The mode flips when the sequence finishes.
    fn begin_activation(&mut self, target: EngineMode, limited: bool) {
        let epoch = self.tasks.advance();
        self.activating = Some(PendingActivation { target, limited });
        self.activation_steps = self.sequencer.plan().steps_for(target);
        tracing::info!("Activation into {} started ({})", target, epoch);

        let sequencer = Arc::clone(&self.sequencer);
        let tx = self.loop_tx.clone();
        self.tasks.spawn("activation", async move {
            sequencer
                .run(target, |steps| {
                    let _ = tx.send(LoopEvent {
                        epoch,
                        kind: LoopEventKind::ActivationProgress {
                            target,
                            steps: steps.to_vec(),
                        },
                    });
                })
                .await;
            let _ = tx.send(LoopEvent {
                epoch,
                kind: LoopEventKind::ActivationFinished { target },
            });
        });
    }

    fn stop(&mut self) -> bool {
        if self.mode == EngineMode::Idle && self.activating.is_none() {
            tracing::debug!("Stop requested while already idle");
            return false;
        }

        let epoch = self.tasks.advance();
        if let Some(pending) = self.activating.take() {
            tracing::info!("Activation into {} cancelled", pending.target);
        }
        self.activation_steps.clear();
        if self.mode == EngineMode::Preflight {
            self.preflight_checks.clear();
        }
        self.confidence.reset();
        self.signals.clear();
        self.limited = false;
        self.set_mode(EngineMode::Idle);
        tracing::info!("Engine stopped ({})", epoch);
        self.publish();
        true
    }

    // ============================================
    // Loop events
    // ============================================

    pub(crate) async fn handle_loop_event(&mut self, event: LoopEvent) {
        if !self.tasks.is_current(event.epoch) {
            self.stale_updates_dropped += 1;
            tracing::trace!(
                "Dropping stale update from {} (current {})",
                event.epoch,
                self.tasks.epoch()
            );
            return;
        }

        match event.kind {
            LoopEventKind::PreflightProgress(checks) => {
                self.preflight_checks.clone_from(&checks);
                let _ = self.event_tx.send(EngineEvent::PreflightProgress { checks });
            }
            LoopEventKind::PreflightFinished(report) => self.finish_preflight(report),
            LoopEventKind::ActivationProgress { target, steps } => {
                self.activation_steps.clone_from(&steps);
                let _ = self
                    .event_tx
                    .send(EngineEvent::ActivationProgress { target, steps });
            }
            LoopEventKind::ActivationFinished { target } => self.enter_mode(target, event.epoch),
            LoopEventKind::Signals(batch) => {
                if !self.accepting_signals() {
                    return;
                }
                for signal in batch {
                    self.observe_signal(signal);
                }
            }
            LoopEventKind::WithdrawalTick => {
                if self.mode == EngineMode::Live {
                    self.check_emergency_balance();
                    self.evaluate_withdrawal().await;
                }
            }
        }

        self.publish();
    }

    fn finish_preflight(&mut self, report: PreflightReport) {
        self.preflight_checks = report.checks;
        self.verdict = Some(report.verdict);
        self.set_mode(EngineMode::Idle);
    }

    /// Completes an activation: resets the target mode's metrics, flips the
    /// mode and starts its loops.
    fn enter_mode(&mut self, target: EngineMode, epoch: Epoch) {
        let Some(pending) = self.activating.take() else {
            tracing::warn!("Activation into {} finished with nothing pending", target);
            return;
        };
        self.activation_steps.clear();

        self.signals.clear();
        if target == EngineMode::Sim {
            self.confidence.reset();
        }
        self.limited = pending.limited;

        self.set_mode(target);
        self.start_mode_loops(target, epoch);
    }

    fn start_mode_loops(&mut self, mode: EngineMode, epoch: Epoch) {
        let source = Arc::clone(&self.signal_source);
        let tx = self.loop_tx.clone();
        self.tasks.spawn_interval(
            "signal_poll",
            self.config.signal_poll_interval(),
            move |epoch| {
                let source = Arc::clone(&source);
                let tx = tx.clone();
                async move {
                    match source.poll(mode).await {
                        Ok(batch) if batch.is_empty() => true,
                        Ok(batch) => tx
                            .send(LoopEvent {
                                epoch,
                                kind: LoopEventKind::Signals(batch),
                            })
                            .is_ok(),
                        Err(e) => {
                            tracing::warn!("Signal poll failed in {} mode: {:#}", mode, e);
                            true
                        }
                    }
                }
            },
        );

        if mode == EngineMode::Live {
            let tx = self.loop_tx.clone();
            self.tasks.spawn_interval(
                "withdrawal_eval",
                self.config.withdrawal_eval_interval(),
                move |epoch| {
                    let sent = tx
                        .send(LoopEvent {
                            epoch,
                            kind: LoopEventKind::WithdrawalTick,
                        })
                        .is_ok();
                    async move { sent }
                },
            );
        }

        tracing::debug!("{} loops started in {}", mode, epoch);
    }

    fn accepting_signals(&self) -> bool {
        self.mode.is_active() && self.activating.is_none()
    }

    fn observe_signal(&mut self, signal: TradeSignal) {
        let profit = signal.expected_profit;
        let Some(outcome) = self.signals.observe(signal, tokio::time::Instant::now()) else {
            return;
        };

        self.confidence.record(outcome);
        if self.mode == EngineMode::Live && outcome == Outcome::Success {
            self.withdrawals.credit(profit);
        }
    }

    // ============================================
    // Withdrawals
    // ============================================

    fn check_emergency_balance(&mut self) {
        let Some(balance) = self.withdrawals.emergency_alert() else {
            return;
        };
        let threshold = self.withdrawals.config().emergency_threshold;
        tracing::warn!(
            "Smart balance {} is above the emergency threshold {}",
            balance,
            threshold
        );
        let _ = self
            .event_tx
            .send(EngineEvent::EmergencyBalance { balance, threshold });
    }

    async fn evaluate_withdrawal(&mut self) {
        if let Some(scheduled) = self.withdrawals.evaluate(Utc::now()) {
            self.launch_withdrawal(scheduled).await;
        }
    }

    /// Persists the new pending entry, announces it and hands the transfer
    /// to the executor once its delay has elapsed.
    async fn launch_withdrawal(&mut self, scheduled: ScheduledWithdrawal) {
        let ScheduledWithdrawal {
            request,
            delay,
            kind,
        } = scheduled;

        if let Some(entry) = self.withdrawals.ledger().entries().last().cloned() {
            self.persist(&entry).await;
        }

        let _ = self.event_tx.send(EngineEvent::WithdrawalRequested {
            id: request.id,
            amount: request.amount,
            destination_address: request.destination_address.clone(),
            scheduled_at: request.scheduled_at,
            kind,
        });

        let executor = Arc::clone(&self.transfer_executor);
        self.transfers.spawn(async move {
            tokio::time::sleep(delay).await;
            let result = match executor.transfer(&request).await {
                Ok(tx_hash) => TransferResult::Completed { tx_hash },
                Err(e) => TransferResult::Failed {
                    reason: format!("{e:#}"),
                },
            };
            TransferOutcome {
                id: request.id,
                result,
            }
        });
    }

    async fn handle_transfer(&mut self, joined: Result<TransferOutcome, JoinError>) {
        let TransferOutcome { id, result } = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Transfer task did not complete: {}", e);
                return;
            }
        };

        let entry = match self.withdrawals.resolve(id, &result, Utc::now()) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring transfer result: {}", e);
                return;
            }
        };

        match &result {
            TransferResult::Completed { tx_hash } => {
                tracing::info!("Withdrawal {} of {} completed: {}", id, entry.amount, tx_hash);
            }
            TransferResult::Failed { reason } => {
                tracing::error!(
                    "Withdrawal {} of {} failed: {}; amount left for manual reconciliation",
                    id,
                    entry.amount,
                    reason
                );
            }
        }

        self.persist(&entry).await;
        let _ = self.event_tx.send(EngineEvent::WithdrawalResolved {
            id,
            status: entry.status,
            tx_hash: entry.tx_hash.clone(),
        });
        self.publish();
    }

    async fn persist(&self, entry: &WithdrawalHistoryEntry) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.append(entry).await {
            tracing::error!(
                "Failed to persist withdrawal {} ({}): {:#}",
                entry.id,
                entry.status.as_str(),
                e
            );
        }
    }

    // ============================================
    // Observation
    // ============================================

    fn set_mode(&mut self, to: EngineMode) {
        if self.mode == to {
            return;
        }
        let transition = ModeTransition {
            from: self.mode,
            to,
            timestamp: Utc::now(),
        };
        self.mode = to;
        self.last_transition = Some(transition);
        tracing::info!("Engine mode {} -> {}", transition.from, transition.to);

        let _ = self.event_tx.send(EngineEvent::ModeChanged {
            from: transition.from,
            to: transition.to,
            timestamp: transition.timestamp,
        });
    }

    fn snapshot(&self) -> EngineStatus {
        EngineStatus {
            mode: self.mode,
            activating: self.activating.map(|p| p.target),
            limited: self.limited,
            epoch: self.tasks.epoch().value(),
            preflight_checks: self.preflight_checks.clone(),
            verdict: self.verdict,
            activation_steps: self.activation_steps.clone(),
            confidence: self.confidence.score(),
            confidence_samples: self.confidence.sample_size(),
            live_gate: self.config.live_confidence_gate,
            recent_signals: self.signals.recent(),
            latency: self.signals.latency(),
            highest_block: self.signals.highest_block(),
            withdrawal: self.withdrawals.config().clone(),
            recent_withdrawals: self.withdrawals.ledger().recent(STATUS_HISTORY_LEN),
            transfers_in_flight: self.transfers.len(),
            stale_updates_dropped: self.stale_updates_dropped,
            last_transition: self.last_transition,
            updated_at: Utc::now(),
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preflight::CheckRegistry;
    use crate::sequencer::{ActivationPlan, PacedStepWork};
    use arb_engine_core::{ConfidenceConfig, SignalStatus, WithdrawalConfig, WithdrawalRequest};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    struct NoSignals;

    #[async_trait]
    impl SignalSource for NoSignals {
        async fn poll(&self, _mode: EngineMode) -> anyhow::Result<Vec<TradeSignal>> {
            Ok(Vec::new())
        }
    }

    struct NoTransfers;

    #[async_trait]
    impl TransferExecutor for NoTransfers {
        async fn transfer(&self, _request: &WithdrawalRequest) -> anyhow::Result<String> {
            anyhow::bail!("disabled")
        }
    }

    fn actor() -> (EngineActor, watch::Receiver<EngineStatus>) {
        let (_tx, rx) = mpsc::channel(8);
        let (event_tx, _) = broadcast::channel(64);
        let (status_tx, status_rx) = watch::channel(EngineStatus::default());
        let parts = ActorParts {
            engine: EngineConfig::default(),
            validator: PreflightValidator::new(CheckRegistry::new(), Duration::from_secs(1)),
            sequencer: ActivationSequencer::new(
                ActivationPlan::standard(),
                Arc::new(PacedStepWork::new(Duration::ZERO)),
            ),
            confidence: ConfidenceAccumulator::new(ConfidenceConfig::default()),
            withdrawals: WithdrawalScheduler::new(WithdrawalConfig::default(), Some(1)),
            signal_source: Arc::new(NoSignals),
            transfer_executor: Arc::new(NoTransfers),
            store: None,
        };
        (EngineActor::new(parts, rx, event_tx, status_tx), status_rx)
    }

    fn confirmed(id: &str) -> TradeSignal {
        TradeSignal {
            id: id.to_string(),
            block_number: 1,
            pair: "WETH/USDC".to_string(),
            chain: "base".to_string(),
            action: "swap".to_string(),
            confidence: 0.9,
            expected_profit: dec!(0.1),
            status: SignalStatus::Confirmed,
        }
    }

    #[tokio::test]
    async fn events_from_an_old_epoch_are_dropped_and_counted() {
        let (mut actor, status_rx) = actor();
        let old = actor.tasks.epoch();
        actor.tasks.advance();
        actor.mode = EngineMode::Sim;

        actor
            .handle_loop_event(LoopEvent {
                epoch: old,
                kind: LoopEventKind::Signals(vec![confirmed("a")]),
            })
            .await;

        assert_eq!(actor.stale_updates_dropped, 1);
        assert_eq!(actor.confidence.sample_size(), 0);
        assert!(actor.signals.is_empty());

        actor.publish();
        assert_eq!(status_rx.borrow().stale_updates_dropped, 1);
    }

    #[tokio::test]
    async fn current_epoch_signals_feed_confidence() {
        let (mut actor, _status_rx) = actor();
        actor.mode = EngineMode::Sim;
        let epoch = actor.tasks.epoch();

        actor
            .handle_loop_event(LoopEvent {
                epoch,
                kind: LoopEventKind::Signals(vec![confirmed("a"), confirmed("a")]),
            })
            .await;

        assert_eq!(actor.stale_updates_dropped, 0);
        assert_eq!(actor.confidence.sample_size(), 1);
        // SIM profits are paper profits
        assert_eq!(actor.withdrawals.config().smart_balance, dec!(0));
    }

    #[tokio::test]
    async fn stale_activation_finish_cannot_flip_the_mode() {
        let (mut actor, _status_rx) = actor();
        actor.verdict = Some(PreflightVerdict {
            all_passed: true,
            critical_passed: true,
        });
        actor.start_sim().unwrap();
        let activation_epoch = actor.tasks.epoch();
        assert!(actor.stop());

        actor
            .handle_loop_event(LoopEvent {
                epoch: activation_epoch,
                kind: LoopEventKind::ActivationFinished {
                    target: EngineMode::Sim,
                },
            })
            .await;

        assert_eq!(actor.mode, EngineMode::Idle);
        assert!(actor.activating.is_none());
        assert_eq!(actor.stale_updates_dropped, 1);
    }

    #[tokio::test]
    async fn stop_when_idle_is_a_no_op() {
        let (mut actor, _status_rx) = actor();
        let epoch = actor.tasks.epoch();
        assert!(!actor.stop());
        assert_eq!(actor.tasks.epoch(), epoch);
        assert!(actor.last_transition.is_none());
    }
}
