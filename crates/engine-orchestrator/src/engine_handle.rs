use crate::commands::{EngineCommand, EngineError, TransitionRefused};
use crate::events::{EngineEvent, EngineStatus};
use crate::withdrawal::ManualWithdrawal;
use arb_engine_core::{
    EngineMode, TradeSignal, WithdrawalConfig, WithdrawalConfigUpdate, WithdrawalHistoryEntry,
    WithdrawalRequest,
};
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Cloneable front end of the engine actor.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
    event_tx: broadcast::Sender<EngineEvent>,
    status_rx: watch::Receiver<EngineStatus>,
}

impl EngineHandle {
    #[must_use]
    pub const fn new(
        tx: mpsc::Sender<EngineCommand>,
        event_tx: broadcast::Sender<EngineEvent>,
        status_rx: watch::Receiver<EngineStatus>,
    ) -> Self {
        Self {
            tx,
            event_tx,
            status_rx,
        }
    }

    async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.tx.send(command).await.map_err(|_| EngineError::Closed)
    }

    async fn transition<F>(&self, make: F) -> Result<(), EngineError>
    where
        F: FnOnce(oneshot::Sender<Result<(), TransitionRefused>>) -> EngineCommand,
    {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx)).await?;
        rx.await.map_err(|_| EngineError::Closed)??;
        Ok(())
    }

    /// Starts a preflight run. Returns once the run has begun; follow its
    /// progress through events or status.
    ///
    /// # Errors
    /// [`EngineError::Refused`] outside IDLE/PREFLIGHT or while an activation
    /// is pending, [`EngineError::Closed`] if the actor is gone.
    pub async fn run_preflight(&self) -> Result<(), EngineError> {
        self.transition(EngineCommand::RunPreflight).await
    }

    /// IDLE → SIM. Returns once the activation sequence has started.
    ///
    /// # Errors
    /// [`EngineError::Refused`] when the latest verdict does not allow it.
    pub async fn start_sim(&self) -> Result<(), EngineError> {
        self.transition(EngineCommand::StartSim).await
    }

    /// SIM → LIVE. Returns once the activation sequence has started.
    ///
    /// # Errors
    /// [`EngineError::Refused`] unless in SIM with confidence at the gate.
    pub async fn start_live(&self) -> Result<(), EngineError> {
        self.transition(EngineCommand::StartLive).await
    }

    /// Returns to IDLE from anywhere. `Ok(false)` when already idle.
    ///
    /// # Errors
    /// Returns [`EngineError::Closed`] if the actor is gone.
    pub async fn stop(&self) -> Result<bool, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineCommand::Stop(tx)).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Pushes one signal snapshot, as an alternative to source polling.
    ///
    /// # Errors
    /// Returns [`EngineError::Closed`] if the actor is gone.
    pub async fn ingest_signal(&self, signal: TradeSignal) -> Result<(), EngineError> {
        self.send(EngineCommand::IngestSignal(Box::new(signal))).await
    }

    /// Applies a manual correction to the smart balance and returns the new
    /// balance.
    ///
    /// # Errors
    /// Returns [`EngineError::Closed`] if the actor is gone.
    pub async fn adjust_balance(&self, delta: Decimal) -> Result<Decimal, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::AdjustBalance { delta, reply }).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// # Errors
    /// [`EngineError::Config`] when validation rejects the update.
    pub async fn update_withdrawal_config(
        &self,
        update: WithdrawalConfigUpdate,
    ) -> Result<WithdrawalConfig, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::UpdateWithdrawalConfig { update, reply })
            .await?;
        Ok(rx.await.map_err(|_| EngineError::Closed)??)
    }

    /// Schedules an operator withdrawal for immediate transfer and returns
    /// the request handed to the executor.
    ///
    /// # Errors
    /// [`EngineError::Withdrawal`] when the amount, balance, minimum or daily
    /// limit does not allow it.
    pub async fn request_withdrawal(
        &self,
        request: ManualWithdrawal,
    ) -> Result<WithdrawalRequest, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::RequestWithdrawal { request, reply })
            .await?;
        Ok(rx.await.map_err(|_| EngineError::Closed)??)
    }

    /// Fresh status straight from the actor.
    ///
    /// # Errors
    /// Returns [`EngineError::Closed`] if the actor is gone.
    pub async fn get_status(&self) -> Result<EngineStatus, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineCommand::GetStatus(tx)).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Complete in-memory ledger, oldest first.
    ///
    /// # Errors
    /// Returns [`EngineError::Closed`] if the actor is gone.
    pub async fn withdrawal_history(&self) -> Result<Vec<WithdrawalHistoryEntry>, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineCommand::GetWithdrawalHistory(tx)).await?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Last published snapshot, without a round trip to the actor.
    #[must_use]
    pub fn latest_status(&self) -> EngineStatus {
        self.status_rx.borrow().clone()
    }

    #[must_use]
    pub fn status_watch(&self) -> watch::Receiver<EngineStatus> {
        self.status_rx.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Waits until the published mode equals `mode` with no activation pending.
    ///
    /// # Errors
    /// Returns [`EngineError::Closed`] if the actor stops first.
    pub async fn wait_for_mode(&self, mode: EngineMode) -> Result<EngineStatus, EngineError> {
        let mut rx = self.status_rx.clone();
        let status = rx
            .wait_for(|s| s.mode == mode && s.activating.is_none())
            .await
            .map_err(|_| EngineError::Closed)?;
        Ok(status.clone())
    }

    /// # Errors
    /// Returns [`EngineError::Closed`] if the actor is already gone.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Shutdown).await
    }
}
