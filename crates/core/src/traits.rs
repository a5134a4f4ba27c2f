use crate::mode::EngineMode;
use crate::signal::TradeSignal;
use crate::withdrawal::WithdrawalRequest;
use anyhow::Result;
use async_trait::async_trait;

/// Upstream producer of trade signals, polled by the active mode's loop.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Returns whatever signal snapshots arrived since the last poll.
    async fn poll(&self, mode: EngineMode) -> Result<Vec<TradeSignal>>;
}

/// Async probe behind a single preflight check.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// `Ok(message)` passes the check, `Err` fails it with the error text.
    async fn probe(&self) -> Result<String>;
}

/// Work performed for one activation step.
#[async_trait]
pub trait StepWork: Send + Sync {
    /// Runs the step and returns optional details to show next to it.
    async fn perform(&self, target: EngineMode, step_id: &str) -> Option<String>;
}

/// External execution collaborator that moves funds on chain.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    /// Executes the transfer and returns its transaction hash.
    async fn transfer(&self, request: &WithdrawalRequest) -> Result<String>;
}
