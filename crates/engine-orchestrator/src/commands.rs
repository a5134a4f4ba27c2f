use crate::events::EngineStatus;
use crate::preflight::PreflightReport;
use crate::scheduler::Epoch;
use crate::withdrawal::{ManualWithdrawal, WithdrawalRefused};
use arb_engine_core::{
    ActivationStep, ConfigError, EngineMode, PreflightCheck, PreflightVerdict, TradeSignal,
    WithdrawalConfig, WithdrawalConfigUpdate, WithdrawalHistoryEntry, WithdrawalRequest,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

pub type TransitionReply = oneshot::Sender<Result<(), TransitionRefused>>;

#[derive(Debug)]
pub enum EngineCommand {
    RunPreflight(TransitionReply),
    StartSim(TransitionReply),
    StartLive(TransitionReply),
    /// Replies `true` if anything was stopped.
    Stop(oneshot::Sender<bool>),
    IngestSignal(Box<TradeSignal>),
    AdjustBalance {
        delta: Decimal,
        reply: oneshot::Sender<Decimal>,
    },
    UpdateWithdrawalConfig {
        update: WithdrawalConfigUpdate,
        reply: oneshot::Sender<Result<WithdrawalConfig, ConfigError>>,
    },
    RequestWithdrawal {
        request: ManualWithdrawal,
        reply: oneshot::Sender<Result<WithdrawalRequest, WithdrawalRefused>>,
    },
    GetStatus(oneshot::Sender<EngineStatus>),
    GetWithdrawalHistory(oneshot::Sender<Vec<WithdrawalHistoryEntry>>),
    Shutdown,
}

/// Why a mode transition was refused. The mode is left unchanged.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TransitionRefused {
    #[error("{command} is not allowed in {mode} mode")]
    InvalidMode {
        command: String,
        mode: EngineMode,
    },

    #[error("activation into {target} is still running")]
    ActivationInProgress { target: EngineMode },

    #[error("no preflight verdict; run preflight first")]
    PreflightMissing,

    #[error(
        "preflight did not pass (all_passed={}, critical_passed={})",
        verdict.all_passed,
        verdict.critical_passed
    )]
    PreflightNotPassed { verdict: PreflightVerdict },

    #[error("confidence {score:.1} is below the live gate {gate:.1}")]
    InsufficientConfidence { score: f64, gate: f64 },
}

impl TransitionRefused {
    pub(crate) fn invalid_mode(command: &str, mode: EngineMode) -> Self {
        Self::InvalidMode {
            command: command.to_string(),
            mode,
        }
    }
}

/// Error surfaced by [`EngineHandle`](crate::EngineHandle) calls.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Refused(#[from] TransitionRefused),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Withdrawal(#[from] WithdrawalRefused),

    #[error("engine actor is not running")]
    Closed,
}

/// Output of a per-mode task, tagged with the epoch it was spawned in.
#[derive(Debug)]
pub(crate) struct LoopEvent {
    pub epoch: Epoch,
    pub kind: LoopEventKind,
}

#[derive(Debug)]
pub(crate) enum LoopEventKind {
    PreflightProgress(Vec<PreflightCheck>),
    PreflightFinished(PreflightReport),
    ActivationProgress {
        target: EngineMode,
        steps: Vec<ActivationStep>,
    },
    ActivationFinished {
        target: EngineMode,
    },
    Signals(Vec<TradeSignal>),
    WithdrawalTick,
}
