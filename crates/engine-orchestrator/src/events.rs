use crate::commands::TransitionRefused;
use crate::signal_book::LatencyStats;
use arb_engine_core::{
    ActivationStep, EngineMode, PreflightCheck, PreflightVerdict, TradeSignal, WithdrawalConfig,
    WithdrawalHistoryEntry, WithdrawalKind, WithdrawalStatus,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// The mode flipped.
    ModeChanged {
        from: EngineMode,
        to: EngineMode,
        timestamp: DateTime<Utc>,
    },

    /// Full check list after any check changed state.
    PreflightProgress { checks: Vec<PreflightCheck> },

    /// Full step list after any step changed state.
    ActivationProgress {
        target: EngineMode,
        steps: Vec<ActivationStep>,
    },

    /// Threshold crossed or operator request accepted; transfer scheduled.
    WithdrawalRequested {
        id: Uuid,
        amount: Decimal,
        destination_address: String,
        scheduled_at: DateTime<Utc>,
        kind: WithdrawalKind,
    },

    /// Smart balance rose above the emergency threshold.
    EmergencyBalance { balance: Decimal, threshold: Decimal },

    WithdrawalResolved {
        id: Uuid,
        status: WithdrawalStatus,
        tx_hash: Option<String>,
    },

    TransitionRefused {
        command: String,
        refusal: TransitionRefused,
    },
}

/// Last transition, kept for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeTransition {
    pub from: EngineMode,
    pub to: EngineMode,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time view of the pipeline, published after every state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub mode: EngineMode,
    /// Target of an activation sequence still running.
    pub activating: Option<EngineMode>,
    /// SIM entered on a verdict where only critical checks passed.
    pub limited: bool,
    pub epoch: u64,

    // Preflight
    pub preflight_checks: Vec<PreflightCheck>,
    pub verdict: Option<PreflightVerdict>,

    // Activation
    pub activation_steps: Vec<ActivationStep>,

    // Confidence and signals
    pub confidence: f64,
    pub confidence_samples: usize,
    pub live_gate: f64,
    pub recent_signals: Vec<TradeSignal>,
    pub latency: LatencyStats,
    pub highest_block: Option<u64>,

    // Withdrawals
    pub withdrawal: WithdrawalConfig,
    /// Newest first, truncated for display.
    pub recent_withdrawals: Vec<WithdrawalHistoryEntry>,
    pub transfers_in_flight: usize,

    pub stale_updates_dropped: u64,
    pub last_transition: Option<ModeTransition>,
    pub updated_at: DateTime<Utc>,
}

impl Default for EngineStatus {
    fn default() -> Self {
        Self {
            mode: EngineMode::Idle,
            activating: None,
            limited: false,
            epoch: 0,
            preflight_checks: Vec::new(),
            verdict: None,
            activation_steps: Vec::new(),
            confidence: 0.0,
            confidence_samples: 0,
            live_gate: 85.0,
            recent_signals: Vec::new(),
            latency: LatencyStats::default(),
            highest_block: None,
            withdrawal: WithdrawalConfig::default(),
            recent_withdrawals: Vec::new(),
            transfers_in_flight: 0,
            stale_updates_dropped: 0,
            last_transition: None,
            updated_at: Utc::now(),
        }
    }
}
