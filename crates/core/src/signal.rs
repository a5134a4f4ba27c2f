//! Trade-signal records delivered by the signal source.
//!
//! The payload is opaque to the pipeline: only the id, the status and the
//! expected profit of confirmed signals are interpreted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Upstream lifecycle of a signal. Transitions happen at the source; the
/// pipeline only observes snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Detected,
    Executing,
    Confirmed,
    Failed,
}

impl SignalStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    /// Maps a terminal status to its outcome.
    #[must_use]
    pub const fn outcome(self) -> Option<Outcome> {
        match self {
            Self::Confirmed => Some(Outcome::Success),
            Self::Failed => Some(Outcome::Failure),
            Self::Detected | Self::Executing => None,
        }
    }
}

/// Terminal result of a signal, as consumed by the confidence accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub id: String,
    /// Not guaranteed to be monotone across deliveries.
    pub block_number: u64,
    pub pair: String,
    pub chain: String,
    pub action: String,
    /// Source-side confidence in `[0, 1]`. Opaque to the pipeline.
    pub confidence: f64,
    pub expected_profit: Decimal,
    pub status: SignalStatus,
}

impl TradeSignal {
    /// Returns a copy of this signal with a new status, as the source would
    /// deliver the next snapshot.
    #[must_use]
    pub fn with_status(&self, status: SignalStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
