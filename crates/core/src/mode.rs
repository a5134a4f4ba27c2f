use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating stage of the engine.
///
/// Exactly one value is current at any instant. The engine actor is the only
/// writer; everything else observes it through status snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineMode {
    /// Nothing running. Initial state and the target of every `stop()`.
    #[default]
    Idle,
    /// Readiness checks in flight.
    Preflight,
    /// Simulated execution, accumulating confidence.
    Sim,
    /// Live execution.
    Live,
}

impl EngineMode {
    /// Modes that own signal polling loops and an activation sequence.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Sim | Self::Live)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Preflight => "PREFLIGHT",
            Self::Sim => "SIM",
            Self::Live => "LIVE",
        }
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
