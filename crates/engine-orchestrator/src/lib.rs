pub mod builder;
pub mod commands;
pub mod confidence;
pub mod engine_actor;
pub mod engine_handle;
pub mod events;
pub mod history_store;
pub mod preflight;
pub mod scheduler;
pub mod sequencer;
pub mod signal_book;
pub mod simulated;
pub mod withdrawal;

pub use builder::EngineBuilder;
pub use commands::{EngineCommand, EngineError, TransitionRefused};
pub use confidence::ConfidenceAccumulator;
pub use engine_actor::EngineActor;
pub use engine_handle::EngineHandle;
pub use events::{EngineEvent, EngineStatus, ModeTransition};
pub use history_store::HistoryStore;
pub use preflight::{CheckRegistry, PreflightReport, PreflightValidator, RegistryError};
pub use scheduler::{Epoch, TaskScheduler};
pub use sequencer::{ActivationPlan, ActivationSequencer, PacedStepWork};
pub use signal_book::{LatencyStats, SignalBook};
pub use simulated::{SimulatedProbe, SimulatedSignalSource, SimulatedTransferExecutor};
pub use withdrawal::{
    LedgerError, ManualWithdrawal, ScheduledWithdrawal, TransferResult, WithdrawalLedger,
    WithdrawalRefused, WithdrawalScheduler,
};
