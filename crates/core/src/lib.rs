pub mod activation;
pub mod config;
pub mod config_loader;
pub mod config_watcher;
pub mod mode;
pub mod preflight;
pub mod signal;
pub mod traits;
pub mod validation;
pub mod withdrawal;

pub use activation::{ActivationStep, StepStatus};
pub use config::{
    ActivationConfig, AppConfig, ConfidenceConfig, DatabaseConfig, EngineConfig, PreflightConfig,
    ServerConfig, SettingsError, SimulationConfig, WithdrawalSettings,
};
pub use config_loader::ConfigLoader;
pub use config_watcher::ConfigWatcher;
pub use mode::EngineMode;
pub use preflight::{CheckCategory, CheckDescriptor, CheckStatus, PreflightCheck, PreflightVerdict};
pub use signal::{Outcome, SignalStatus, TradeSignal};
pub use traits::{ReadinessProbe, SignalSource, StepWork, TransferExecutor};
pub use withdrawal::{
    ConfigError, WithdrawalConfig, WithdrawalConfigUpdate, WithdrawalHistoryEntry, WithdrawalKind,
    WithdrawalRequest, WithdrawalStatus,
};
