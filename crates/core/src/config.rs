use crate::preflight::{CheckCategory, CheckDescriptor};
use crate::withdrawal::WithdrawalConfigUpdate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Lowest live gate accepted from configuration.
pub const MIN_LIVE_GATE: f64 = 85.0;

/// Fewest outcomes the confidence ceiling may be computed over.
pub const MIN_CONFIDENCE_SAMPLES: usize = 10;

/// Startup settings that would break the mode gates or the loop timers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("engine.{name} must be greater than zero")]
    ZeroInterval { name: &'static str },

    #[error("engine.live_confidence_gate must be within {min}..=100, got {0}", min = MIN_LIVE_GATE)]
    LiveGate(f64),

    #[error("confidence.min_samples must be at least {min}, got {0}", min = MIN_CONFIDENCE_SAMPLES)]
    TooFewSamples(usize),

    #[error("confidence.window ({window}) must hold at least min_samples ({min_samples})")]
    WindowTooSmall { window: usize, min_samples: usize },

    #[error("confidence.wilson_z must be a positive number, got {0}")]
    WilsonZ(f64),

    #[error(
        "confidence steps need 0 < fail_step < confirm_step <= 100, got fail_step={fail_step} confirm_step={confirm_step}"
    )]
    Steps { confirm_step: f64, fail_step: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    pub preflight: PreflightConfig,
    pub activation: ActivationConfig,
    pub confidence: ConfidenceConfig,
    pub withdrawal: WithdrawalSettings,
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Checks the engine and confidence sections. Withdrawal settings are
    /// validated separately, like any runtime update.
    ///
    /// # Errors
    /// Returns the first setting that is out of range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.engine.validate()?;
        self.confidence.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Withdrawal audit log storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub enabled: bool,
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "sqlite://data/withdrawals.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Mode state machine and loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub signal_poll_interval_ms: u64,
    pub withdrawal_eval_interval_ms: u64,
    /// Minimum confidence score for SIM → LIVE.
    pub live_confidence_gate: f64,
    /// Accept a verdict with only critical checks passed ("limited" SIM).
    pub allow_limited_sim: bool,
    /// Recent signals kept for observers.
    pub signal_history_len: usize,
    pub command_buffer: usize,
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            signal_poll_interval_ms: 1_000,
            withdrawal_eval_interval_ms: 5_000,
            live_confidence_gate: 85.0,
            allow_limited_sim: false,
            signal_history_len: 50,
            command_buffer: 32,
            event_buffer: 1_000,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub const fn signal_poll_interval(&self) -> Duration {
        Duration::from_millis(self.signal_poll_interval_ms)
    }

    #[must_use]
    pub const fn withdrawal_eval_interval(&self) -> Duration {
        Duration::from_millis(self.withdrawal_eval_interval_ms)
    }

    /// # Errors
    /// Zero loop intervals, or a live gate below [`MIN_LIVE_GATE`] or above 100.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.signal_poll_interval_ms == 0 {
            return Err(SettingsError::ZeroInterval {
                name: "signal_poll_interval_ms",
            });
        }
        if self.withdrawal_eval_interval_ms == 0 {
            return Err(SettingsError::ZeroInterval {
                name: "withdrawal_eval_interval_ms",
            });
        }
        if !(MIN_LIVE_GATE..=100.0).contains(&self.live_confidence_gate) {
            return Err(SettingsError::LiveGate(self.live_confidence_gate));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightConfig {
    /// A probe that takes longer than this fails its check.
    pub probe_timeout_ms: u64,
    pub checks: Vec<CheckDescriptor>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 5_000,
            checks: default_checks(),
        }
    }
}

impl PreflightConfig {
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

fn default_checks() -> Vec<CheckDescriptor> {
    use CheckCategory::{Ai, Blockchain, Network, Security};

    vec![
        CheckDescriptor::new("rpc_connectivity", "RPC endpoint connectivity", Network, true),
        CheckDescriptor::new("market_feed", "Market data websocket", Network, true),
        CheckDescriptor::new("chain_sync", "Chain head in sync", Blockchain, true),
        CheckDescriptor::new("executor_contract", "Executor contract deployed", Blockchain, true),
        CheckDescriptor::new("gas_oracle", "Gas price oracle", Blockchain, false),
        CheckDescriptor::new("model_loaded", "Signal model loaded", Ai, false),
        CheckDescriptor::new("inference_latency", "Inference latency budget", Ai, false),
        CheckDescriptor::new("signing_key", "Signing key available", Security, true),
        CheckDescriptor::new("wallet_allowlist", "Withdrawal wallet allow-list", Security, false),
    ]
}

/// Pacing of activation steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    pub step_delay_ms: u64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self { step_delay_ms: 600 }
    }
}

impl ActivationConfig {
    #[must_use]
    pub const fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// Confidence accumulator policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Number of recent outcomes considered.
    pub window: usize,
    /// Outcomes below this count are padded as failures when computing the ceiling.
    pub min_samples: usize,
    /// Z-score for the Wilson lower bound.
    pub wilson_z: f64,
    /// Largest rise per confirmed outcome.
    pub confirm_step: f64,
    /// Drop per failed outcome. Kept smaller than `confirm_step`.
    pub fail_step: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            window: 20,
            min_samples: 10,
            wilson_z: 0.5,
            confirm_step: 5.0,
            fail_step: 2.5,
        }
    }
}

impl ConfidenceConfig {
    /// Rejects policies under which a short burst of outcomes could lift the
    /// score to the live gate, or under which it could never get there.
    ///
    /// # Errors
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.min_samples < MIN_CONFIDENCE_SAMPLES {
            return Err(SettingsError::TooFewSamples(self.min_samples));
        }
        if self.window < self.min_samples {
            return Err(SettingsError::WindowTooSmall {
                window: self.window,
                min_samples: self.min_samples,
            });
        }
        if !self.wilson_z.is_finite() || self.wilson_z <= 0.0 {
            return Err(SettingsError::WilsonZ(self.wilson_z));
        }
        let steps_ok = self.fail_step > 0.0
            && self.fail_step < self.confirm_step
            && self.confirm_step <= 100.0;
        if !steps_ok {
            return Err(SettingsError::Steps {
                confirm_step: self.confirm_step,
                fail_step: self.fail_step,
            });
        }
        Ok(())
    }
}

/// Initial auto-withdrawal settings. Validated like any other update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawalSettings {
    pub enabled: bool,
    pub wallet_address: String,
    pub threshold_amount: Decimal,
    pub max_transfer_minutes: u32,
    pub cooldown_minutes: u32,
    pub min_withdrawal_amount: Decimal,
    /// Zero means unlimited.
    pub daily_limit: Decimal,
    /// Zero disables the alert.
    pub emergency_threshold: Decimal,
}

impl Default for WithdrawalSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            wallet_address: String::new(),
            threshold_amount: Decimal::ONE,
            max_transfer_minutes: 15,
            cooldown_minutes: 0,
            min_withdrawal_amount: Decimal::ZERO,
            daily_limit: Decimal::ZERO,
            emergency_threshold: Decimal::ZERO,
        }
    }
}

impl WithdrawalSettings {
    #[must_use]
    pub fn to_update(&self) -> WithdrawalConfigUpdate {
        WithdrawalConfigUpdate {
            is_enabled: Some(self.enabled),
            wallet_address: Some(self.wallet_address.clone()),
            threshold_amount: Some(self.threshold_amount.to_string()),
            max_transfer_minutes: Some(self.max_transfer_minutes),
            cooldown_minutes: Some(self.cooldown_minutes),
            min_withdrawal_amount: Some(self.min_withdrawal_amount.to_string()),
            daily_limit: Some(self.daily_limit.to_string()),
            emergency_threshold: Some(self.emergency_threshold.to_string()),
        }
    }
}

/// Knobs for the simulated collaborators used by the launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub signal_success_rate: f64,
    pub signals_per_poll: usize,
    pub probe_pass_rate: f64,
    pub probe_latency_ms: u64,
    pub transfer_failure_rate: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            signal_success_rate: 0.92,
            signals_per_poll: 2,
            probe_pass_rate: 0.97,
            probe_latency_ms: 250,
            transfer_failure_rate: 0.05,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_registry_has_unique_ids_and_critical_checks() {
        let checks = default_checks();
        let ids: HashSet<_> = checks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), checks.len());
        assert!(checks.iter().any(|c| c.is_critical));
        assert!(checks.iter().any(|c| !c.is_critical));
    }

    #[test]
    fn default_gate_is_85() {
        let config = AppConfig::default();
        assert!((config.engine.live_confidence_gate - 85.0).abs() < f64::EPSILON);
        assert!(config.confidence.fail_step < config.confidence.confirm_step);
    }

    #[test]
    fn settings_become_an_update() {
        let settings = WithdrawalSettings {
            enabled: true,
            wallet_address: "0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6".to_string(),
            threshold_amount: Decimal::new(5, 1),
            max_transfer_minutes: 10,
            cooldown_minutes: 2,
            daily_limit: Decimal::new(25, 0),
            ..WithdrawalSettings::default()
        };
        let update = settings.to_update();
        assert_eq!(update.threshold_amount.as_deref(), Some("0.5"));
        assert_eq!(update.daily_limit.as_deref(), Some("25"));
        assert_eq!(update.emergency_threshold.as_deref(), Some("0"));
        assert_eq!(update.is_enabled, Some(true));
    }

    #[test]
    fn default_settings_validate() {
        assert_eq!(AppConfig::default().validate(), Ok(()));
    }

    #[test]
    fn out_of_range_confidence_settings_are_rejected() {
        let cases: [(&str, fn(&mut ConfidenceConfig)); 10] = [
            ("min_samples 0", |c| c.min_samples = 0),
            ("min_samples 1", |c| c.min_samples = 1),
            ("window below min_samples", |c| c.window = 5),
            ("wilson_z 0", |c| c.wilson_z = 0.0),
            ("wilson_z negative", |c| c.wilson_z = -1.0),
            ("wilson_z NaN", |c| c.wilson_z = f64::NAN),
            ("fail_step 0", |c| c.fail_step = 0.0),
            ("fail_step equals confirm_step", |c| c.fail_step = c.confirm_step),
            ("fail_step above confirm_step", |c| c.fail_step = 10.0),
            ("confirm_step above 100", |c| c.confirm_step = 150.0),
        ];

        for (name, mutate) in cases {
            let mut config = ConfidenceConfig::default();
            mutate(&mut config);
            assert!(config.validate().is_err(), "{name} was accepted");
        }
    }

    #[test]
    fn gate_and_intervals_are_checked() {
        let mut engine = EngineConfig {
            live_confidence_gate: 84.9,
            ..EngineConfig::default()
        };
        assert_eq!(engine.validate(), Err(SettingsError::LiveGate(84.9)));

        engine.live_confidence_gate = 100.5;
        assert!(engine.validate().is_err());

        engine.live_confidence_gate = 90.0;
        engine.signal_poll_interval_ms = 0;
        assert_eq!(
            engine.validate(),
            Err(SettingsError::ZeroInterval {
                name: "signal_poll_interval_ms"
            })
        );
    }

    #[test]
    fn app_config_reports_the_failing_section() {
        let mut config = AppConfig::default();
        config.confidence.min_samples = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "confidence.min_samples must be at least 10, got 0");
    }
}
