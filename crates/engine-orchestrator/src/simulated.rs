//! Randomised stand-ins for the external collaborators, used by the launcher
//! and by tests that need realistic traffic.

use anyhow::Result;
use arb_engine_core::{
    CheckDescriptor, EngineMode, ReadinessProbe, SignalSource, SignalStatus, SimulationConfig,
    TradeSignal, TransferExecutor, WithdrawalRequest,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

const PAIRS: &[&str] = &["WETH/USDC", "WBTC/WETH", "ARB/USDC", "LINK/WETH"];
const CHAINS: &[&str] = &["ethereum", "arbitrum", "base", "optimism"];
const ACTIONS: &[&str] = &["flash_swap", "triangular", "cross_dex"];

fn rng_from(seed: Option<u64>) -> ChaCha8Rng {
    seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64)
}

fn probability(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

struct SignalState {
    rng: ChaCha8Rng,
    next_id: u64,
    block: u64,
    open: Vec<TradeSignal>,
}

/// Emits each signal twice: `Detected` on one poll, then `Confirmed` or
/// `Failed` on the next. Block numbers jitter and are not monotone.
pub struct SimulatedSignalSource {
    success_rate: f64,
    per_poll: usize,
    state: Mutex<SignalState>,
}

impl SimulatedSignalSource {
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            success_rate: probability(config.signal_success_rate),
            per_poll: config.signals_per_poll,
            state: Mutex::new(SignalState {
                rng: rng_from(config.seed),
                next_id: 1,
                block: 19_000_000,
                open: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl SignalSource for SimulatedSignalSource {
    async fn poll(&self, mode: EngineMode) -> Result<Vec<TradeSignal>> {
        let mut state = self.state.lock();
        let SignalState {
            rng,
            next_id,
            block,
            open,
        } = &mut *state;

        let mut batch: Vec<TradeSignal> = open
            .drain(..)
            .map(|signal| {
                let status = if rng.gen_bool(self.success_rate) {
                    SignalStatus::Confirmed
                } else {
                    SignalStatus::Failed
                };
                signal.with_status(status)
            })
            .collect();

        *block += rng.gen_range(1..4);
        for _ in 0..self.per_poll {
            let id = format!("{}-{:06}", mode.as_str().to_lowercase(), next_id);
            *next_id += 1;
            let signal = TradeSignal {
                id,
                block_number: block.saturating_sub(rng.gen_range(0..3)),
                pair: PAIRS[rng.gen_range(0..PAIRS.len())].to_string(),
                chain: CHAINS[rng.gen_range(0..CHAINS.len())].to_string(),
                action: ACTIONS[rng.gen_range(0..ACTIONS.len())].to_string(),
                confidence: rng.gen_range(0.5..0.99),
                expected_profit: Decimal::new(rng.gen_range(10..500), 4),
                status: SignalStatus::Detected,
            };
            open.push(signal.clone());
            batch.push(signal);
        }

        Ok(batch)
    }
}

/// Probe that passes with a fixed probability after a fixed latency.
pub struct SimulatedProbe {
    name: String,
    pass_rate: f64,
    latency: Duration,
    rng: Mutex<ChaCha8Rng>,
}

impl SimulatedProbe {
    #[must_use]
    pub fn new(descriptor: &CheckDescriptor, config: &SimulationConfig, salt: u64) -> Self {
        Self {
            name: descriptor.name.clone(),
            pass_rate: probability(config.probe_pass_rate),
            latency: Duration::from_millis(config.probe_latency_ms),
            rng: Mutex::new(rng_from(config.seed.map(|s| s ^ salt))),
        }
    }

    /// Probe factory for [`CheckRegistry::from_descriptors`](crate::CheckRegistry::from_descriptors).
    pub fn factory(
        config: &SimulationConfig,
    ) -> impl FnMut(&CheckDescriptor) -> Arc<dyn ReadinessProbe> + '_ {
        let mut salt = 0_u64;
        move |descriptor| {
            salt += 1;
            Arc::new(Self::new(descriptor, config, salt)) as Arc<dyn ReadinessProbe>
        }
    }
}

#[async_trait]
impl ReadinessProbe for SimulatedProbe {
    async fn probe(&self) -> Result<String> {
        let passes = self.rng.lock().gen_bool(self.pass_rate);
        tokio::time::sleep(self.latency).await;
        if passes {
            Ok(format!("{} ok ({}ms)", self.name, self.latency.as_millis()))
        } else {
            anyhow::bail!("{} did not respond", self.name)
        }
    }
}

/// Executor that fails with a fixed probability and otherwise returns a
/// random transaction hash.
pub struct SimulatedTransferExecutor {
    failure_rate: f64,
    rng: Mutex<ChaCha8Rng>,
}

impl SimulatedTransferExecutor {
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            failure_rate: probability(config.transfer_failure_rate),
            rng: Mutex::new(rng_from(config.seed)),
        }
    }
}

#[async_trait]
impl TransferExecutor for SimulatedTransferExecutor {
    async fn transfer(&self, request: &WithdrawalRequest) -> Result<String> {
        let mut rng = self.rng.lock();
        if rng.gen_bool(self.failure_rate) {
            anyhow::bail!(
                "transfer of {} to {} reverted",
                request.amount,
                request.destination_address
            );
        }

        let mut hash = String::with_capacity(66);
        hash.push_str("0x");
        for _ in 0..32 {
            let _ = write!(hash, "{:02x}", rng.gen::<u8>());
        }
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arb_engine_core::CheckCategory;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed: Some(seed),
            probe_latency_ms: 0,
            ..SimulationConfig::default()
        }
    }

    #[tokio::test]
    async fn signals_settle_on_the_following_poll() {
        let source = SimulatedSignalSource::new(&config(3));
        let first = source.poll(EngineMode::Sim).await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|s| s.status == SignalStatus::Detected));

        let second = source.poll(EngineMode::Sim).await.unwrap();
        assert_eq!(second.len(), 4);
        assert_eq!(second[0].id, first[0].id);
        assert!(second[0].status.is_terminal());
        assert!(second[0].expected_profit > Decimal::ZERO);
    }

    #[tokio::test]
    async fn certain_failure_rate_always_fails() {
        let executor = SimulatedTransferExecutor::new(&SimulationConfig {
            transfer_failure_rate: 1.0,
            ..config(1)
        });
        let request = WithdrawalRequest {
            id: Uuid::new_v4(),
            amount: dec!(1),
            destination_address: "0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6".to_string(),
            scheduled_at: Utc::now(),
        };
        assert!(executor.transfer(&request).await.is_err());

        let executor = SimulatedTransferExecutor::new(&SimulationConfig {
            transfer_failure_rate: 0.0,
            ..config(1)
        });
        let hash = executor.transfer(&request).await.unwrap();
        assert_eq!(hash.len(), 66);
        assert!(hash.starts_with("0x"));
    }

    #[tokio::test]
    async fn probe_respects_pass_rate() {
        let descriptor = CheckDescriptor::new("rpc", "RPC", CheckCategory::Network, true);
        let passing = SimulatedProbe::new(
            &descriptor,
            &SimulationConfig {
                probe_pass_rate: 1.0,
                ..config(5)
            },
            0,
        );
        assert!(passing.probe().await.is_ok());

        let failing = SimulatedProbe::new(
            &descriptor,
            &SimulationConfig {
                probe_pass_rate: f64::NAN,
                ..config(5)
            },
            0,
        );
        assert!(failing.probe().await.is_err());
    }
}
