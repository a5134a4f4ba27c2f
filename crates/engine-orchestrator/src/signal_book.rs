//! Per-mode signal bookkeeping: recent snapshots for observers, detection to
//! settlement latency, and once-only delivery of terminal outcomes.

use arb_engine_core::{Outcome, TradeSignal};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::time::Instant;

/// Settled ids remembered for duplicate suppression.
const SETTLED_MEMORY: usize = 4_096;

/// Detection to settlement latency over the current mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub samples: u64,
    pub mean_ms: f64,
    pub max_ms: f64,
}

impl LatencyStats {
    fn record(&mut self, ms: f64) {
        self.samples += 1;
        self.mean_ms += (ms - self.mean_ms) / self.samples as f64;
        self.max_ms = self.max_ms.max(ms);
    }
}

#[derive(Debug)]
pub struct SignalBook {
    capacity: usize,
    recent: VecDeque<TradeSignal>,
    first_seen: HashMap<String, Instant>,
    settled: HashSet<String>,
    settled_order: VecDeque<String>,
    latency: LatencyStats,
    highest_block: Option<u64>,
}

impl SignalBook {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            recent: VecDeque::new(),
            first_seen: HashMap::new(),
            settled: HashSet::new(),
            settled_order: VecDeque::new(),
            latency: LatencyStats::default(),
            highest_block: None,
        }
    }

    /// Records one signal snapshot.
    ///
    /// Returns the outcome the first time a terminal status arrives for an
    /// id and `None` for every other delivery, including repeats of an
    /// already settled signal.
    pub fn observe(&mut self, signal: TradeSignal, now: Instant) -> Option<Outcome> {
        self.highest_block = Some(
            self.highest_block
                .map_or(signal.block_number, |b| b.max(signal.block_number)),
        );

        if self.settled.contains(&signal.id) {
            tracing::trace!("Ignoring repeat delivery of settled signal {}", signal.id);
            return None;
        }

        let outcome = signal.status.outcome();

        if outcome.is_some() {
            // no sample without a detection time of our own
            if let Some(seen_at) = self.first_seen.remove(&signal.id) {
                let ms = now.saturating_duration_since(seen_at).as_secs_f64() * 1_000.0;
                self.latency.record(ms);
            }
            self.remember_settled(signal.id.clone());
        } else {
            self.first_seen.entry(signal.id.clone()).or_insert(now);
        }

        self.upsert(signal);
        outcome
    }

    fn upsert(&mut self, signal: TradeSignal) {
        if let Some(existing) = self.recent.iter_mut().find(|s| s.id == signal.id) {
            *existing = signal;
            return;
        }
        if self.recent.len() >= self.capacity {
            if let Some(evicted) = self.recent.pop_front() {
                // still-open signals that scroll out stop counting toward latency
                if !evicted.status.is_terminal() {
                    self.first_seen.remove(&evicted.id);
                }
            }
        }
        self.recent.push_back(signal);
    }

    fn remember_settled(&mut self, id: String) {
        if self.settled_order.len() >= SETTLED_MEMORY {
            if let Some(old) = self.settled_order.pop_front() {
                self.settled.remove(&old);
            }
        }
        self.settled.insert(id.clone());
        self.settled_order.push_back(id);
    }

    /// Newest last.
    #[must_use]
    pub fn recent(&self) -> Vec<TradeSignal> {
        self.recent.iter().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    #[must_use]
    pub const fn latency(&self) -> LatencyStats {
        self.latency
    }

    #[must_use]
    pub const fn highest_block(&self) -> Option<u64> {
        self.highest_block
    }

    /// Drops signal history and latency. Settled ids are kept so a late
    /// repeat from the previous mode cannot count again.
    pub fn clear(&mut self) {
        self.recent.clear();
        self.first_seen.clear();
        self.latency = LatencyStats::default();
        self.highest_block = None;
    }
}
