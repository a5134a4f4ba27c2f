//! Running confidence score that gates promotion from SIM to LIVE.
//!
//! Each terminal outcome nudges the score: confirmations raise it by a
//! bounded step, failures lower it by a smaller one. On top of that the score
//! can never exceed a ceiling derived from the Wilson lower bound of the
//! recent success ratio, with the sample padded to `min_samples` by counting
//! missing outcomes as failures. A short run of wins therefore cannot push
//! the score past the gate; only a sustained, large majority of successes can.

use arb_engine_core::{ConfidenceConfig, Outcome};
use arb_engine_core::validation::wilson_lower;
use std::collections::VecDeque;

pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct ConfidenceAccumulator {
    config: ConfidenceConfig,
    window: VecDeque<Outcome>,
    score: f64,
}

impl ConfidenceAccumulator {
    #[must_use]
    pub fn new(config: ConfidenceConfig) -> Self {
        let capacity = config.window.max(1);
        Self {
            config,
            window: VecDeque::with_capacity(capacity),
            score: 0.0,
        }
    }

    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Outcomes currently in the rolling window.
    #[must_use]
    pub fn sample_size(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub fn successes(&self) -> usize {
        self.window.iter().filter(|o| **o == Outcome::Success).count()
    }

    /// Highest score the current window supports.
    #[must_use]
    pub fn ceiling(&self) -> f64 {
        let n = self.window.len().max(self.config.min_samples).max(1);
        MAX_SCORE * wilson_lower(self.successes(), n, self.config.wilson_z)
    }

    /// Applies one terminal outcome and returns the new score.
    pub fn record(&mut self, outcome: Outcome) -> f64 {
        if self.window.len() >= self.config.window.max(1) {
            self.window.pop_front();
        }
        self.window.push_back(outcome);

        let ceiling = self.ceiling();
        let next = match outcome {
            Outcome::Success => self.score + self.config.confirm_step,
            Outcome::Failure => self.score - self.config.fail_step,
        };
        self.score = next.min(ceiling).clamp(0.0, MAX_SCORE);

        tracing::trace!(
            "Confidence {:?}: score={:.2} ceiling={:.2} window={}/{}",
            outcome,
            self.score,
            ceiling,
            self.successes(),
            self.window.len()
        );
        self.score
    }

    /// Back to zero with an empty window.
    pub fn reset(&mut self) {
        self.window.clear();
        self.score = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const GATE: f64 = 85.0;

    fn accumulator() -> ConfidenceAccumulator {
        ConfidenceAccumulator::new(ConfidenceConfig::default())
    }

    fn feed(acc: &mut ConfidenceAccumulator, outcomes: impl IntoIterator<Item = Outcome>) -> f64 {
        let mut score = acc.score();
        for outcome in outcomes {
            score = acc.record(outcome);
        }
        score
    }

    #[test]
    fn starts_at_zero() {
        let acc = accumulator();
        assert!(acc.score().abs() < f64::EPSILON);
        assert_eq!(acc.sample_size(), 0);
    }

    #[test]
    fn short_winning_burst_stays_below_gate() {
        let mut acc = accumulator();
        let score = feed(&mut acc, std::iter::repeat(Outcome::Success).take(16));
        assert!(score < GATE, "score was {score}");
    }

    #[test]
    fn sustained_success_crosses_gate() {
        let mut acc = accumulator();
        let score = feed(&mut acc, std::iter::repeat(Outcome::Success).take(17));
        assert!(score >= GATE, "score was {score}");
    }

    #[test]
    fn failure_costs_less_than_success_gains() {
        let mut acc = accumulator();
        feed(&mut acc, std::iter::repeat(Outcome::Success).take(12));
        let before = acc.score();
        let after = acc.record(Outcome::Failure);
        let drop = before - after;
        assert!(drop > 0.0);
        assert!(drop <= ConfidenceConfig::default().confirm_step, "drop was {drop}");
    }

    #[test]
    fn confirmations_never_lower_the_score() {
        let mut acc = accumulator();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let outcome = if rng.gen_bool(0.7) {
                Outcome::Success
            } else {
                Outcome::Failure
            };
            let before = acc.score();
            let after = acc.record(outcome);
            if outcome == Outcome::Success {
                assert!(after >= before, "{before} -> {after}");
            }
        }
    }

    #[test]
    fn alternating_outcomes_never_reach_gate() {
        let mut acc = accumulator();
        for i in 0..200 {
            let outcome = if i % 2 == 0 {
                Outcome::Success
            } else {
                Outcome::Failure
            };
            assert!(acc.record(outcome) < GATE);
        }
    }

    #[test]
    fn gate_requires_majority_of_recent_successes() {
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let rate = rng.gen_range(0.3..1.0);
            let mut acc = accumulator();
            for _ in 0..300 {
                let outcome = if rng.gen_bool(rate) {
                    Outcome::Success
                } else {
                    Outcome::Failure
                };
                let score = acc.record(outcome);
                assert!((0.0..=MAX_SCORE).contains(&score));
                if score >= GATE {
                    assert!(acc.sample_size() >= ConfidenceConfig::default().min_samples);
                    assert!(
                        acc.successes() * 2 > acc.sample_size(),
                        "seed {seed}: {} of {}",
                        acc.successes(),
                        acc.sample_size()
                    );
                }
            }
        }
    }

    #[test]
    fn reset_clears_score_and_window() {
        let mut acc = accumulator();
        feed(&mut acc, std::iter::repeat(Outcome::Success).take(20));
        acc.reset();
        assert!(acc.score().abs() < f64::EPSILON);
        assert_eq!(acc.sample_size(), 0);
    }

    #[test]
    fn window_is_bounded() {
        let mut acc = accumulator();
        feed(&mut acc, std::iter::repeat(Outcome::Failure).take(100));
        assert_eq!(acc.sample_size(), ConfidenceConfig::default().window);
        assert!(acc.score().abs() < f64::EPSILON);
    }
}
