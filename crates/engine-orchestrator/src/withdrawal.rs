//! Threshold-triggered and operator-requested withdrawal scheduling, and the
//! in-memory ledger.

use arb_engine_core::{
    ConfigError, WithdrawalConfig, WithdrawalConfigUpdate, WithdrawalHistoryEntry,
    WithdrawalKind, WithdrawalRequest, WithdrawalStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("unknown withdrawal {0}")]
    UnknownWithdrawal(Uuid),

    #[error("withdrawal {id} already resolved as {status:?}")]
    AlreadyResolved { id: Uuid, status: WithdrawalStatus },
}

/// Why an operator-requested withdrawal was refused. Nothing is scheduled and
/// the balance is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum WithdrawalRefused {
    #[error("no wallet address configured")]
    NoDestination,

    #[error("withdrawal amount must be positive (got {amount})")]
    InvalidAmount { amount: Decimal },

    #[error("emergency percentage must be within (0, 100] (got {percentage})")]
    InvalidPercentage { percentage: Decimal },

    #[error("amount {amount} is below the minimum withdrawal {minimum}")]
    BelowMinimum { amount: Decimal, minimum: Decimal },

    #[error("amount {amount} exceeds the smart balance {available}")]
    InsufficientBalance { amount: Decimal, available: Decimal },

    #[error("amount {amount} exceeds what is left of today's limit ({remaining})")]
    DailyLimitReached { amount: Decimal, remaining: Decimal },
}

/// Operator-initiated withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ManualWithdrawal {
    /// Fixed amount, held to the minimum and the daily limit.
    Amount { amount: Decimal },
    /// Share of the current balance, in percent. Ignores the minimum and the
    /// daily limit but still counts toward today's total.
    Emergency { percentage: Decimal },
}

/// Result of executing a scheduled transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TransferResult {
    Completed { tx_hash: String },
    Failed { reason: String },
}

impl TransferResult {
    #[must_use]
    pub const fn status(&self) -> WithdrawalStatus {
        match self {
            Self::Completed { .. } => WithdrawalStatus::Completed,
            Self::Failed { .. } => WithdrawalStatus::Failed,
        }
    }
}

/// Withdrawal entries in trigger order. Each entry is resolved at most once.
#[derive(Debug, Clone, Default)]
pub struct WithdrawalLedger {
    entries: Vec<WithdrawalHistoryEntry>,
}

impl WithdrawalLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_pending(
        &mut self,
        id: Uuid,
        amount: Decimal,
        timestamp: DateTime<Utc>,
        kind: WithdrawalKind,
    ) {
        self.entries.push(WithdrawalHistoryEntry {
            id,
            amount,
            timestamp,
            status: WithdrawalStatus::Pending,
            tx_hash: None,
            kind,
        });
    }

    /// Moves a pending entry to its final status.
    ///
    /// # Errors
    /// [`LedgerError::UnknownWithdrawal`] for an id never appended,
    /// [`LedgerError::AlreadyResolved`] when the entry is no longer pending.
    pub fn resolve(
        &mut self,
        id: Uuid,
        result: &TransferResult,
    ) -> Result<&WithdrawalHistoryEntry, LedgerError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(LedgerError::UnknownWithdrawal(id))?;

        if entry.status != WithdrawalStatus::Pending {
            return Err(LedgerError::AlreadyResolved {
                id,
                status: entry.status,
            });
        }

        entry.status = result.status();
        if let TransferResult::Completed { tx_hash } = result {
            entry.tx_hash = Some(tx_hash.clone());
        }
        Ok(entry)
    }

    #[must_use]
    pub fn entries(&self) -> &[WithdrawalHistoryEntry] {
        &self.entries
    }

    /// Newest `n` entries, newest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<WithdrawalHistoryEntry> {
        self.entries.iter().rev().take(n).cloned().collect()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == WithdrawalStatus::Pending)
            .count()
    }

    #[must_use]
    pub fn completed_total(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.status == WithdrawalStatus::Completed)
            .map(|e| e.amount)
            .sum()
    }

    /// Pending and completed amounts triggered on `day` (UTC).
    #[must_use]
    pub fn committed_on(&self, day: NaiveDate) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.status != WithdrawalStatus::Failed && e.timestamp.date_naive() == day)
            .map(|e| e.amount)
            .sum()
    }

    /// Replaces the ledger with entries loaded from storage.
    pub fn restore(&mut self, entries: Vec<WithdrawalHistoryEntry>) {
        self.entries = entries;
    }
}

/// A triggered withdrawal waiting for its transfer delay to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledWithdrawal {
    pub request: WithdrawalRequest,
    pub delay: Duration,
    pub kind: WithdrawalKind,
}

/// Owns the withdrawal configuration, the smart balance it guards and the
/// ledger of triggered withdrawals.
#[derive(Debug)]
pub struct WithdrawalScheduler {
    config: WithdrawalConfig,
    ledger: WithdrawalLedger,
    rng: ChaCha8Rng,
    last_trigger: Option<DateTime<Utc>>,
    emergency_raised: bool,
}

impl WithdrawalScheduler {
    /// `seed` fixes the delay jitter; `None` seeds from the OS.
    #[must_use]
    pub fn new(config: WithdrawalConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            config,
            ledger: WithdrawalLedger::new(),
            rng,
            last_trigger: None,
            emergency_raised: false,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &WithdrawalConfig {
        &self.config
    }

    #[must_use]
    pub const fn ledger(&self) -> &WithdrawalLedger {
        &self.ledger
    }

    /// Validates and applies an operator update. Balances are untouched.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] from validation; the previous
    /// configuration stays in place.
    pub fn update_config(
        &mut self,
        update: &WithdrawalConfigUpdate,
    ) -> Result<&WithdrawalConfig, ConfigError> {
        self.config = self.config.apply(update)?;
        tracing::info!(
            "Withdrawal config updated: enabled={} threshold={} max_delay={}m cooldown={}m min={} daily_limit={} emergency={}",
            self.config.is_enabled,
            self.config.threshold_amount,
            self.config.max_transfer_minutes,
            self.config.cooldown_minutes,
            self.config.min_withdrawal_amount,
            self.config.daily_limit,
            self.config.emergency_threshold
        );
        Ok(&self.config)
    }

    /// Adds realised profit to the smart balance. Non-positive amounts are ignored.
    pub fn credit(&mut self, amount: Decimal) {
        if amount > Decimal::ZERO {
            self.config.smart_balance += amount;
        }
    }

    /// Manual correction of the smart balance, floored at zero.
    pub fn adjust_balance(&mut self, delta: Decimal) -> Decimal {
        let next = self.config.smart_balance + delta;
        self.config.smart_balance = next.max(Decimal::ZERO);
        self.config.smart_balance
    }

    fn cooling_down(&self, now: DateTime<Utc>) -> bool {
        if self.config.cooldown_minutes == 0 {
            return false;
        }
        self.last_trigger.is_some_and(|last| {
            now < last + chrono::Duration::minutes(i64::from(self.config.cooldown_minutes))
        })
    }

    fn refresh_daily(&mut self, now: DateTime<Utc>) {
        self.config.daily_withdrawn = self.ledger.committed_on(now.date_naive());
    }

    /// Returns the balance once each time it rises above the emergency
    /// threshold. Falling back to or below the threshold re-arms the alert.
    pub fn emergency_alert(&mut self) -> Option<Decimal> {
        if !self.config.above_emergency_threshold() {
            self.emergency_raised = false;
            return None;
        }
        if self.emergency_raised {
            return None;
        }
        self.emergency_raised = true;
        Some(self.config.smart_balance)
    }

    /// One evaluation tick.
    ///
    /// When the threshold is crossed and no cooldown is active, the balance
    /// is captured in the same step, a pending ledger entry is appended and
    /// the transfer is scheduled after a random delay in
    /// `[0, max_transfer_minutes]`. Without a daily limit the whole balance
    /// is captured; with one, only what is left of today's allowance, and
    /// the rest stays in the balance. Nothing triggers when the captured
    /// amount would fall below the minimum withdrawal.
    pub fn evaluate(&mut self, now: DateTime<Utc>) -> Option<ScheduledWithdrawal> {
        self.refresh_daily(now);
        if !self.config.threshold_crossed() {
            return None;
        }
        if self.cooling_down(now) {
            tracing::debug!(
                "Withdrawal threshold crossed but cooldown active (balance {})",
                self.config.smart_balance
            );
            return None;
        }

        let balance = self.config.smart_balance;
        let amount = self
            .config
            .daily_remaining()
            .map_or(balance, |remaining| balance.min(remaining));
        if amount.is_zero() {
            tracing::debug!(
                "Withdrawal threshold crossed but the daily limit {} is used up",
                self.config.daily_limit
            );
            return None;
        }
        if amount < self.config.min_withdrawal_amount {
            tracing::debug!(
                "Withdrawal of {} skipped: below the minimum {}",
                amount,
                self.config.min_withdrawal_amount
            );
            return None;
        }

        let max_secs = u64::from(self.config.max_transfer_minutes) * 60;
        let delay = Duration::from_secs(self.rng.gen_range(0..=max_secs));
        Some(self.schedule(amount, WithdrawalKind::Automatic, delay, now))
    }

    /// Schedules an operator-requested withdrawal for immediate transfer.
    ///
    /// Threshold, cooldown and the enabled flag do not apply. The trigger
    /// still starts a new cooldown for automatic withdrawals.
    ///
    /// # Errors
    /// Returns [`WithdrawalRefused`] when there is no destination, the amount
    /// or percentage is out of range, the balance cannot cover it, or (for a
    /// fixed amount) the minimum or daily limit forbids it.
    pub fn request_manual(
        &mut self,
        request: ManualWithdrawal,
        now: DateTime<Utc>,
    ) -> Result<ScheduledWithdrawal, WithdrawalRefused> {
        if self.config.wallet_address.is_empty() {
            return Err(WithdrawalRefused::NoDestination);
        }
        self.refresh_daily(now);

        let available = self.config.smart_balance;
        let (amount, kind) = match request {
            ManualWithdrawal::Amount { amount } => {
                if amount <= Decimal::ZERO {
                    return Err(WithdrawalRefused::InvalidAmount { amount });
                }
                (amount, WithdrawalKind::Manual)
            }
            ManualWithdrawal::Emergency { percentage } => {
                if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
                    return Err(WithdrawalRefused::InvalidPercentage { percentage });
                }
                (
                    available * percentage / Decimal::ONE_HUNDRED,
                    WithdrawalKind::Emergency,
                )
            }
        };

        if amount.is_zero() || amount > available {
            return Err(WithdrawalRefused::InsufficientBalance { amount, available });
        }

        if kind == WithdrawalKind::Manual {
            let minimum = self.config.min_withdrawal_amount;
            if amount < minimum {
                return Err(WithdrawalRefused::BelowMinimum { amount, minimum });
            }
            if let Some(remaining) = self.config.daily_remaining() {
                if amount > remaining {
                    return Err(WithdrawalRefused::DailyLimitReached { amount, remaining });
                }
            }
        } else {
            tracing::warn!(
                "Emergency withdrawal of {}% ({} of {}) requested",
                percentage_of(amount, available),
                amount,
                available
            );
        }

        Ok(self.schedule(amount, kind, Duration::ZERO, now))
    }

    fn schedule(
        &mut self,
        amount: Decimal,
        kind: WithdrawalKind,
        delay: Duration,
        now: DateTime<Utc>,
    ) -> ScheduledWithdrawal {
        self.config.smart_balance -= amount;

        let scheduled_at = now
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

        let id = Uuid::new_v4();
        self.ledger.append_pending(id, amount, now, kind);
        self.last_trigger = Some(now);
        self.config.daily_withdrawn += amount;
        self.config.next_scheduled_transfer = Some(scheduled_at);

        tracing::info!(
            "{} withdrawal {} of {} scheduled for {} (in {}s)",
            kind.as_str(),
            id,
            amount,
            scheduled_at,
            delay.as_secs()
        );

        ScheduledWithdrawal {
            request: WithdrawalRequest {
                id,
                amount,
                destination_address: self.config.wallet_address.clone(),
                scheduled_at,
            },
            delay,
            kind,
        }
    }

    /// Records a transfer result. Only a completed transfer counts toward
    /// `total_withdrawn`; a failed one leaves the balance as it is and frees
    /// its share of the daily limit.
    ///
    /// # Errors
    /// Propagates [`LedgerError`] for unknown or already resolved ids.
    pub fn resolve(
        &mut self,
        id: Uuid,
        result: &TransferResult,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalHistoryEntry, LedgerError> {
        let entry = self.ledger.resolve(id, result)?.clone();

        if entry.status == WithdrawalStatus::Completed {
            self.config.total_withdrawn += entry.amount;
            self.config.last_withdrawal = Some(now);
        }
        if self.ledger.pending_count() == 0 {
            self.config.next_scheduled_transfer = None;
        }
        self.refresh_daily(now);
        Ok(entry)
    }

    /// Loads ledger entries from storage and recomputes `total_withdrawn`
    /// and the daily total as of `now`.
    pub fn restore(&mut self, entries: Vec<WithdrawalHistoryEntry>, now: DateTime<Utc>) {
        self.ledger.restore(entries);
        self.config.total_withdrawn = self.ledger.completed_total();
        self.last_trigger = self.ledger.entries().iter().map(|e| e.timestamp).max();
        self.refresh_daily(now);
    }
}

fn percentage_of(amount: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    (amount * Decimal::ONE_HUNDRED / total).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ADDRESS: &str = "0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b6";

    fn scheduler(threshold: &str, max_minutes: u32) -> WithdrawalScheduler {
        let mut scheduler = WithdrawalScheduler::new(WithdrawalConfig::default(), Some(42));
        scheduler
            .update_config(&WithdrawalConfigUpdate {
                is_enabled: Some(true),
                wallet_address: Some(ADDRESS.to_string()),
                threshold_amount: Some(threshold.to_string()),
                max_transfer_minutes: Some(max_minutes),
                ..Default::default()
            })
            .unwrap();
        scheduler
    }

    #[test]
    fn balance_crossing_threshold_over_three_ticks_withdraws_once() {
        let mut scheduler = scheduler("0.5", 15);
        let now = Utc::now();

        scheduler.credit(dec!(0.1));
        assert!(scheduler.evaluate(now).is_none());
        scheduler.credit(dec!(0.2));
        assert!(scheduler.evaluate(now).is_none());
        scheduler.credit(dec!(0.3));
        let scheduled = scheduler.evaluate(now).expect("threshold crossed");

        assert_eq!(scheduled.request.amount, dec!(0.6));
        assert_eq!(scheduled.request.destination_address, ADDRESS);
        assert_eq!(scheduler.config().smart_balance, Decimal::ZERO);
        assert_eq!(scheduler.ledger().entries().len(), 1);
        assert_eq!(scheduler.ledger().entries()[0].status, WithdrawalStatus::Pending);
    }

    #[test]
    fn one_crossing_yields_one_pending_entry() {
        let mut scheduler = scheduler("0.5", 15);
        let now = Utc::now();
        scheduler.credit(dec!(1));

        assert!(scheduler.evaluate(now).is_some());
        for _ in 0..10 {
            assert!(scheduler.evaluate(now).is_none());
        }
        assert_eq!(scheduler.ledger().pending_count(), 1);
    }

    #[test]
    fn balance_equal_to_threshold_does_not_trigger() {
        let mut scheduler = scheduler("0.5", 15);
        scheduler.credit(dec!(0.5));
        assert!(scheduler.evaluate(Utc::now()).is_none());
    }

    #[test]
    fn zero_threshold_never_triggers() {
        let mut scheduler = scheduler("0", 15);
        scheduler.credit(dec!(100));
        assert!(scheduler.evaluate(Utc::now()).is_none());
        assert_eq!(scheduler.config().smart_balance, dec!(100));
    }

    #[test]
    fn delay_stays_within_configured_window() {
        let mut scheduler = scheduler("0.5", 3);
        let now = Utc::now();
        for _ in 0..50 {
            scheduler.credit(dec!(1));
            let scheduled = scheduler.evaluate(now).unwrap();
            assert!(scheduled.delay <= Duration::from_secs(180));
            assert!(scheduled.request.scheduled_at >= now);
        }
    }

    #[test]
    fn zero_max_delay_schedules_immediately() {
        let mut scheduler = scheduler("0.5", 0);
        scheduler.credit(dec!(1));
        let scheduled = scheduler.evaluate(Utc::now()).unwrap();
        assert_eq!(scheduled.delay, Duration::ZERO);
    }

    #[test]
    fn cooldown_suppresses_retrigger() {
        let mut scheduler = scheduler("0.5", 0);
        scheduler
            .update_config(&WithdrawalConfigUpdate {
                cooldown_minutes: Some(10),
                ..Default::default()
            })
            .unwrap();
        let now = Utc::now();

        scheduler.credit(dec!(1));
        assert!(scheduler.evaluate(now).is_some());

        scheduler.credit(dec!(1));
        assert!(scheduler.evaluate(now + chrono::Duration::minutes(5)).is_none());
        assert_eq!(scheduler.config().smart_balance, dec!(1));
        assert!(scheduler.evaluate(now + chrono::Duration::minutes(10)).is_some());
    }

    #[test]
    fn only_completed_transfers_count_toward_total() {
        let mut scheduler = scheduler("0.5", 0);
        let now = Utc::now();

        scheduler.credit(dec!(1));
        let first = scheduler.evaluate(now).unwrap();
        scheduler.credit(dec!(2));
        let second = scheduler.evaluate(now).unwrap();

        scheduler
            .resolve(
                first.request.id,
                &TransferResult::Completed {
                    tx_hash: "0xabc".to_string(),
                },
                now,
            )
            .unwrap();
        let failed = scheduler
            .resolve(
                second.request.id,
                &TransferResult::Failed {
                    reason: "reverted".to_string(),
                },
                now,
            )
            .unwrap();

        assert_eq!(failed.status, WithdrawalStatus::Failed);
        assert_eq!(failed.tx_hash, None);
        assert_eq!(scheduler.config().total_withdrawn, dec!(1));
        assert_eq!(scheduler.config().total_withdrawn, scheduler.ledger().completed_total());
        assert_eq!(scheduler.config().smart_balance, Decimal::ZERO);
        assert!(scheduler.config().next_scheduled_transfer.is_none());
        assert_eq!(scheduler.config().last_withdrawal, Some(now));
    }

    #[test]
    fn resolved_entry_cannot_be_resolved_again() {
        let mut scheduler = scheduler("0.5", 0);
        let now = Utc::now();
        scheduler.credit(dec!(1));
        let id = scheduler.evaluate(now).unwrap().request.id;

        let done = TransferResult::Completed {
            tx_hash: "0xabc".to_string(),
        };
        scheduler.resolve(id, &done, now).unwrap();
        let err = scheduler
            .resolve(
                id,
                &TransferResult::Failed {
                    reason: "late".to_string(),
                },
                now,
            )
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::AlreadyResolved {
                id,
                status: WithdrawalStatus::Completed
            }
        );
        assert_eq!(scheduler.config().total_withdrawn, dec!(1));
        assert_eq!(scheduler.ledger().entries()[0].tx_hash.as_deref(), Some("0xabc"));
    }

    #[test]
    fn unknown_id_is_rejected() {
        let mut scheduler = scheduler("0.5", 0);
        let id = Uuid::new_v4();
        let err = scheduler
            .resolve(
                id,
                &TransferResult::Failed {
                    reason: "x".to_string(),
                },
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::UnknownWithdrawal(id));
    }

    #[test]
    fn adjust_balance_floors_at_zero() {
        let mut scheduler = scheduler("0.5", 0);
        scheduler.credit(dec!(0.2));
        assert_eq!(scheduler.adjust_balance(dec!(-1)), Decimal::ZERO);
        assert_eq!(scheduler.adjust_balance(dec!(0.3)), dec!(0.3));
    }

    #[test]
    fn rejected_update_keeps_previous_config() {
        let mut scheduler = scheduler("0.5", 15);
        let before = scheduler.config().clone();
        let err = scheduler
            .update_config(&WithdrawalConfigUpdate {
                wallet_address: Some("0x123".to_string()),
                threshold_amount: Some("2".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress(_)));
        assert_eq!(scheduler.config(), &before);
    }

    #[test]
    fn restore_recomputes_total_from_completed_entries() {
        let mut scheduler = scheduler("0.5", 0);
        let now = Utc::now();
        let entry = |amount, status, timestamp| WithdrawalHistoryEntry {
            id: Uuid::new_v4(),
            amount,
            timestamp,
            status,
            tx_hash: None,
            kind: WithdrawalKind::Automatic,
        };
        let yesterday = now - chrono::Duration::days(1);
        scheduler.restore(
            vec![
                entry(dec!(4), WithdrawalStatus::Completed, yesterday),
                entry(dec!(1.5), WithdrawalStatus::Completed, now),
                entry(dec!(2), WithdrawalStatus::Failed, now),
                entry(dec!(0.5), WithdrawalStatus::Pending, now),
            ],
            now,
        );
        assert_eq!(scheduler.config().total_withdrawn, dec!(5.5));
        assert_eq!(scheduler.config().daily_withdrawn, dec!(2));
        assert_eq!(scheduler.ledger().recent(1)[0].amount, dec!(0.5));
    }

    fn limited(update: WithdrawalConfigUpdate) -> WithdrawalScheduler {
        let mut scheduler = scheduler("0.5", 0);
        scheduler.update_config(&update).unwrap();
        scheduler
    }

    #[test]
    fn daily_limit_caps_the_capture_and_leaves_the_rest() {
        let mut scheduler = limited(WithdrawalConfigUpdate {
            daily_limit: Some("3".to_string()),
            ..Default::default()
        });
        let now = Utc::now();

        scheduler.credit(dec!(2));
        assert_eq!(scheduler.evaluate(now).unwrap().request.amount, dec!(2));

        scheduler.credit(dec!(5));
        let capped = scheduler.evaluate(now).unwrap();
        assert_eq!(capped.request.amount, dec!(1));
        assert_eq!(scheduler.config().smart_balance, dec!(4));
        assert_eq!(scheduler.config().daily_withdrawn, dec!(3));

        assert!(scheduler.evaluate(now).is_none());
        assert_eq!(scheduler.config().smart_balance, dec!(4));
    }

    #[test]
    fn daily_total_resets_on_a_new_utc_day() {
        let mut scheduler = limited(WithdrawalConfigUpdate {
            daily_limit: Some("1".to_string()),
            ..Default::default()
        });
        let now = Utc::now();

        scheduler.credit(dec!(3));
        assert!(scheduler.evaluate(now).is_some());
        assert!(scheduler.evaluate(now).is_none());

        let tomorrow = now + chrono::Duration::days(1);
        let next = scheduler.evaluate(tomorrow).unwrap();
        assert_eq!(next.request.amount, dec!(1));
        assert_eq!(scheduler.config().daily_withdrawn, dec!(1));
    }

    #[test]
    fn failed_transfer_frees_its_share_of_the_daily_limit() {
        let mut scheduler = limited(WithdrawalConfigUpdate {
            daily_limit: Some("2".to_string()),
            ..Default::default()
        });
        let now = Utc::now();

        scheduler.credit(dec!(2));
        let id = scheduler.evaluate(now).unwrap().request.id;
        assert_eq!(scheduler.config().daily_remaining(), Some(Decimal::ZERO));

        scheduler
            .resolve(
                id,
                &TransferResult::Failed {
                    reason: "reverted".to_string(),
                },
                now,
            )
            .unwrap();
        assert_eq!(scheduler.config().daily_withdrawn, Decimal::ZERO);
        assert_eq!(scheduler.config().daily_remaining(), Some(dec!(2)));
    }

    #[test]
    fn capture_below_minimum_waits_for_more_balance() {
        let mut scheduler = limited(WithdrawalConfigUpdate {
            min_withdrawal_amount: Some("2".to_string()),
            ..Default::default()
        });
        let now = Utc::now();

        scheduler.credit(dec!(1));
        assert!(scheduler.evaluate(now).is_none());
        assert_eq!(scheduler.config().smart_balance, dec!(1));

        scheduler.credit(dec!(1.5));
        assert_eq!(scheduler.evaluate(now).unwrap().request.amount, dec!(2.5));
    }

    #[test]
    fn emergency_alert_fires_once_per_crossing() {
        let mut scheduler = limited(WithdrawalConfigUpdate {
            is_enabled: Some(false),
            emergency_threshold: Some("10".to_string()),
            ..Default::default()
        });

        scheduler.credit(dec!(10));
        assert_eq!(scheduler.emergency_alert(), None);

        scheduler.credit(dec!(1));
        assert_eq!(scheduler.emergency_alert(), Some(dec!(11)));
        scheduler.credit(dec!(5));
        assert_eq!(scheduler.emergency_alert(), None);

        scheduler.adjust_balance(dec!(-10));
        assert_eq!(scheduler.emergency_alert(), None);
        scheduler.credit(dec!(20));
        assert_eq!(scheduler.emergency_alert(), Some(dec!(26)));
    }

    #[test]
    fn manual_withdrawal_bypasses_threshold_and_cooldown() {
        let mut scheduler = limited(WithdrawalConfigUpdate {
            threshold_amount: Some("100".to_string()),
            cooldown_minutes: Some(60),
            ..Default::default()
        });
        let now = Utc::now();
        scheduler.credit(dec!(3));

        let first = scheduler
            .request_manual(ManualWithdrawal::Amount { amount: dec!(1) }, now)
            .unwrap();
        let second = scheduler
            .request_manual(ManualWithdrawal::Amount { amount: dec!(1) }, now)
            .unwrap();

        assert_eq!(first.kind, WithdrawalKind::Manual);
        assert_eq!(first.delay, Duration::ZERO);
        assert_eq!(second.request.destination_address, ADDRESS);
        assert_eq!(scheduler.config().smart_balance, dec!(1));
        assert_eq!(scheduler.ledger().pending_count(), 2);
        assert_eq!(scheduler.ledger().entries()[0].kind, WithdrawalKind::Manual);
    }

    #[test]
    fn manual_withdrawal_refusals_leave_the_balance() {
        let mut scheduler = limited(WithdrawalConfigUpdate {
            min_withdrawal_amount: Some("0.5".to_string()),
            daily_limit: Some("2".to_string()),
            ..Default::default()
        });
        let now = Utc::now();
        scheduler.credit(dec!(5));

        let refusals = [
            (
                dec!(0),
                WithdrawalRefused::InvalidAmount { amount: dec!(0) },
            ),
            (
                dec!(0.2),
                WithdrawalRefused::BelowMinimum {
                    amount: dec!(0.2),
                    minimum: dec!(0.5),
                },
            ),
            (
                dec!(6),
                WithdrawalRefused::InsufficientBalance {
                    amount: dec!(6),
                    available: dec!(5),
                },
            ),
            (
                dec!(3),
                WithdrawalRefused::DailyLimitReached {
                    amount: dec!(3),
                    remaining: dec!(2),
                },
            ),
        ];
        for (amount, expected) in refusals {
            let err = scheduler
                .request_manual(ManualWithdrawal::Amount { amount }, now)
                .unwrap_err();
            assert_eq!(err, expected);
        }

        assert_eq!(scheduler.config().smart_balance, dec!(5));
        assert!(scheduler.ledger().entries().is_empty());
    }

    #[test]
    fn manual_withdrawal_needs_a_destination() {
        let mut scheduler = WithdrawalScheduler::new(WithdrawalConfig::default(), Some(1));
        scheduler.credit(dec!(1));
        let err = scheduler
            .request_manual(ManualWithdrawal::Amount { amount: dec!(1) }, Utc::now())
            .unwrap_err();
        assert_eq!(err, WithdrawalRefused::NoDestination);
    }

    #[test]
    fn emergency_withdrawal_takes_a_share_past_the_daily_limit() {
        let mut scheduler = limited(WithdrawalConfigUpdate {
            is_enabled: Some(false),
            min_withdrawal_amount: Some("1".to_string()),
            daily_limit: Some("1".to_string()),
            ..Default::default()
        });
        let now = Utc::now();
        scheduler.credit(dec!(8));

        let scheduled = scheduler
            .request_manual(
                ManualWithdrawal::Emergency {
                    percentage: dec!(75),
                },
                now,
            )
            .unwrap();

        assert_eq!(scheduled.kind, WithdrawalKind::Emergency);
        assert_eq!(scheduled.request.amount, dec!(6));
        assert_eq!(scheduler.config().smart_balance, dec!(2));
        assert_eq!(scheduler.config().daily_withdrawn, dec!(6));

        for percentage in [dec!(0), dec!(-5), dec!(100.5)] {
            assert_eq!(
                scheduler
                    .request_manual(ManualWithdrawal::Emergency { percentage }, now)
                    .unwrap_err(),
                WithdrawalRefused::InvalidPercentage { percentage }
            );
        }
    }

    #[test]
    fn emergency_withdrawal_of_an_empty_balance_is_refused() {
        let mut scheduler = scheduler("0.5", 0);
        let err = scheduler
            .request_manual(
                ManualWithdrawal::Emergency {
                    percentage: dec!(100),
                },
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            WithdrawalRefused::InsufficientBalance {
                amount: Decimal::ZERO,
                available: Decimal::ZERO
            }
        );
    }

    #[test]
    fn manual_withdrawal_starts_the_automatic_cooldown() {
        let mut scheduler = limited(WithdrawalConfigUpdate {
            cooldown_minutes: Some(10),
            ..Default::default()
        });
        let now = Utc::now();
        scheduler.credit(dec!(2));
        scheduler
            .request_manual(ManualWithdrawal::Amount { amount: dec!(1) }, now)
            .unwrap();

        assert!(scheduler.evaluate(now + chrono::Duration::minutes(5)).is_none());
        assert!(scheduler.evaluate(now + chrono::Duration::minutes(10)).is_some());
    }
}
