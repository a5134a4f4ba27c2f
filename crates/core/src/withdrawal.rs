//! Withdrawal configuration, requests, and audit records.

use crate::validation::is_valid_wallet_address;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Rejected configuration change. The previous configuration stays active.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid wallet address {0:?}: expected 0x followed by 40 hex characters")]
    InvalidAddress(String),

    #[error("cannot enable withdrawals without a wallet address")]
    MissingAddress,

    #[error("{field} {value:?} is not a number")]
    InvalidAmount { field: &'static str, value: String },

    #[error("{field} must not be negative (got {value})")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("minimum withdrawal {minimum} exceeds the daily limit {limit}")]
    MinimumAboveDailyLimit { minimum: Decimal, limit: Decimal },
}

/// Auto-withdrawal settings plus the balance counters they act on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WithdrawalConfig {
    pub is_enabled: bool,
    pub wallet_address: String,
    pub threshold_amount: Decimal,
    /// Upper bound of the random transfer delay, in minutes.
    pub max_transfer_minutes: u32,
    /// Minimum gap between two triggers, in minutes. Zero disables the gap.
    #[serde(default)]
    pub cooldown_minutes: u32,
    /// Smallest amount a withdrawal may move. Zero means no minimum.
    #[serde(default)]
    pub min_withdrawal_amount: Decimal,
    /// Most that may be committed per UTC day. Zero means unlimited.
    #[serde(default)]
    pub daily_limit: Decimal,
    /// Balance above which an alert is raised. Zero disables the alert.
    #[serde(default)]
    pub emergency_threshold: Decimal,

    /// Accumulated, not yet withdrawn profit.
    pub smart_balance: Decimal,
    pub last_withdrawal: Option<DateTime<Utc>>,
    /// Sum of completed withdrawals only.
    pub total_withdrawn: Decimal,
    pub next_scheduled_transfer: Option<DateTime<Utc>>,
    /// Pending and completed withdrawals triggered today (UTC).
    #[serde(default)]
    pub daily_withdrawn: Decimal,
}

impl WithdrawalConfig {
    /// Validates `update` against this configuration and returns the result.
    ///
    /// The change is all-or-nothing: on error nothing from `update` applies.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for a malformed address, a non-numeric or
    /// negative amount, a minimum above the daily limit, or an attempt to
    /// enable without a valid address.
    pub fn apply(&self, update: &WithdrawalConfigUpdate) -> Result<Self, ConfigError> {
        let mut next = self.clone();

        if let Some(address) = &update.wallet_address {
            let address = address.trim();
            if !address.is_empty() && !is_valid_wallet_address(address) {
                return Err(ConfigError::InvalidAddress(address.to_string()));
            }
            next.wallet_address = address.to_string();
        }

        if let Some(raw) = &update.threshold_amount {
            next.threshold_amount = parse_amount("threshold_amount", raw)?;
        }
        if let Some(raw) = &update.min_withdrawal_amount {
            next.min_withdrawal_amount = parse_amount("min_withdrawal_amount", raw)?;
        }
        if let Some(raw) = &update.daily_limit {
            next.daily_limit = parse_amount("daily_limit", raw)?;
        }
        if let Some(raw) = &update.emergency_threshold {
            next.emergency_threshold = parse_amount("emergency_threshold", raw)?;
        }
        if next.daily_limit > Decimal::ZERO && next.min_withdrawal_amount > next.daily_limit {
            return Err(ConfigError::MinimumAboveDailyLimit {
                minimum: next.min_withdrawal_amount,
                limit: next.daily_limit,
            });
        }

        if let Some(minutes) = update.max_transfer_minutes {
            next.max_transfer_minutes = minutes;
        }

        if let Some(minutes) = update.cooldown_minutes {
            next.cooldown_minutes = minutes;
        }

        if let Some(enabled) = update.is_enabled {
            next.is_enabled = enabled;
        }

        if next.is_enabled {
            if next.wallet_address.is_empty() {
                return Err(ConfigError::MissingAddress);
            }
            if !is_valid_wallet_address(&next.wallet_address) {
                return Err(ConfigError::InvalidAddress(next.wallet_address));
            }
        }

        Ok(next)
    }

    /// True when the trigger condition on balance and threshold holds.
    #[must_use]
    pub fn threshold_crossed(&self) -> bool {
        self.is_enabled
            && self.threshold_amount > Decimal::ZERO
            && self.smart_balance > self.threshold_amount
    }

    /// Amount still allowed today, or `None` when there is no daily limit.
    #[must_use]
    pub fn daily_remaining(&self) -> Option<Decimal> {
        (self.daily_limit > Decimal::ZERO)
            .then(|| (self.daily_limit - self.daily_withdrawn).max(Decimal::ZERO))
    }

    /// True when the balance sits above a configured emergency threshold.
    #[must_use]
    pub fn above_emergency_threshold(&self) -> bool {
        self.emergency_threshold > Decimal::ZERO && self.smart_balance > self.emergency_threshold
    }
}

/// Partial configuration change as submitted by an operator.
///
/// Amounts arrive as text so that non-numeric input is rejected here rather
/// than at the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalConfigUpdate {
    pub is_enabled: Option<bool>,
    pub wallet_address: Option<String>,
    pub threshold_amount: Option<String>,
    pub max_transfer_minutes: Option<u32>,
    pub cooldown_minutes: Option<u32>,
    #[serde(default)]
    pub min_withdrawal_amount: Option<String>,
    #[serde(default)]
    pub daily_limit: Option<String>,
    #[serde(default)]
    pub emergency_threshold: Option<String>,
}

fn parse_amount(field: &'static str, raw: &str) -> Result<Decimal, ConfigError> {
    let value = Decimal::from_str(raw.trim()).map_err(|_| ConfigError::InvalidAmount {
        field,
        value: raw.to_string(),
    })?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ConfigError::NegativeAmount { field, value });
    }
    Ok(value)
}

/// What started a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalKind {
    /// Balance crossed the threshold.
    #[default]
    Automatic,
    /// Operator asked for a fixed amount.
    Manual,
    /// Operator asked for a share of the balance, outside the daily limit.
    Emergency,
}

impl WithdrawalKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Manual => "manual",
            Self::Emergency => "emergency",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "automatic" => Some(Self::Automatic),
            "manual" => Some(Self::Manual),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    Pending,
    Completed,
    Failed,
}

impl WithdrawalStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One withdrawal in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalHistoryEntry {
    pub id: Uuid,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub status: WithdrawalStatus,
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub kind: WithdrawalKind,
}

/// Outbound transfer request handed to the execution collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub amount: Decimal,
    pub destination_address: String,
    pub scheduled_at: DateTime<Utc>,
}
