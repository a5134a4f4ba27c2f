use anyhow::{Context, Result};
use arb_engine_core::{WithdrawalHistoryEntry, WithdrawalKind, WithdrawalStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// `SQLite` audit log of withdrawal status events.
///
/// Every status change is a new row; rows are never updated or deleted.
/// The current state of an entry is its latest row.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

type EventRow = (String, String, String, Option<String>, i64, String);

impl HistoryStore {
    /// Opens (and creates if missing) the database and runs migrations.
    ///
    /// # Arguments
    ///
    /// * `database_url` - `SQLite` database path (e.g., `<sqlite://data/withdrawals.db>`)
    /// * `max_connections` - Pool size
    ///
    /// # Errors
    ///
    /// Returns error if the URL is malformed, connection fails or migrations fail.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url {database_url}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open {database_url}"))?;

        Self::migrate(pool).await
    }

    /// Creates an in-memory database.
    ///
    /// A single connection is kept alive for the lifetime of the pool; each
    /// new `SQLite` memory connection would otherwise see an empty database.
    ///
    /// # Errors
    ///
    /// Returns error if connection fails.
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("failed to open in-memory database")?;

        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run withdrawal history migrations")?;

        Ok(Self { pool })
    }

    /// Appends the entry's current status as a new event row.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub async fn append(&self, entry: &WithdrawalHistoryEntry) -> Result<()> {
        let recorded_at = if entry.status == WithdrawalStatus::Pending {
            entry.timestamp
        } else {
            Utc::now()
        };

        sqlx::query(
            r"
            INSERT INTO withdrawal_events (withdrawal_id, amount, status, tx_hash, recorded_at, kind)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(entry.id.to_string())
        .bind(entry.amount.to_string())
        .bind(entry.status.as_str())
        .bind(entry.tx_hash.as_deref())
        .bind(recorded_at.timestamp_millis())
        .bind(entry.kind.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to record withdrawal {}", entry.id))?;

        Ok(())
    }

    /// Folds the event log into one entry per withdrawal, in trigger order.
    ///
    /// The entry timestamp and kind come from its first event; status and
    /// hash come from its latest event.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails or a row cannot be decoded.
    pub async fn load_latest(&self) -> Result<Vec<WithdrawalHistoryEntry>> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT withdrawal_id, amount, status, tx_hash, recorded_at, kind
             FROM withdrawal_events ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to read withdrawal history")?;

        let mut entries: Vec<WithdrawalHistoryEntry> = Vec::new();
        let mut index: HashMap<Uuid, usize> = HashMap::new();

        for (id, amount, status, tx_hash, recorded_at, kind) in rows {
            let id = Uuid::parse_str(&id).with_context(|| format!("bad withdrawal id {id}"))?;
            let status = WithdrawalStatus::parse(&status)
                .with_context(|| format!("bad withdrawal status {status} for {id}"))?;

            match index.get(&id) {
                Some(&pos) => {
                    let entry = &mut entries[pos];
                    entry.status = status;
                    if tx_hash.is_some() {
                        entry.tx_hash = tx_hash;
                    }
                }
                None => {
                    let amount = Decimal::from_str(&amount)
                        .with_context(|| format!("bad amount {amount} for {id}"))?;
                    let timestamp = DateTime::<Utc>::from_timestamp_millis(recorded_at)
                        .with_context(|| format!("bad timestamp {recorded_at} for {id}"))?;
                    let kind = WithdrawalKind::parse(&kind)
                        .with_context(|| format!("bad withdrawal kind {kind} for {id}"))?;
                    index.insert(id, entries.len());
                    entries.push(WithdrawalHistoryEntry {
                        id,
                        amount,
                        timestamp,
                        status,
                        tx_hash,
                        kind,
                    });
                }
            }
        }

        Ok(entries)
    }

    /// Total number of event rows.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn event_count(&self) -> Result<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM withdrawal_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
