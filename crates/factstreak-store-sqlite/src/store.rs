//! [`SqliteStore`] — the SQLite implementation of the factstreak store traits.

use std::{path::Path, time::Duration};

use chrono::NaiveDate;
use rusqlite::{ErrorCode, OptionalExtension as _, TransactionBehavior};

use factstreak_core::{
  Error as CoreError,
  record::{FactsPage, GamificationRecord, StreakStats, StreakStep},
  store::{AccountDirectory, GamificationStore},
};

use crate::{
  Result,
  encode::{RawRecord, encode_date, encode_fact_log},
  schema::BASE_SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A factstreak store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted, and every
/// clone funnels its calls through the same database thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and create the base `users` table.
  ///
  /// The gamification columns are not added here; run
  /// [`SchemaEvolver::ensure_columns`](factstreak_core::store::SchemaEvolver)
  /// before serving traffic.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// How long a write waits for a lock held by another connection before
  /// giving up with a conflict.
  pub async fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(timeout)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(BASE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load and decode the gamification columns of `username`'s row.
  async fn load(&self, username: &str) -> Result<GamificationRecord> {
    let key = username.to_owned();
    let record = self
      .conn
      .call(move |conn| Ok(load_record(conn, &key)))
      .await??;
    record.ok_or_else(|| CoreError::UserNotFound(username.to_owned()).into())
  }
}

// ─── Row access ──────────────────────────────────────────────────────────────

fn load_record(conn: &rusqlite::Connection, username: &str) -> Result<Option<GamificationRecord>> {
  let raw = conn
    .query_row(
      &format!("SELECT {} FROM users WHERE username = ?1", RawRecord::COLUMNS),
      rusqlite::params![username],
      RawRecord::from_row,
    )
    .optional()?;

  Ok(raw.map(|r| r.into_record(username)).transpose()?)
}

/// The read-modify-write of "learned a fact", inside one `BEGIN IMMEDIATE`
/// transaction. The write lock is taken before the read, so two writers for
/// the same user cannot both build on the same prior state.
fn apply_fact_learned(
  conn: &mut rusqlite::Connection,
  username: &str,
  fact: String,
  today: NaiveDate,
) -> Result<(GamificationRecord, StreakStep)> {
  let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
    Ok(tx) => tx,
    Err(rusqlite::Error::SqliteFailure(err, _))
      if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
    {
      return Err(CoreError::ConcurrentUpdateConflict(username.to_owned()).into());
    }
    Err(err) => return Err(err.into()),
  };

  let mut record = load_record(&tx, username)?
    .ok_or_else(|| CoreError::UserNotFound(username.to_owned()))?;

  let step = record.learn(fact, today);

  let facts_json = encode_fact_log(&record.facts_learned)?;
  let last_date  = record.last_activity_date.map(encode_date);

  tx.execute(
    "UPDATE users SET
       facts_learned      = ?1,
       current_streak     = ?2,
       last_activity_date = ?3,
       longest_streak     = ?4,
       total_facts_count  = ?5
     WHERE username = ?6",
    rusqlite::params![
      facts_json,
      record.current_streak,
      last_date,
      record.longest_streak,
      record.total_facts_count,
      username,
    ],
  )?;
  tx.commit()?;

  Ok((record, step))
}

// ─── AccountDirectory impl ───────────────────────────────────────────────────

impl AccountDirectory for SqliteStore {
  type Error = crate::Error;

  async fn user_exists(&self, username: &str) -> Result<bool> {
    let key = username.to_owned();
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM users WHERE username = ?1",
              rusqlite::params![key],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn create_user(&self, username: &str) -> Result<i64> {
    let key = username.to_owned();
    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute("INSERT INTO users (username) VALUES (?1)", rusqlite::params![key]) {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
          {
            Ok(None)
          }
          Err(err) => Err(err.into()),
        }
      })
      .await?;

    let id = inserted.ok_or_else(|| CoreError::UserExists(username.to_owned()))?;
    tracing::info!(username, id, "created user");
    Ok(id)
  }
}

// ─── GamificationStore impl ──────────────────────────────────────────────────

impl GamificationStore for SqliteStore {
  type Error = crate::Error;

  async fn record_fact_learned(
    &self,
    username: &str,
    fact: String,
    today: NaiveDate,
  ) -> Result<GamificationRecord> {
    if fact.trim().is_empty() {
      return Err(CoreError::EmptyFact.into());
    }
    let key = username.to_owned();

    let result = self
      .conn
      .call(move |conn| Ok(apply_fact_learned(conn, &key, fact, today)))
      .await?;

    let (record, step) = match result {
      Ok(applied) => applied,
      Err(err) => {
        if matches!(err, crate::Error::Core(CoreError::ConcurrentUpdateConflict(_))) {
          tracing::warn!(username, "could not lock row for update");
        }
        return Err(err);
      }
    };

    tracing::debug!(
      username,
      ?step,
      current_streak = record.current_streak,
      longest_streak = record.longest_streak,
      total_facts_count = record.total_facts_count,
      "recorded learned fact"
    );
    Ok(record)
  }

  async fn get_progress(&self, username: &str) -> Result<GamificationRecord> {
    self.load(username).await
  }

  async fn list_facts(&self, username: &str, limit: usize) -> Result<FactsPage> {
    let record = self.load(username).await?;
    Ok(record.page(limit)?)
  }

  async fn streak_stats(&self, username: &str, today: NaiveDate) -> Result<StreakStats> {
    let record = self.load(username).await?;
    Ok(record.stats(today))
  }
}
