//! Store traits implemented by storage backends (e.g. `factstreak-store-sqlite`).
//!
//! Higher layers (`factstreak-api`, `factstreak-server`) depend on these
//! abstractions, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  DomainError,
  columns::{ColumnInfo, ColumnReport, ColumnSpec, EvolutionReport},
  record::{FactsPage, GamificationRecord, StreakStats},
};

// ─── Schema evolution ────────────────────────────────────────────────────────

/// Brings a table's column set up to a required superset without data loss.
///
/// Safe to run repeatedly: columns the store reports as already present are
/// treated as satisfied, every other failure is returned with the column it
/// happened on.
pub trait SchemaEvolver: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Add each of `columns` to `table`, in order, skipping those already
  /// present.
  fn ensure_columns<'a>(
    &'a self,
    table: &'a str,
    columns: &'a [ColumnSpec],
  ) -> impl Future<Output = Result<EvolutionReport, Self::Error>> + Send + 'a;

  /// The live column list of `table`, in declaration order. Empty if the
  /// table does not exist.
  fn table_columns<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Vec<ColumnInfo>, Self::Error>> + Send + 'a;

  /// Compare the live column list of `table` against `columns`.
  fn verify_columns<'a>(
    &'a self,
    table: &'a str,
    columns: &'a [ColumnSpec],
  ) -> impl Future<Output = Result<ColumnReport, Self::Error>> + Send + 'a;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// The slice of the account lifecycle the gamification store relies on.
pub trait AccountDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn user_exists<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Register a user and return their row id. Usernames are unique.
  fn create_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + 'a;
}

// ─── Gamification ────────────────────────────────────────────────────────────

/// Per-user gamification state: the fact log and streak counters.
///
/// The caller is trusted with `username`; authentication happens upstream.
pub trait GamificationStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  /// Append `fact` to the user's log as learned on `today` and update the
  /// streak counters. The read and the write happen in one transaction.
  fn record_fact_learned<'a>(
    &'a self,
    username: &'a str,
    fact: String,
    today: NaiveDate,
  ) -> impl Future<Output = Result<GamificationRecord, Self::Error>> + Send + 'a;

  /// The user's full record.
  fn get_progress<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<GamificationRecord, Self::Error>> + Send + 'a;

  /// The newest `limit` facts of the user's log.
  fn list_facts<'a>(
    &'a self,
    username: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<FactsPage, Self::Error>> + Send + 'a;

  /// Streak summary for the user as seen on `today`.
  fn streak_stats<'a>(
    &'a self,
    username: &'a str,
    today: NaiveDate,
  ) -> impl Future<Output = Result<StreakStats, Self::Error>> + Send + 'a;
}
