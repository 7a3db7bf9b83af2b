//! Base SQL for the account table the gamification columns are added to.
//!
//! Executed once at connection startup. The gamification columns themselves
//! are not part of this DDL; they are added by
//! [`SchemaEvolver::ensure_columns`](factstreak_core::store::SchemaEvolver).

/// Idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const BASE_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    username  TEXT UNIQUE,
    password  TEXT
);
";
