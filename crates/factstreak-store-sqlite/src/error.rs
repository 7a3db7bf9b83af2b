//! Error type for `factstreak-store-sqlite`.

use factstreak_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] factstreak_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// Adding a column failed for a reason other than it already existing.
  #[error("failed to add column {column:?} to table {table:?}: {source}")]
  SchemaEvolution {
    table:  String,
    column: String,
    #[source]
    source: rusqlite::Error,
  },
}

impl DomainError for Error {
  fn domain(&self) -> Option<&factstreak_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
