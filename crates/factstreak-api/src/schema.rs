//! Operational view of the `users` table schema.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/schema/columns` | Live column list of `users` |
//! | `GET`  | `/schema/verify` | Which gamification columns are present / missing |

use std::sync::Arc;

use axum::{Json, extract::State};
use factstreak_core::{
  columns::{ColumnInfo, ColumnReport, GAMIFICATION_COLUMNS, USERS_TABLE},
  store::SchemaEvolver,
};

use crate::error::ApiError;

/// `GET /schema/columns`
pub async fn columns<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<ColumnInfo>>, ApiError>
where
  S: SchemaEvolver,
{
  let columns = store
    .table_columns(USERS_TABLE)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(columns))
}

/// `GET /schema/verify`
pub async fn verify<S>(State(store): State<Arc<S>>) -> Result<Json<ColumnReport>, ApiError>
where
  S: SchemaEvolver,
{
  let report = store
    .verify_columns(USERS_TABLE, &GAMIFICATION_COLUMNS)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(report))
}
