//! Handlers for `/users/{username}/facts`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users/{username}/facts` | Body: `{"fact":"..."}`; returns 201 + updated record |
//! | `GET`  | `/users/{username}/facts` | Optional `?limit=` (1..=500, default 50); newest first |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use factstreak_core::{
  record::{DEFAULT_PAGE_LIMIT, FactsPage},
  store::GamificationStore,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── Learn ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LearnBody {
  pub fact: String,
}

/// `POST /users/{username}/facts` — dated with the server's UTC day.
pub async fn learn<S>(
  State(store): State<Arc<S>>,
  Path(username): Path<String>,
  Json(body): Json<LearnBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GamificationStore,
{
  let today = Utc::now().date_naive();
  let record = store
    .record_fact_learned(&username, body.fact, today)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /users/{username}/facts[?limit=N]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Path(username): Path<String>,
  Query(params): Query<ListParams>,
) -> Result<Json<FactsPage>, ApiError>
where
  S: GamificationStore,
{
  let page = store
    .list_facts(&username, params.limit.unwrap_or(DEFAULT_PAGE_LIMIT))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(page))
}
