//! Read-only views of a user's gamification state.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users/{username}/progress` | Full record, 404 if the user is unknown |
//! | `GET`  | `/users/{username}/streaks` | Streak summary as of the server's UTC day |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use factstreak_core::{
  record::{GamificationRecord, StreakStats},
  store::GamificationStore,
};

use crate::error::ApiError;

/// `GET /users/{username}/progress`
pub async fn progress<S>(
  State(store): State<Arc<S>>,
  Path(username): Path<String>,
) -> Result<Json<GamificationRecord>, ApiError>
where
  S: GamificationStore,
{
  let record = store
    .get_progress(&username)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(record))
}

/// `GET /users/{username}/streaks`
pub async fn streaks<S>(
  State(store): State<Arc<S>>,
  Path(username): Path<String>,
) -> Result<Json<StreakStats>, ApiError>
where
  S: GamificationStore,
{
  let stats = store
    .streak_stats(&username, Utc::now().date_naive())
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(stats))
}
