//! JSON REST API for factstreak.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`GamificationStore`] and [`SchemaEvolver`]. Authentication is the
//! caller's responsibility: the username in the path is trusted as-is.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", factstreak_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod facts;
pub mod progress;
pub mod schema;

use std::sync::Arc;

use axum::{Router, routing::get};
use factstreak_core::store::{GamificationStore, SchemaEvolver};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: GamificationStore + SchemaEvolver + Send + Sync + 'static,
{
  Router::new()
    // Per-user state
    .route("/users/{username}/facts", get(facts::list::<S>).post(facts::learn::<S>))
    .route("/users/{username}/progress", get(progress::progress::<S>))
    .route("/users/{username}/streaks", get(progress::streaks::<S>))
    // Operations
    .route("/schema/columns", get(schema::columns::<S>))
    .route("/schema/verify", get(schema::verify::<S>))
    .with_state(store)
}
