//! Core types and trait definitions for the factstreak gamification store.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the per-user record, the "learned a fact" transition, the column specs the
//! `users` table must carry, and the traits storage backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod columns;
pub mod error;
pub mod record;
pub mod store;

pub use error::{DomainError, Error, Result};
