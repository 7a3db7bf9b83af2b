//! Error types for `factstreak-core`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("user already exists: {0}")]
  UserExists(String),

  /// The stored record cannot be read back without guessing. Never repaired.
  #[error("corrupt gamification state for user {username:?}: {reason}")]
  CorruptState { username: String, reason: String },

  /// The row could not be locked for a read-modify-write; retry the call.
  #[error("concurrent update conflict for user {0:?}")]
  ConcurrentUpdateConflict(String),

  #[error("invalid SQL identifier: {0:?}")]
  InvalidIdentifier(String),

  #[error("limit must be between 1 and {max}, got {got}")]
  InvalidLimit { got: usize, max: usize },

  #[error("fact text must not be empty")]
  EmptyFact,
}

impl Error {
  pub fn corrupt(username: &str, reason: impl Into<String>) -> Self {
    Self::CorruptState { username: username.to_owned(), reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so callers can tell domain failures
/// (unknown user, corrupt state, ...) apart from backend faults.
pub trait DomainError {
  /// The domain error this value wraps, if any.
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
