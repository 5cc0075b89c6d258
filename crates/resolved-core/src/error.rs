//! Error types for `resolved-core`.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::discussion::UserId;

/// The guarded operation an actor was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  Resolve,
  Unresolve,
  ListUnresolved,
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Resolve => "resolve discussions",
      Self::Unresolve => "reopen discussions",
      Self::ListUnresolved => "list unresolved discussions",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("discussion not found: {0}")]
  NotFound(Uuid),

  #[error("user {actor} is not permitted to {operation}")]
  Forbidden { actor: UserId, operation: Operation },

  #[error("discussion {0} is closed to new comments")]
  DiscussionClosed(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
