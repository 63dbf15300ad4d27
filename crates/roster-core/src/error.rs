//! Error types for `roster-core`.
//!
//! The first four variants are the failure kinds surfaced to transports;
//! `Store` wraps whatever the backing store reported.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The list or person does not exist, or (on delete) is not owned by the
  /// requester.
  #[error("not found: {0}")]
  NotFound(String),

  #[error("validation failed: {0}")]
  ValidationFailed(String),

  /// Authenticated, but not allowed to perform the operation.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("authentication required")]
  Unauthenticated,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
