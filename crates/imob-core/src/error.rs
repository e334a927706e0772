//! Error types for `imob-core`.

use thiserror::Error;
use uuid::Uuid;

/// The failure kinds a [`CustomerStore`](crate::store::CustomerStore) can
/// surface to its callers.
#[derive(Debug, Error)]
pub enum Error {
  #[error("customer not found: {0}")]
  CustomerNotFound(Uuid),

  /// A write collided with the unique document or email index. Which of the
  /// two collided is not reported.
  #[error("a customer with this document or email already exists")]
  DuplicateKey,

  /// Every field-level violation found on a write, in field order.
  #[error("validation failed: {}", .0.join("; "))]
  Validation(Vec<String>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
