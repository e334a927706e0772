//! Error type for `imob-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] imob_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown role in database: {0:?}")]
  UnknownRole(String),
}

impl Error {
  /// Classify a failed write: unique-index collisions become
  /// [`imob_core::Error::DuplicateKey`], everything else stays a database
  /// error.
  pub(crate) fn from_write(e: tokio_rusqlite::Error) -> Self {
    match &e {
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
        if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
      {
        Self::Core(imob_core::Error::DuplicateKey)
      }
      _ => Self::Database(e),
    }
  }
}

impl From<Error> for imob_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => imob_core::Error::Store(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
