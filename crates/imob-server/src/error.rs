//! Startup errors: configuration and credential setup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to load configuration: {0}")]
  Config(#[from] config::ConfigError),

  #[error("invalid token_ttl {0:?}: expected seconds or a number suffixed with s, m, h or d")]
  InvalidTtl(String),

  #[error("invalid cors_origin {0:?}")]
  InvalidCorsOrigin(String),

  #[error("argon2 error: {0}")]
  PasswordHash(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
