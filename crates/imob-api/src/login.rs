//! `POST /auth/token`: exchange operator credentials for a bearer token.
//!
//! Body: `{"userName":"admin","password":"admin"}` → 201 `{"token":"..."}`.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use imob_core::{store::CustomerStore, validate};
use serde_json::{Value, json};

use crate::{AppState, error::ApiError};

/// The only route the auth gate lets through without a token.
pub const TOKEN_PATH: &str = "/auth/token";

/// The operator account allowed to obtain tokens.
#[derive(Clone)]
pub struct LoginConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  /// Placed in the token's `id` claim.
  pub subject_id:    String,
  pub email:         String,
}

impl std::fmt::Debug for LoginConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LoginConfig")
      .field("username", &self.username)
      .field("password_hash", &"[REDACTED]")
      .field("subject_id", &self.subject_id)
      .field("email", &self.email)
      .finish()
  }
}

/// Check a username/password pair against `config`.
///
/// The argon2 check runs regardless of the username.
pub fn verify_credentials(
  config: &LoginConfig,
  username: &str,
  password: &str,
) -> Result<(), ApiError> {
  let password_ok = password_matches(&config.password_hash, password);
  let username_ok = username == config.username;
  if username_ok && password_ok {
    Ok(())
  } else {
    Err(ApiError::BadCredentials)
  }
}

/// Whether `password` matches the PHC string `hash`. An unparseable hash
/// matches nothing.
fn password_matches(hash: &str, password: &str) -> bool {
  PasswordHash::new(hash).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

/// `POST /auth/token`
pub async fn issue_token<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CustomerStore + 'static,
{
  let Json(body) = body?;
  let creds = validate::credentials(&body).map_err(ApiError::Validation)?;

  if let Err(e) = verify_credentials(&state.login, &creds.user_name, &creds.password) {
    tracing::warn!(user = %creds.user_name, "rejected login attempt");
    return Err(e);
  }

  let token = state.tokens.issue(&state.login.subject_id, &state.login.email)?;
  tracing::info!(user = %creds.user_name, "issued access token");
  Ok((StatusCode::CREATED, Json(json!({ "token": token }))))
}
