//! Bearer-token middleware and the [`Identity`] extractor.
//!
//! The gate runs in front of every route, including the fallback. Only
//! `POST /auth/token` passes through unauthenticated. A missing credential is
//! a 401; a credential that fails verification is a 403.

use std::sync::Arc;

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, Method, header, request::Parts},
  middleware::Next,
  response::{IntoResponse, Response},
};

use crate::{error::ApiError, login::TOKEN_PATH, token::TokenService};

/// The verified caller, inserted into request extensions by
/// [`require_bearer`]. Handlers must not assume any claim beyond these two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub id:    String,
  pub email: String,
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Identity>()
      .cloned()
      .ok_or(ApiError::MissingToken)
  }
}

/// Whether a request may skip authentication.
pub fn is_exempt(method: &Method, path: &str) -> bool {
  method == Method::POST && path == TOKEN_PATH
}

/// The credential from an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|token| !token.is_empty())
}

/// Middleware: verify the bearer token and attach the caller's [`Identity`].
pub async fn require_bearer(
  State(tokens): State<Arc<TokenService>>,
  mut req: Request,
  next: Next,
) -> Response {
  if is_exempt(req.method(), req.uri().path()) {
    return next.run(req).await;
  }

  let Some(token) = bearer_token(req.headers()) else {
    tracing::warn!(path = %req.uri().path(), "authentication failed: missing bearer token");
    return ApiError::MissingToken.into_response();
  };

  match tokens.verify(token) {
    Ok(claims) => {
      req.extensions_mut().insert(Identity {
        id:    claims.id,
        email: claims.email,
      });
      next.run(req).await
    }
    Err(e) => {
      tracing::warn!(reason = %e, path = %req.uri().path(), "authentication failed");
      ApiError::from(e).into_response()
    }
  }
}
