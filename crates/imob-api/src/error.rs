//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure a handler or the auth gate can produce is a variant of
//! [`ApiError`], and each variant maps to exactly one status code and JSON
//! envelope:
//!
//! | Variant | Status | Body |
//! |---------|--------|------|
//! | `Validation` | 400 | `{"error","details":[...]}` |
//! | `DuplicateKey` | 400 | `{"error","message"}` |
//! | `MissingToken`, `BadCredentials` | 401 | `{"error"}` |
//! | `InvalidToken`, `ExpiredToken` | 403 | `{"error"}` |
//! | `CustomerNotFound`, `RouteNotFound` | 404 | `{"error","message"}` |
//! | `Unclassified` | 500 | `{"error","message"}` (+ `"stack"` outside production) |

use axum::{
  Json,
  extract::{
    Request,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::token::TokenError;

/// An error returned by an API handler or the auth gate.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed: {}", .0.join("; "))]
  Validation(Vec<String>),

  #[error("duplicate field value")]
  DuplicateKey,

  #[error("access token required")]
  MissingToken,

  #[error("invalid username or password")]
  BadCredentials,

  #[error("invalid token")]
  InvalidToken,

  #[error("token expired")]
  ExpiredToken,

  /// Carries the identifier exactly as the client sent it.
  #[error("customer not found: {0}")]
  CustomerNotFound(String),

  #[error("route not found: {0}")]
  RouteNotFound(String),

  #[error("internal error: {0}")]
  Unclassified(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Convert any store error into the API taxonomy.
  pub fn store<E: Into<imob_core::Error>>(e: E) -> Self { Self::from(e.into()) }
}

impl From<imob_core::Error> for ApiError {
  fn from(e: imob_core::Error) -> Self {
    match e {
      imob_core::Error::CustomerNotFound(id) => Self::CustomerNotFound(id.to_string()),
      imob_core::Error::DuplicateKey => Self::DuplicateKey,
      imob_core::Error::Validation(details) => Self::Validation(details),
      imob_core::Error::Store(source) => Self::Unclassified(source),
    }
  }
}

impl From<TokenError> for ApiError {
  fn from(e: TokenError) -> Self {
    match e {
      TokenError::Invalid => Self::InvalidToken,
      TokenError::Expired => Self::ExpiredToken,
      other @ TokenError::Encoding(_) => Self::Unclassified(Box::new(other)),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::Validation(vec![rejection.body_text()])
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    Self::Validation(vec![rejection.body_text()])
  }
}

/// The source chain of an unclassified error, stashed in the response
/// extensions so [`attach_stack`] can expose it outside production.
#[derive(Debug, Clone)]
pub struct ErrorStack {
  message: String,
  stack:   Vec<String>,
}

impl ErrorStack {
  fn of(error: &(dyn std::error::Error + 'static)) -> Self {
    let mut stack = Vec::new();
    let mut current = Some(error);
    while let Some(e) = current {
      stack.push(e.to_string());
      current = e.source();
    }
    Self { message: error.to_string(), stack }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Validation(details) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": "Validation failed", "details": details }),
      ),
      ApiError::DuplicateKey => (
        StatusCode::BAD_REQUEST,
        json!({
          "error": "Duplicate field value",
          "message": "A customer with this document or email already exists",
        }),
      ),
      ApiError::MissingToken => (
        StatusCode::UNAUTHORIZED,
        json!({ "error": "Access token required" }),
      ),
      ApiError::BadCredentials => (
        StatusCode::UNAUTHORIZED,
        json!({ "error": "Invalid username or password" }),
      ),
      ApiError::InvalidToken => {
        (StatusCode::FORBIDDEN, json!({ "error": "Invalid token" }))
      }
      ApiError::ExpiredToken => {
        (StatusCode::FORBIDDEN, json!({ "error": "Token expired" }))
      }
      ApiError::CustomerNotFound(id) => (
        StatusCode::NOT_FOUND,
        json!({
          "error": "Customer not found",
          "message": format!("No customer found with ID: {id}"),
        }),
      ),
      ApiError::RouteNotFound(path) => (
        StatusCode::NOT_FOUND,
        json!({ "error": "Not Found", "message": format!("Not Found - {path}") }),
      ),
      ApiError::Unclassified(e) => {
        tracing::error!(error = %e, "unclassified error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "error": "Internal Server Error", "message": e.to_string() }),
        )
      }
    };

    let mut res = (status, Json(body)).into_response();
    if let ApiError::Unclassified(e) = &self {
      let source: &(dyn std::error::Error + 'static) = &**e;
      res.extensions_mut().insert(ErrorStack::of(source));
    }
    res
  }
}

/// Response mapper installed outside production: rewrites unclassified error
/// bodies to include the error's source chain under `"stack"`.
pub async fn attach_stack(mut res: Response) -> Response {
  let Some(ErrorStack { message, stack }) = res.extensions_mut().remove::<ErrorStack>()
  else {
    return res;
  };
  (
    res.status(),
    Json(json!({
      "error": "Internal Server Error",
      "message": message,
      "stack": stack,
    })),
  )
    .into_response()
}

/// Fallback for unmatched routes and for methods a route does not support.
pub async fn route_not_found(req: Request) -> ApiError {
  ApiError::RouteNotFound(req.uri().path().to_owned())
}
