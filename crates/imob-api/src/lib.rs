//! JSON REST API for Imob.
//!
//! Exposes an axum [`Router`] backed by any [`CustomerStore`]. Every route
//! except `POST /auth/token` sits behind the bearer-token gate in [`gate`];
//! transport concerns (TLS, CORS, request tracing) are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = imob_api::router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod customers;
pub mod error;
pub mod gate;
pub mod info;
pub mod login;
pub mod token;

use std::{sync::Arc, time::Instant};

use axum::{
  Router,
  middleware::{from_fn_with_state, map_response},
  routing::{get, post},
};
use imob_core::store::CustomerStore;
use serde::{Deserialize, Serialize};

pub use error::ApiError;
use login::{LoginConfig, TOKEN_PATH};
use token::TokenService;

// ─── Environment ──────────────────────────────────────────────────────────────

/// Deployment environment the process runs in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
  #[default]
  Development,
  Test,
  Production,
}

impl Environment {
  /// Whether 500 responses may carry the error's source chain.
  pub fn exposes_internal_errors(self) -> bool { self != Environment::Production }
}

/// Static facts reported by `GET /` and `GET /health`.
#[derive(Debug, Clone)]
pub struct ApiInfo {
  pub version:     String,
  pub environment: Environment,
  pub started_at:  Instant,
}

impl ApiInfo {
  pub fn new(version: impl Into<String>, environment: Environment) -> Self {
    Self {
      version: version.into(),
      environment,
      started_at: Instant::now(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers. Immutable after startup.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub tokens: Arc<TokenService>,
  pub login:  Arc<LoginConfig>,
  pub info:   Arc<ApiInfo>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      tokens: self.tokens.clone(),
      login:  self.login.clone(),
      info:   self.info.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the fully-materialised API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CustomerStore + 'static,
{
  let expose_stack = state.info.environment.exposes_internal_errors();

  let router = Router::new()
    .route("/", get(info::home::<S>))
    .route("/health", get(info::health::<S>))
    .route(TOKEN_PATH, post(login::issue_token::<S>))
    .route(
      "/customers",
      get(customers::list::<S>).post(customers::create::<S>),
    )
    .route(
      "/customers/{id}",
      get(customers::get_one::<S>)
        .put(customers::update::<S>)
        .delete(customers::delete::<S>),
    )
    .fallback(error::route_not_found)
    .method_not_allowed_fallback(error::route_not_found)
    .layer(from_fn_with_state(state.tokens.clone(), gate::require_bearer))
    .with_state(state);

  if expose_stack {
    router.layer(map_response(error::attach_stack))
  } else {
    router
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
