//! Informational endpoints: `GET /` and `GET /health`. Both always answer 200.

use axum::{Json, extract::State};
use chrono::{SecondsFormat, Utc};
use imob_core::store::CustomerStore;
use serde_json::{Value, json};

use crate::{AppState, login::TOKEN_PATH};

fn timestamp() -> String { Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true) }

/// `GET /`
pub async fn home<S>(State(state): State<AppState<S>>) -> Json<Value>
where
  S: CustomerStore + 'static,
{
  Json(json!({
    "message": "Welcome to Imob API",
    "version": state.info.version,
    "status": "running",
    "environment": state.info.environment,
    "timestamp": timestamp(),
    "endpoints": {
      "customers": "/customers",
      "auth": TOKEN_PATH,
      "health": "/health",
    },
  }))
}

/// `GET /health`
///
/// A failed database ping is reported in the body, not the status code.
pub async fn health<S>(State(state): State<AppState<S>>) -> Json<Value>
where
  S: CustomerStore + 'static,
{
  let database = match state.store.ping().await {
    Ok(()) => json!({ "status": "connected", "message": "Database is reachable" }),
    Err(e) => {
      tracing::warn!(error = %e, "database health check failed");
      json!({ "status": "error", "message": e.to_string() })
    }
  };

  Json(json!({
    "status": "OK",
    "uptime": state.info.started_at.elapsed().as_secs_f64(),
    "timestamp": timestamp(),
    "database": database,
  }))
}
