//! Handlers for `/customers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/customers` | Active only; optional `?role=admin\|agent` |
//! | `POST`   | `/customers` | 201 with the stored record |
//! | `GET`    | `/customers/{id}` | 404 if not found (active or not) |
//! | `PUT`    | `/customers/{id}` | Partial update; `document` is immutable |
//! | `DELETE` | `/customers/{id}` | `?deletionType=hard` erases; anything else deactivates |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use imob_core::{
  customer::{Customer, Role},
  store::CustomerStore,
  validate,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{AppState, error::ApiError, gate::Identity};

/// Ids that do not parse cannot name a stored customer.
fn parse_id(raw: String) -> Result<Uuid, ApiError> {
  Uuid::parse_str(&raw).map_err(|_| ApiError::CustomerNotFound(raw))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role: Option<Role>,
}

/// `GET /customers[?role=<role>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, ApiError>
where
  S: CustomerStore + 'static,
{
  let Query(params) = params?;
  let customers = match params.role {
    Some(role) => state.store.list_by_role(role).await,
    None => state.store.list_active().await,
  }
  .map_err(ApiError::store)?;
  Ok(Json(customers))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /customers/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError>
where
  S: CustomerStore + 'static,
{
  let id = parse_id(id)?;
  let customer = state.store.get(id).await.map_err(ApiError::store)?;
  Ok(Json(customer))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /customers`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  who: Identity,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CustomerStore + 'static,
{
  let Json(body) = body?;
  let input = validate::new_customer(&body).map_err(ApiError::Validation)?;
  let customer = state.store.create(input).await.map_err(ApiError::store)?;

  tracing::info!(customer_id = %customer.id, by = %who.email, "customer created");
  Ok((StatusCode::CREATED, Json(customer)))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /customers/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  who: Identity,
  Path(id): Path<String>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Customer>, ApiError>
where
  S: CustomerStore + 'static,
{
  let id = parse_id(id)?;
  let Json(body) = body?;
  let patch = validate::customer_patch(&body).map_err(ApiError::Validation)?;
  let customer = state.store.update(id, patch).await.map_err(ApiError::store)?;

  tracing::info!(customer_id = %customer.id, by = %who.email, "customer updated");
  Ok(Json(customer))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionType {
  Soft,
  Hard,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteParams {
  pub deletion_type: Option<String>,
}

impl DeleteParams {
  /// Only an exact `hard` erases the record; anything else deactivates it.
  pub fn kind(&self) -> DeletionType {
    match self.deletion_type.as_deref() {
      Some("hard") => DeletionType::Hard,
      _ => DeletionType::Soft,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
  pub message:  &'static str,
  pub customer: Customer,
}

/// `DELETE /customers/{id}[?deletionType=soft|hard]`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  who: Identity,
  Path(id): Path<String>,
  params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<DeleteResponse>, ApiError>
where
  S: CustomerStore + 'static,
{
  let id = parse_id(id)?;
  let Query(params) = params?;

  let kind = params.kind();
  let (customer, message) = match kind {
    DeletionType::Soft => (
      state.store.soft_delete(id).await.map_err(ApiError::store)?,
      "Customer deactivated successfully",
    ),
    DeletionType::Hard => (
      state.store.hard_delete(id).await.map_err(ApiError::store)?,
      "Customer removed successfully",
    ),
  };

  tracing::info!(
    customer_id = %customer.id,
    by = %who.email,
    deletion = ?kind,
    "customer deleted"
  );
  Ok(Json(DeleteResponse { message, customer }))
}
