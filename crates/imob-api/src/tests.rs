//! End-to-end tests driving the full router against an in-memory store.

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use imob_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;
use crate::token::TokenConfig;

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let salt  = SaltString::generate(&mut OsRng);
  let hash  = Argon2::default()
    .hash_password(b"admin", &salt)
    .unwrap()
    .to_string();

  AppState {
    store:  Arc::new(store),
    tokens: Arc::new(TokenService::new(TokenConfig::new(b"api-test-secret".to_vec()))),
    login:  Arc::new(LoginConfig {
      username:      "admin".to_string(),
      password_hash: hash,
      subject_id:    "admin".to_string(),
      email:         "admin@example.com".to_string(),
    }),
    info:   Arc::new(ApiInfo::new("v1", Environment::Test)),
  }
}

async fn app() -> Router { router(make_state().await) }

async fn send(
  app:    &Router,
  method: &str,
  uri:    &str,
  token:  Option<&str>,
  body:   Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };

  let res    = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = res.status();
  let bytes  = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn login(app: &Router) -> String {
  let (status, body) = send(
    app,
    "POST",
    "/auth/token",
    None,
    Some(json!({ "userName": "admin", "password": "admin" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["token"].as_str().unwrap().to_string()
}

fn alice() -> Value {
  json!({
    "document": "12345678901",
    "name": "Alice Liddell",
    "email": "alice@example.com",
  })
}

async fn create(app: &Router, token: &str, body: Value) -> Value {
  let (status, body) = send(app, "POST", "/customers", Some(token), Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body
}

// ── Login ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_issues_verifiable_token() {
  let state = make_state().await;
  let tokens = state.tokens.clone();
  let app = router(state);

  let token = login(&app).await;
  let claims = tokens.verify(&token).unwrap();
  assert_eq!(claims.id, "admin");
  assert_eq!(claims.email, "admin@example.com");
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
  let app = app().await;
  let (status, body) = send(
    &app,
    "POST",
    "/auth/token",
    None,
    Some(json!({ "userName": "admin", "password": "nope" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["error"], "Invalid username or password");
}

#[tokio::test]
async fn login_with_malformed_body_is_400() {
  let app = app().await;
  let (status, body) =
    send(&app, "POST", "/auth/token", None, Some(json!({ "userName": 7 }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Validation failed");
  assert!(!body["details"].as_array().unwrap().is_empty());

  let req = Request::builder()
    .method("POST")
    .uri("/auth/token")
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from("{not json"))
    .unwrap();
  let res = app.clone().oneshot(req).await.unwrap();
  assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Gate ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_route_but_login_requires_a_token() {
  let app = app().await;
  let id = uuid::Uuid::new_v4();
  let routes = [
    ("GET", "/".to_string()),
    ("GET", "/health".to_string()),
    ("GET", "/auth/token".to_string()),
    ("GET", "/customers".to_string()),
    ("POST", "/customers".to_string()),
    ("GET", format!("/customers/{id}")),
    ("PUT", format!("/customers/{id}")),
    ("DELETE", format!("/customers/{id}")),
    ("GET", "/no/such/route".to_string()),
  ];

  for (method, uri) in routes {
    let (status, body) = send(&app, method, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    assert_eq!(body["error"], "Access token required");
  }
}

#[tokio::test]
async fn forged_token_is_403() {
  let app = app().await;
  let other = TokenService::new(TokenConfig::new(b"someone-elses-secret".to_vec()));
  let forged = other.issue("admin", "admin@example.com").unwrap();

  let (status, body) = send(&app, "GET", "/customers", Some(&forged), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["error"], "Invalid token");
}

// ── Customers ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn short_name_is_rejected_with_details() {
  let app = app().await;
  let token = login(&app).await;

  let (status, body) = send(
    &app,
    "POST",
    "/customers",
    Some(&token),
    Some(json!({ "document": "12345678901", "name": "J", "email": "j@x.io" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Validation failed");
  assert_eq!(
    body["details"],
    json!(["Name must be at least 2 characters long"])
  );
}

#[tokio::test]
async fn create_then_get_and_list() {
  let app = app().await;
  let token = login(&app).await;

  let created = create(&app, &token, alice()).await;
  assert_eq!(created["role"], "agent");
  assert_eq!(created["isActive"], true);
  let id = created["id"].as_str().unwrap();

  let (status, fetched) = send(&app, "GET", &format!("/customers/{id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched, created);

  let (status, listed) = send(&app, "GET", "/customers", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(listed, json!([created]));
}

#[tokio::test]
async fn concurrent_creates_with_same_email_admit_one() {
  let app = app().await;
  let token = login(&app).await;

  let mut other = alice();
  other["document"] = json!("10987654321");

  let (a, b) = tokio::join!(
    send(&app, "POST", "/customers", Some(&token), Some(alice())),
    send(&app, "POST", "/customers", Some(&token), Some(other)),
  );
  let mut statuses = [a.0.as_u16(), b.0.as_u16()];
  statuses.sort_unstable();
  assert_eq!(statuses, [201, 400]);

  let loser = if a.0 == StatusCode::BAD_REQUEST { a.1 } else { b.1 };
  assert_eq!(loser["error"], "Duplicate field value");
}

#[tokio::test]
async fn list_filters_by_role() {
  let app = app().await;
  let token = login(&app).await;

  let mut admin = alice();
  admin["role"] = json!("admin");
  let admin = create(&app, &token, admin).await;
  create(
    &app,
    &token,
    json!({ "document": "10987654321", "name": "Bob", "email": "bob@example.com" }),
  )
  .await;

  let (status, listed) = send(&app, "GET", "/customers?role=admin", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(listed, json!([admin]));

  let (status, _) = send(&app, "GET", "/customers?role=owner", Some(&token), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_is_partial_and_document_is_immutable() {
  let app = app().await;
  let token = login(&app).await;
  let created = create(&app, &token, alice()).await;
  let uri = format!("/customers/{}", created["id"].as_str().unwrap());

  let (status, updated) = send(
    &app,
    "PUT",
    &uri,
    Some(&token),
    Some(json!({ "name": "Alice L.", "profile": { "bio": "Curious." } })),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "{updated}");
  assert_eq!(updated["name"], "Alice L.");
  assert_eq!(updated["email"], created["email"]);
  assert_eq!(updated["profile"]["bio"], "Curious.");

  let (status, body) = send(
    &app,
    "PUT",
    &uri,
    Some(&token),
    Some(json!({ "document": "99999999999" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(
    body["details"],
    json!(["Document cannot be changed after creation"])
  );
}

#[tokio::test]
async fn soft_delete_keeps_record_retrievable() {
  let app = app().await;
  let token = login(&app).await;
  let created = create(&app, &token, alice()).await;
  let uri = format!("/customers/{}", created["id"].as_str().unwrap());

  let (status, body) = send(&app, "DELETE", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Customer deactivated successfully");
  assert_eq!(body["customer"]["isActive"], false);

  let (_, listed) = send(&app, "GET", "/customers", Some(&token), None).await;
  assert_eq!(listed, json!([]));

  let (status, fetched) = send(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["isActive"], false);
}

#[tokio::test]
async fn hard_delete_erases_record() {
  let app = app().await;
  let token = login(&app).await;
  let created = create(&app, &token, alice()).await;
  let uri = format!("/customers/{}", created["id"].as_str().unwrap());

  let (status, body) =
    send(&app, "DELETE", &format!("{uri}?deletionType=hard"), Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Customer removed successfully");
  assert_eq!(body["customer"], created);

  let (status, body) = send(&app, "GET", &uri, Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "Customer not found");
}

#[tokio::test]
async fn any_deletion_type_but_hard_is_a_soft_delete() {
  let app = app().await;
  let token = login(&app).await;

  for (i, deletion_type) in ["", "shred", "HARD", "soft"].into_iter().enumerate() {
    let mut input = alice();
    input["document"] = json!(format!("1234567890{i}"));
    input["email"] = json!(format!("alice{i}@example.com"));
    let created = create(&app, &token, input).await;
    let uri = format!("/customers/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
      &app,
      "DELETE",
      &format!("{uri}?deletionType={deletion_type}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{deletion_type:?}: {body}");
    assert_eq!(body["message"], "Customer deactivated successfully");
    assert_eq!(body["customer"]["isActive"], false);

    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{deletion_type:?} should keep the record");
  }
}

#[tokio::test]
async fn missing_and_malformed_ids_are_404() {
  let app = app().await;
  let token = login(&app).await;

  let id = uuid::Uuid::new_v4();
  let (status, body) = send(&app, "GET", &format!("/customers/{id}"), Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], format!("No customer found with ID: {id}"));

  let (status, body) = send(&app, "DELETE", "/customers/not-an-id", Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "No customer found with ID: not-an-id");
}

// ── Info & fallback ──────────────────────────────────────────────────────────

#[tokio::test]
async fn home_and_health_report_status() {
  let app = app().await;
  let token = login(&app).await;

  let (status, home) = send(&app, "GET", "/", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(home["status"], "running");
  assert_eq!(home["version"], "v1");
  assert_eq!(home["environment"], "test");
  assert_eq!(home["endpoints"]["auth"], "/auth/token");

  let (status, health) = send(&app, "GET", "/health", Some(&token), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(health["status"], "OK");
  assert!(health["uptime"].is_number());
  assert_eq!(health["database"]["status"], "connected");
}

#[tokio::test]
async fn unknown_route_is_404_after_the_gate() {
  let app = app().await;
  let token = login(&app).await;

  let (status, body) = send(&app, "GET", "/no/such/route", Some(&token), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(
    body,
    json!({ "error": "Not Found", "message": "Not Found - /no/such/route" })
  );
}

#[tokio::test]
async fn unsupported_method_gets_the_not_found_envelope() {
  let app = app().await;
  let token = login(&app).await;
  let created = create(&app, &token, alice()).await;
  let item = format!("/customers/{}", created["id"].as_str().unwrap());

  for (method, uri) in [("PATCH", "/customers"), ("POST", item.as_str())] {
    let (status, body) = send(&app, method, uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    assert_eq!(body["error"], "Not Found", "{method} {uri}");
    assert_eq!(body["message"], format!("Not Found - {uri}"));
  }
}
