//! Process wiring for the Imob API server.
//!
//! Loads [`ServerConfig`] from an optional TOML file layered under `IMOB_*`
//! environment variables, turns it into the immutable [`AppState`] the API
//! handlers share, and wraps the API router in the HTTP middleware stack.

pub mod error;

pub use error::{Error, Result};

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  Router,
  http::{HeaderName, HeaderValue, header},
};
use imob_api::{
  ApiInfo, AppState, Environment,
  login::LoginConfig,
  token::{DEFAULT_AUDIENCE, DEFAULT_ISSUER, TokenConfig, TokenService},
};
use imob_core::store::CustomerStore;
use rand_core::OsRng;
use serde::Deserialize;
use tower_http::{
  cors::{Any, CorsLayer},
  set_header::SetResponseHeaderLayer,
  trace::TraceLayer,
};

/// Signing secret used when none is configured. Only fit for development.
pub const DEV_TOKEN_SECRET: &str = "imob-development-secret-change-me";

/// Password of the default operator account when no hash is configured.
const DEFAULT_PASSWORD: &str = "admin";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `imob.toml` and `IMOB_*`
/// environment variables. Missing keys fall back to [`Default`].
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                  String,
  pub port:                  u16,
  pub environment:           Environment,
  pub api_version:           String,
  pub database_path:         PathBuf,
  pub database_timeout_secs: u64,
  pub token_secret:          String,
  /// Seconds, or a number suffixed with `s`, `m`, `h` or `d`.
  pub token_ttl:             String,
  pub token_issuer:          String,
  pub token_audience:        String,
  /// `*` or a single exact origin.
  pub cors_origin:           String,
  pub auth_username:         String,
  /// PHC string produced by argon2. Unset means the password `admin`.
  pub auth_password_hash:    Option<String>,
  pub auth_email:            String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  "0.0.0.0".to_string(),
      port:                  8080,
      environment:           Environment::Development,
      api_version:           "v1".to_string(),
      database_path:         PathBuf::from("imob.sqlite3"),
      database_timeout_secs: 5,
      token_secret:          DEV_TOKEN_SECRET.to_string(),
      token_ttl:             "24h".to_string(),
      token_issuer:          DEFAULT_ISSUER.to_string(),
      token_audience:        DEFAULT_AUDIENCE.to_string(),
      cors_origin:           "*".to_string(),
      auth_username:         "admin".to_string(),
      auth_password_hash:    None,
      auth_email:            "admin@example.com".to_string(),
    }
  }
}

// Secrets stay out of logs.
impl std::fmt::Debug for ServerConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ServerConfig")
      .field("host", &self.host)
      .field("port", &self.port)
      .field("environment", &self.environment)
      .field("api_version", &self.api_version)
      .field("database_path", &self.database_path)
      .field("database_timeout_secs", &self.database_timeout_secs)
      .field("token_secret", &"[REDACTED]")
      .field("token_ttl", &self.token_ttl)
      .field("token_issuer", &self.token_issuer)
      .field("token_audience", &self.token_audience)
      .field("cors_origin", &self.cors_origin)
      .field("auth_username", &self.auth_username)
      .field("auth_email", &self.auth_email)
      .finish_non_exhaustive()
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn database_timeout(&self) -> Duration {
    Duration::from_secs(self.database_timeout_secs)
  }
}

/// Load configuration from `path` (if it exists) overlaid with `IMOB_*`
/// environment variables.
pub fn load_config(path: &Path) -> Result<ServerConfig> {
  load(config::File::from(path).required(false))
}

fn load<T>(file: T) -> Result<ServerConfig>
where
  T: config::Source + Send + Sync + 'static,
{
  let settings = config::Config::builder()
    .add_source(file)
    .add_source(config::Environment::with_prefix("IMOB"))
    .build()?;
  Ok(settings.try_deserialize()?)
}

/// Parse a TTL such as `3600`, `90s`, `15m`, `24h` or `7d`. Zero is rejected.
pub fn parse_ttl(raw: &str) -> Result<Duration> {
  let invalid = || Error::InvalidTtl(raw.to_owned());
  let trimmed = raw.trim();

  let (digits, unit_secs) = match trimmed.chars().last() {
    Some('s') => (&trimmed[..trimmed.len() - 1], 1),
    Some('m') => (&trimmed[..trimmed.len() - 1], 60),
    Some('h') => (&trimmed[..trimmed.len() - 1], 60 * 60),
    Some('d') => (&trimmed[..trimmed.len() - 1], 24 * 60 * 60),
    _ => (trimmed, 1),
  };

  let count: u64 = digits.parse().map_err(|_| invalid())?;
  count
    .checked_mul(unit_secs)
    .filter(|secs| *secs > 0)
    .map(Duration::from_secs)
    .ok_or_else(invalid)
}

/// Produce the argon2 PHC string for `password` with a fresh salt.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

// ─── Application state ────────────────────────────────────────────────────────

/// Signing configuration for the token service.
pub fn token_config(config: &ServerConfig) -> Result<TokenConfig> {
  if config.token_secret == DEV_TOKEN_SECRET
    && config.environment == Environment::Production
  {
    tracing::warn!("token_secret is the development default; set IMOB_TOKEN_SECRET");
  }

  Ok(TokenConfig {
    secret:   config.token_secret.as_bytes().to_vec(),
    ttl:      parse_ttl(&config.token_ttl)?,
    issuer:   config.token_issuer.clone(),
    audience: config.token_audience.clone(),
  })
}

/// The operator account allowed to log in.
pub fn login_config(config: &ServerConfig) -> Result<LoginConfig> {
  let password_hash = match &config.auth_password_hash {
    Some(hash) => hash.clone(),
    None => {
      tracing::warn!(
        user = %config.auth_username,
        "auth_password_hash not set; accepting the default password"
      );
      hash_password(DEFAULT_PASSWORD)?
    }
  };

  Ok(LoginConfig {
    username: config.auth_username.clone(),
    password_hash,
    subject_id: config.auth_username.clone(),
    email: config.auth_email.clone(),
  })
}

/// Assemble the shared handler state around `store`.
pub fn build_state<S>(config: &ServerConfig, store: S) -> Result<AppState<S>>
where
  S: CustomerStore,
{
  Ok(AppState {
    store:  Arc::new(store),
    tokens: Arc::new(TokenService::new(token_config(config)?)),
    login:  Arc::new(login_config(config)?),
    info:   Arc::new(ApiInfo::new(config.api_version.clone(), config.environment)),
  })
}

// ─── Router ───────────────────────────────────────────────────────────────────

fn cors_layer(origin: &str) -> Result<CorsLayer> {
  let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
  if origin.trim() == "*" {
    return Ok(layer.allow_origin(Any));
  }
  let origin = HeaderValue::from_str(origin.trim())
    .map_err(|_| Error::InvalidCorsOrigin(origin.to_owned()))?;
  Ok(layer.allow_origin(origin))
}

/// Hardening headers added to every response that does not already set them.
pub const SECURITY_HEADERS: [(HeaderName, &str); 6] = [
  (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
  (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
  (header::REFERRER_POLICY, "no-referrer"),
  (header::X_DNS_PREFETCH_CONTROL, "off"),
  (header::X_XSS_PROTECTION, "0"),
  (
    header::STRICT_TRANSPORT_SECURITY,
    "max-age=15552000; includeSubDomains",
  ),
];

/// The API router wrapped in CORS, security headers and request tracing.
pub fn app<S>(config: &ServerConfig, state: AppState<S>) -> Result<Router>
where
  S: CustomerStore + 'static,
{
  let mut router = imob_api::router(state).layer(cors_layer(&config.cors_origin)?);
  for (name, value) in SECURITY_HEADERS {
    router = router.layer(SetResponseHeaderLayer::if_not_present(
      name,
      HeaderValue::from_static(value),
    ));
  }
  Ok(router.layer(TraceLayer::new_for_http()))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
