//! Signed, time-limited identity tokens.
//!
//! Tokens are compact HS256 JWTs:
//!
//! ```text
//! base64url({"alg":"HS256","typ":"JWT"}) . base64url(claims) . base64url(HMAC-SHA256)
//! ```
//!
//! Verification is stateless: the only shared state is the immutable secret
//! and the issuer/audience/TTL configuration loaded at startup.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
const ALGORITHM: &str = "HS256";

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_ISSUER: &str = "imob-express";
pub const DEFAULT_AUDIENCE: &str = "imob-express-users";

/// The payload carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  /// Subject identifier.
  pub id:    String,
  pub email: String,
  /// Issued-at, seconds since the Unix epoch.
  pub iat:   i64,
  /// Expiry, seconds since the Unix epoch.
  pub exp:   i64,
  pub iss:   String,
  pub aud:   String,
}

/// Why a token was rejected. Messages never mention the secret or which
/// signing step failed.
#[derive(Debug, Error)]
pub enum TokenError {
  /// Malformed, wrongly signed, or issued for another issuer/audience.
  #[error("invalid token")]
  Invalid,

  #[error("token expired")]
  Expired,

  #[error("failed to encode token claims: {0}")]
  Encoding(#[from] serde_json::Error),
}

/// Signing configuration. `Debug` redacts the secret.
#[derive(Clone)]
pub struct TokenConfig {
  pub secret:   Vec<u8>,
  pub ttl:      Duration,
  pub issuer:   String,
  pub audience: String,
}

impl TokenConfig {
  /// Configuration with the default TTL, issuer and audience.
  pub fn new(secret: impl Into<Vec<u8>>) -> Self {
    Self {
      secret:   secret.into(),
      ttl:      DEFAULT_TTL,
      issuer:   DEFAULT_ISSUER.to_owned(),
      audience: DEFAULT_AUDIENCE.to_owned(),
    }
  }

  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }
}

impl std::fmt::Debug for TokenConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenConfig")
      .field("secret", &"[REDACTED]")
      .field("ttl", &self.ttl)
      .field("issuer", &self.issuer)
      .field("audience", &self.audience)
      .finish()
  }
}

/// Issues and verifies identity tokens.
#[derive(Debug, Clone)]
pub struct TokenService {
  config: TokenConfig,
}

impl TokenService {
  pub fn new(config: TokenConfig) -> Self { Self { config } }

  pub fn config(&self) -> &TokenConfig { &self.config }

  /// Issue a token for `subject_id` valid for the configured TTL from now.
  pub fn issue(&self, subject_id: &str, email: &str) -> Result<String, TokenError> {
    self.issue_at(subject_id, email, Utc::now())
  }

  /// Issue a token as if the current time were `now`.
  pub fn issue_at(
    &self,
    subject_id: &str,
    email: &str,
    now: DateTime<Utc>,
  ) -> Result<String, TokenError> {
    let ttl = i64::try_from(self.config.ttl.as_secs()).unwrap_or(i64::MAX);
    let iat = now.timestamp();
    let claims = Claims {
      id: subject_id.to_owned(),
      email: email.to_owned(),
      iat,
      exp: iat.saturating_add(ttl),
      iss: self.config.issuer.clone(),
      aud: self.config.audience.clone(),
    };

    let signing_input = format!(
      "{}.{}",
      B64.encode(HEADER),
      B64.encode(serde_json::to_vec(&claims)?)
    );
    let signature = self
      .mac()?
      .chain_update(signing_input.as_bytes())
      .finalize()
      .into_bytes();
    Ok(format!("{signing_input}.{}", B64.encode(signature)))
  }

  /// Verify `token` against the current time.
  pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
    self.verify_at(token, Utc::now())
  }

  /// Verify `token` as if the current time were `now`.
  ///
  /// The signature is checked before any claim is trusted; a token is expired
  /// once `now` reaches its `exp`.
  pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
      (parts.next(), parts.next(), parts.next(), parts.next())
    else {
      return Err(TokenError::Invalid);
    };

    #[derive(Deserialize)]
    struct Header {
      alg: String,
    }
    let Header { alg } = decode_segment::<Header>(header)?;
    if alg != ALGORITHM {
      return Err(TokenError::Invalid);
    }

    let signature = B64.decode(signature).map_err(|_| TokenError::Invalid)?;
    let mut mac = self.mac()?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    mac
      .verify_slice(&signature)
      .map_err(|_| TokenError::Invalid)?;

    let claims: Claims = decode_segment(payload)?;
    if claims.iss != self.config.issuer || claims.aud != self.config.audience {
      return Err(TokenError::Invalid);
    }
    if now.timestamp() >= claims.exp {
      return Err(TokenError::Expired);
    }
    Ok(claims)
  }

  fn mac(&self) -> Result<HmacSha256, TokenError> {
    // HMAC accepts keys of any length.
    HmacSha256::new_from_slice(&self.config.secret).map_err(|_| TokenError::Invalid)
  }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, TokenError> {
  let bytes = B64.decode(segment).map_err(|_| TokenError::Invalid)?;
  serde_json::from_slice(&bytes).map_err(|_| TokenError::Invalid)
}
