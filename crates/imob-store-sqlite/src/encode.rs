//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The embedded profile is
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use imob_core::customer::{Customer, Profile, Role};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::Admin => "admin",
    Role::Agent => "agent",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::UnknownRole(s.to_owned()))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

pub fn encode_profile(p: &Profile) -> Result<String> {
  Ok(serde_json::to_string(p)?)
}

pub fn decode_profile(s: &str) -> Result<Profile> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawCustomer::from_row`].
pub const CUSTOMER_COLUMNS: &str = "customer_id, document, name, email, role, \
                                    is_active, profile_json, created_at, updated_at";

/// Raw values read directly from a `customers` row.
pub struct RawCustomer {
  pub customer_id:  String,
  pub document:     String,
  pub name:         String,
  pub email:        String,
  pub role:         String,
  pub is_active:    bool,
  pub profile_json: String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawCustomer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      customer_id:  row.get(0)?,
      document:     row.get(1)?,
      name:         row.get(2)?,
      email:        row.get(3)?,
      role:         row.get(4)?,
      is_active:    row.get(5)?,
      profile_json: row.get(6)?,
      created_at:   row.get(7)?,
      updated_at:   row.get(8)?,
    })
  }

  pub fn into_customer(self) -> Result<Customer> {
    Ok(Customer {
      id:         decode_uuid(&self.customer_id)?,
      document:   self.document,
      name:       self.name,
      email:      self.email,
      role:       decode_role(&self.role)?,
      is_active:  self.is_active,
      profile:    decode_profile(&self.profile_json)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
