//! Customer types (the only persisted entity) and the field constraints
//! every write must satisfy.
//!
//! The types here are plain data. Normalisation and constraint checks are
//! free functions so that storage backends can run them at the write boundary
//! regardless of what the HTTP layer already checked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Limits ──────────────────────────────────────────────────────────────────

/// Exact length of the external document number.
pub const DOCUMENT_LEN: usize = 11;
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;
pub const BIO_MAX_LEN: usize = 500;

// ─── Role ────────────────────────────────────────────────────────────────────

/// What a customer is allowed to do in the wider system.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::AsRefStr,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  Agent,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Optional descriptive data embedded in a customer record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:  Option<String>,
  /// Reference to an avatar image (usually a URL).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bio:    Option<String>,
}

// ─── Customer ────────────────────────────────────────────────────────────────

/// A persisted customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  /// Store-generated identifier.
  pub id:         Uuid,
  /// External 11-character document number; immutable after creation.
  pub document:   String,
  pub name:       String,
  /// Always stored trimmed and lowercased.
  pub email:      String,
  pub role:       Role,
  /// `false` marks a soft-deleted record.
  pub is_active:  bool,
  pub profile:    Profile,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::CustomerStore::create`].
/// `id` and both timestamps are always set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
  pub document:  String,
  pub name:      String,
  pub email:     String,
  pub role:      Role,
  pub is_active: bool,
  pub profile:   Profile,
}

impl NewCustomer {
  /// Convenience constructor with `role`, `is_active` and `profile` set to
  /// their defaults.
  pub fn new(
    document: impl Into<String>,
    name: impl Into<String>,
    email: impl Into<String>,
  ) -> Self {
    Self {
      document:  document.into(),
      name:      name.into(),
      email:     email.into(),
      role:      Role::default(),
      is_active: true,
      profile:   Profile::default(),
    }
  }
}

/// A partial update. `None` leaves the stored value untouched; a present
/// `profile` replaces the embedded profile as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerPatch {
  pub name:      Option<String>,
  pub email:     Option<String>,
  pub role:      Option<Role>,
  pub is_active: Option<bool>,
  pub profile:   Option<Profile>,
}

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Trim and lowercase an email address the way it is stored and indexed.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

fn trim_opt(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_owned())
}

/// Apply the storage normalisation rules: trimmed strings, lowercased email.
/// `bio` is kept verbatim.
pub fn normalize(input: NewCustomer) -> NewCustomer {
  NewCustomer {
    document:  input.document.trim().to_owned(),
    name:      input.name.trim().to_owned(),
    email:     normalize_email(&input.email),
    role:      input.role,
    is_active: input.is_active,
    profile:   Profile {
      phone:  trim_opt(input.profile.phone),
      avatar: trim_opt(input.profile.avatar),
      bio:    input.profile.bio,
    },
  }
}

/// Merge `patch` over the mutable fields of `existing`.
///
/// The result carries the existing document number, so running [`check`] on
/// it re-validates the complete record rather than just the changed fields.
pub fn apply_patch(existing: &Customer, patch: CustomerPatch) -> NewCustomer {
  NewCustomer {
    document:  existing.document.clone(),
    name:      patch.name.unwrap_or_else(|| existing.name.clone()),
    email:     patch.email.unwrap_or_else(|| existing.email.clone()),
    role:      patch.role.unwrap_or(existing.role),
    is_active: patch.is_active.unwrap_or(existing.is_active),
    profile:   patch.profile.unwrap_or_else(|| existing.profile.clone()),
  }
}

// ─── Constraints ─────────────────────────────────────────────────────────────

/// Check every field-level constraint on already-normalised input and return
/// all violations. An empty vector means the record may be written.
pub fn check(fields: &NewCustomer) -> Vec<String> {
  let mut violations = Vec::new();

  if fields.document.is_empty() {
    violations.push("Document is required".to_owned());
  } else if fields.document.chars().count() != DOCUMENT_LEN {
    violations.push(format!(
      "Document must be exactly {DOCUMENT_LEN} characters long"
    ));
  }

  let name_len = fields.name.chars().count();
  if name_len == 0 {
    violations.push("Name is required".to_owned());
  } else if name_len < NAME_MIN_LEN {
    violations.push(format!(
      "Name must be at least {NAME_MIN_LEN} characters long"
    ));
  } else if name_len > NAME_MAX_LEN {
    violations.push(format!("Name cannot exceed {NAME_MAX_LEN} characters"));
  }

  if fields.email.is_empty() {
    violations.push("Email is required".to_owned());
  } else if !is_valid_email(&fields.email) {
    violations.push("Please enter a valid email".to_owned());
  }

  if let Some(bio) = &fields.profile.bio
    && bio.chars().count() > BIO_MAX_LEN
  {
    violations.push(format!("Bio cannot exceed {BIO_MAX_LEN} characters"));
  }

  violations
}

fn is_word(c: char) -> bool { c.is_ascii_alphanumeric() || c == '_' }

/// Word runs separated by single `.` or `-`, with no separator at either end.
fn is_dotted_words(s: &str) -> bool {
  !s.is_empty()
    && s
      .split(['.', '-'])
      .all(|run| !run.is_empty() && run.chars().all(is_word))
}

/// Shape check for `local@domain.tld`: word characters with single `.`/`-`
/// separators on both sides and a final label of at least two letters.
/// TLD length has no upper bound (`.agency` passes); digits never pass.
pub fn is_valid_email(email: &str) -> bool {
  let Some((local, domain)) = email.split_once('@') else {
    return false;
  };
  let Some((_, tld)) = domain.rsplit_once('.') else {
    return false;
  };
  is_dotted_words(local)
    && is_dotted_words(domain)
    && tld.len() >= 2
    && tld.chars().all(|c| c.is_ascii_alphabetic())
}
