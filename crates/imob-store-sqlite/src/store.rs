//! The SQLite implementation of [`CustomerStore`].

use std::{path::Path, time::Duration};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use imob_core::{
  customer::{self, Customer, CustomerPatch, NewCustomer, Role},
  store::CustomerStore,
};

use crate::{
  Error, Result,
  encode::{
    CUSTOMER_COLUMNS, RawCustomer, encode_dt, encode_profile, encode_role,
    encode_uuid,
  },
  schema::SCHEMA,
};

/// Busy timeout applied when the caller does not pick one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Imob customer store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with the default busy timeout.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT).await
  }

  /// Open (or create) a store at `path`. Writes blocked on a lock for longer
  /// than `busy_timeout` fail instead of waiting forever.
  pub async fn open_with_timeout(
    path: impl AsRef<Path>,
    busy_timeout: Duration,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init(busy_timeout).await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init(DEFAULT_BUSY_TIMEOUT).await?;
    Ok(store)
  }

  async fn init(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Normalise and check a full set of fields, failing with every violation.
  fn prepare(fields: NewCustomer) -> Result<NewCustomer> {
    let fields = customer::normalize(fields);
    let violations = customer::check(&fields);
    if violations.is_empty() {
      Ok(fields)
    } else {
      Err(imob_core::Error::Validation(violations).into())
    }
  }

  async fn insert(&self, c: &Customer) -> Result<()> {
    let id_str       = encode_uuid(c.id);
    let document     = c.document.clone();
    let name         = c.name.clone();
    let email        = c.email.clone();
    let role_str     = encode_role(c.role);
    let is_active    = c.is_active;
    let profile_json = encode_profile(&c.profile)?;
    let created_str  = encode_dt(c.created_at);
    let updated_str  = encode_dt(c.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO customers (
             customer_id, document, name, email, role,
             is_active, profile_json, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            document,
            name,
            email,
            role_str,
            is_active,
            profile_json,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from_write)
  }

  async fn query_active(&self, role: Option<Role>) -> Result<Vec<Customer>> {
    let role_str = role.map(encode_role);

    let raws: Vec<RawCustomer> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CUSTOMER_COLUMNS} FROM customers
           WHERE is_active = 1 AND (?1 IS NULL OR role = ?1)
           ORDER BY rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![role_str], RawCustomer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCustomer::into_customer).collect()
  }
}

// ─── CustomerStore impl ──────────────────────────────────────────────────────

impl CustomerStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create(&self, input: NewCustomer) -> Result<Customer> {
    let fields = Self::prepare(input)?;
    let now = Utc::now();
    let customer = Customer {
      id:         Uuid::new_v4(),
      document:   fields.document,
      name:       fields.name,
      email:      fields.email,
      role:       fields.role,
      is_active:  fields.is_active,
      profile:    fields.profile,
      created_at: now,
      updated_at: now,
    };

    self.insert(&customer).await?;
    Ok(customer)
  }

  async fn update(&self, id: Uuid, patch: CustomerPatch) -> Result<Customer> {
    let existing = self.get(id).await?;
    let fields = Self::prepare(customer::apply_patch(&existing, patch))?;

    let updated = Customer {
      id,
      document: existing.document,
      name: fields.name,
      email: fields.email,
      role: fields.role,
      is_active: fields.is_active,
      profile: fields.profile,
      created_at: existing.created_at,
      updated_at: Utc::now(),
    };

    let id_str       = encode_uuid(id);
    let name         = updated.name.clone();
    let email        = updated.email.clone();
    let role_str     = encode_role(updated.role);
    let is_active    = updated.is_active;
    let profile_json = encode_profile(&updated.profile)?;
    let updated_str  = encode_dt(updated.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE customers
           SET name = ?2, email = ?3, role = ?4, is_active = ?5,
               profile_json = ?6, updated_at = ?7
           WHERE customer_id = ?1",
          rusqlite::params![
            id_str,
            name,
            email,
            role_str,
            is_active,
            profile_json,
            updated_str,
          ],
        )?)
      })
      .await
      .map_err(Error::from_write)?;

    // Hard-deleted between the read and the write.
    if changed == 0 {
      return Err(imob_core::Error::CustomerNotFound(id).into());
    }
    Ok(updated)
  }

  async fn soft_delete(&self, id: Uuid) -> Result<Customer> {
    let id_str      = encode_uuid(id);
    let updated_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE customers SET is_active = 0, updated_at = ?2
           WHERE customer_id = ?1",
          rusqlite::params![id_str, updated_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(imob_core::Error::CustomerNotFound(id).into());
    }
    self.get(id).await
  }

  async fn hard_delete(&self, id: Uuid) -> Result<Customer> {
    let existing = self.get(id).await?;
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM customers WHERE customer_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(imob_core::Error::CustomerNotFound(id).into());
    }
    Ok(existing)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get(&self, id: Uuid) -> Result<Customer> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCustomer> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE customer_id = ?1"
              ),
              rusqlite::params![id_str],
              RawCustomer::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .ok_or(Error::Core(imob_core::Error::CustomerNotFound(id)))?
      .into_customer()
  }

  async fn list_active(&self) -> Result<Vec<Customer>> {
    self.query_active(None).await
  }

  async fn list_by_role(&self, role: Role) -> Result<Vec<Customer>> {
    self.query_active(Some(role)).await
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Customer>> {
    let email = customer::normalize_email(email);

    let raw: Option<RawCustomer> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = ?1"),
              rusqlite::params![email],
              RawCustomer::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCustomer::into_customer).transpose()
  }

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
