//! The `CustomerStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `imob-store-sqlite`).
//! Higher layers (`imob-api`, `imob-server`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::customer::{Customer, CustomerPatch, NewCustomer, Role};

/// Abstraction over a customer store backend.
///
/// Implementations own persistence of [`Customer`] records exclusively. Every
/// write normalises its input and re-runs
/// [`customer::check`](crate::customer::check) before touching storage, so
/// callers cannot bypass the field constraints with a partial update.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CustomerStore: Send + Sync {
  /// Backend error type. Converting it into [`crate::Error`] must preserve
  /// the not-found, duplicate-key and validation kinds.
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist a new customer. Fails with `DuplicateKey` if the document or
  /// email is already taken, or `Validation` if a field constraint fails.
  fn create(
    &self,
    input: NewCustomer,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  /// Apply a partial update and refresh `updated_at`.
  fn update(
    &self,
    id: Uuid,
    patch: CustomerPatch,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  /// Mark a customer inactive. The record stays retrievable by id.
  fn soft_delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  /// Erase a customer and return its last stored value.
  fn hard_delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve a customer by id, active or not.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  /// All active customers in insertion order.
  fn list_active(
    &self,
  ) -> impl Future<Output = Result<Vec<Customer>, Self::Error>> + Send + '_;

  /// Active customers with the given role, in insertion order.
  fn list_by_role(
    &self,
    role: Role,
  ) -> impl Future<Output = Result<Vec<Customer>, Self::Error>> + Send + '_;

  /// Look a customer up by email; the address is normalised first.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Customer>, Self::Error>> + Send + 'a;

  /// Round-trip to the backing database.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
