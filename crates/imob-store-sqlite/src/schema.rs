//! SQL schema for the Imob SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per customer. The implicit rowid gives insertion order.
CREATE TABLE IF NOT EXISTS customers (
    customer_id  TEXT PRIMARY KEY,
    document     TEXT NOT NULL UNIQUE CHECK (length(document) = 11),
    name         TEXT NOT NULL,
    email        TEXT NOT NULL UNIQUE,   -- trimmed + lowercased before insert
    role         TEXT NOT NULL DEFAULT 'agent' CHECK (role IN ('admin', 'agent')),
    is_active    INTEGER NOT NULL DEFAULT 1,
    profile_json TEXT NOT NULL DEFAULT '{}',
    created_at   TEXT NOT NULL,          -- ISO 8601 UTC; server-assigned
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS customers_role_idx   ON customers(role);
CREATE INDEX IF NOT EXISTS customers_active_idx ON customers(is_active);

PRAGMA user_version = 1;
";
