//! Core types and trait definitions for the Imob customer service.
//!
//! This crate has no HTTP or database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod customer;
pub mod error;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
