//! Shared domain types for the portcullis admin access guard.
//!
//! - [`error`] -- the guard error taxonomy ([`error::CoreError`]).
//! - [`time`] -- injectable clock abstraction for deterministic tests.
//! - [`types`] -- timestamp aliases, provider identity, countdown formatting.

pub mod error;
pub mod time;
pub mod types;
