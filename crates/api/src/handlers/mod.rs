//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the guard state machines in `portcullis_guard` and
//! map errors via [`crate::error::AppError`].

pub mod auth;
