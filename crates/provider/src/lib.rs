//! Identity provider boundary.
//!
//! The guard never verifies credentials itself: it delegates to an external
//! identity provider behind [`IdentityProvider`] and only wraps the result
//! with its own lockout/session timing policy.
//!
//! Two implementations ship here:
//!
//! - [`http::HttpProvider`] -- a GoTrue-style password-grant client
//!   (the hosted-auth service the admin panel talks to in production).
//! - [`fixed::StaticProvider`] -- a fixed credential table for tests and
//!   local development.

pub mod fixed;
pub mod http;

use async_trait::async_trait;
use portcullis_core::types::AuthUser;

/// Errors crossing the provider boundary.
///
/// The two variants are deliberately distinct and must stay that way: a
/// structured credential rejection counts against the login lockout, while
/// a transport-level failure does not (the provider was never meaningfully
/// reached).
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider evaluated the credentials and rejected them.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The provider could not be reached or answered with an unexpected
    /// failure (network, 5xx, malformed body).
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// External authentication service, consumed as a black box.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials, establishing a provider-side session on success.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ProviderError>;

    /// Tear down the provider-side session. Callers treat failures as
    /// non-fatal: local session state is cleared regardless.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// The currently signed-in identity, if the provider still holds one.
    async fn get_session(&self) -> Result<Option<AuthUser>, ProviderError>;
}
