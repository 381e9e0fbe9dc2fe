//! Fixed-credential identity provider for tests and local development.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use portcullis_core::types::AuthUser;

use crate::{IdentityProvider, ProviderError};

/// In-memory provider with a fixed email -> password table.
///
/// Can be flipped into an "unavailable" mode to exercise the
/// transport-failure branch (which must not count against the lockout).
#[derive(Debug, Default)]
pub struct StaticProvider {
    credentials: Mutex<HashMap<String, String>>,
    current: Mutex<Option<AuthUser>>,
    unavailable: AtomicBool,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a valid email/password pair.
    pub fn with_user(self, email: &str, password: &str) -> Self {
        self.credentials
            .lock()
            .unwrap()
            .insert(email.to_string(), password.to_string());
        self
    }

    /// Simulate the provider being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of sign-out calls is not tracked here; tests that need it
    /// wrap the provider. This only reports whether someone is signed in.
    pub fn signed_in(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }
}

#[async_trait]
impl IdentityProvider for StaticProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ProviderError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("provider offline".into()));
        }

        let matches = self
            .credentials
            .lock()
            .unwrap()
            .get(email)
            .is_some_and(|stored| stored == password);

        if !matches {
            return Err(ProviderError::InvalidCredentials);
        }

        let user = AuthUser {
            id: format!("user-{email}"),
            email: email.to_string(),
        };
        *self.current.lock().unwrap() = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if self.unavailable.load(Ordering::SeqCst) {
            // Even when sign-out fails, callers clear local state.
            return Err(ProviderError::Unavailable("provider offline".into()));
        }
        *self.current.lock().unwrap() = None;
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<AuthUser>, ProviderError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("provider offline".into()));
        }
        Ok(self.current.lock().unwrap().clone())
    }
}
