//! GoTrue-style HTTP identity provider client.
//!
//! Speaks the hosted-auth password grant: `POST /token?grant_type=password`
//! to sign in, `POST /logout` to revoke, `GET /user` to fetch the current
//! identity. The access token from the last sign-in is held in memory and
//! attached as a bearer credential to the other calls.

use std::sync::Mutex;

use async_trait::async_trait;
use portcullis_core::types::AuthUser;
use serde::Deserialize;

use crate::{IdentityProvider, ProviderError};

/// Password-grant response body (the fields the guard cares about).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: ProviderUser,
}

/// Provider-side user record.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    email: String,
}

/// HTTP client for the external identity provider.
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Bearer token from the most recent successful sign-in.
    access_token: Mutex<Option<String>>,
}

impl HttpProvider {
    /// * `base_url` - auth endpoint root, e.g. `https://xyz.supabase.co/auth/v1`.
    /// * `api_key` - project API key sent on every request.
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            access_token: Mutex::new(None),
        }
    }

    fn bearer(&self) -> Option<String> {
        self.access_token.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for HttpProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, ProviderError> {
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self
            .client
            .post(format!("{}/token?grant_type=password", self.base_url))
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            // 400/401/422: the provider evaluated and rejected the
            // credentials. This is the branch that counts against lockout.
            tracing::info!(%status, "Provider rejected credentials");
            return Err(ProviderError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body, "Provider sign-in failed");
            return Err(ProviderError::Unavailable(format!(
                "sign-in returned {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("malformed token response: {e}")))?;

        *self.access_token.lock().unwrap() = Some(token.access_token);

        Ok(AuthUser {
            id: token.user.id,
            email: token.user.email,
        })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let Some(token) = self.access_token.lock().unwrap().take() else {
            return Ok(());
        };

        let response = self
            .client
            .post(format!("{}/logout", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "logout returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<AuthUser>, ProviderError> {
        let Some(token) = self.bearer() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(format!("{}/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        if response.status().is_client_error() {
            // Token revoked or expired provider-side.
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "user lookup returned {}",
                response.status()
            )));
        }

        let user: ProviderUser = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("malformed user response: {e}")))?;

        Ok(Some(AuthUser {
            id: user.id,
            email: user.email,
        }))
    }
}
