use std::sync::Arc;

use portcullis_guard::{AttemptTracker, SessionManager};
use portcullis_provider::IdentityProvider;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Login failure counter and lockout.
    pub tracker: Arc<AttemptTracker>,
    /// Session window and warning/expiry transitions.
    pub session: Arc<SessionManager>,
    /// External identity provider (credential verification only).
    pub provider: Arc<dyn IdentityProvider>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
