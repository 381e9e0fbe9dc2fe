//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login           -> login
/// POST /logout          -> logout
/// GET  /session         -> session_status
/// POST /session/extend  -> extend_session
/// GET  /lockout         -> lockout_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session_status))
        .route("/session/extend", post(auth::extend_session))
        .route("/lockout", get(auth::lockout_status))
}
