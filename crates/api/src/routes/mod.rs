pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login            POST  attempt login (lockout-gated)
/// /auth/logout           POST  clear session, provider sign-out
/// /auth/session          GET   session window snapshot
/// /auth/session/extend   POST  reset window to a full duration
/// /auth/lockout          GET   lockout countdown for the login form
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/auth", auth::router())
}
