//! Handlers for the `/auth` resource (login, logout, session, lockout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use portcullis_core::error::CoreError;
use portcullis_core::types::{format_countdown, AuthUser, EpochMs};
use portcullis_guard::{LoginFailure, SessionState};
use portcullis_provider::ProviderError;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: AuthUser,
    pub session: SessionInfo,
}

/// Session window snapshot embedded in auth and session responses.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub state: SessionState,
    /// Absolute expiry, epoch milliseconds; absent with no session.
    pub expires_at: Option<EpochMs>,
    pub remaining_ms: i64,
    /// `M:SS` countdown string as shown in the admin header.
    pub countdown: String,
    /// True once the warning window has been entered.
    pub warning: bool,
}

/// Response body for `GET /auth/lockout`.
#[derive(Debug, Serialize)]
pub struct LockoutStatus {
    pub locked: bool,
    pub remaining_ms: i64,
    pub countdown: String,
    pub failed_attempts: u32,
}

impl SessionInfo {
    fn snapshot(state: &AppState) -> Self {
        let session_state = state.session.state();
        let remaining_ms = state.session.remaining_ms();
        Self {
            state: session_state,
            expires_at: state.session.session_end(),
            remaining_ms,
            countdown: format_countdown(remaining_ms),
            warning: session_state == SessionState::Warning,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password, gated by the lockout tracker.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    // 1. Reject up front while locked out; the provider is never contacted.
    state.tracker.precheck()?;

    // 2. Delegate the credential check to the identity provider.
    match state.provider.sign_in(&input.email, &input.password).await {
        Ok(user) => {
            // 3a. Success: reset the failure counter and open a session window.
            state.tracker.record_success();
            state.session.start();
            tracing::info!(email = %user.email, "Admin login succeeded");

            Ok(Json(DataResponse {
                data: LoginResponse {
                    user,
                    session: SessionInfo::snapshot(&state),
                },
            }))
        }
        Err(ProviderError::InvalidCredentials) => {
            // 3b. Structured rejection: counts against the lockout. The
            // increment and any lockout trigger happen atomically.
            match state.tracker.record_failure() {
                LoginFailure::LockedOut { remaining_ms } => {
                    Err(CoreError::LockedOut { remaining_ms }.into())
                }
                LoginFailure::InvalidCredentials { attempts_remaining } => {
                    Err(CoreError::InvalidCredentials { attempts_remaining }.into())
                }
            }
        }
        Err(ProviderError::Unavailable(msg)) => {
            // 3c. Transport failure: the provider was never meaningfully
            // reached, so the attempt is not counted.
            Err(CoreError::ProviderUnavailable(msg).into())
        }
    }
}

/// POST /api/v1/auth/logout
///
/// Clear the session window and sign out of the identity provider.
/// Local state is cleared even when the provider call fails -- a broken
/// provider must never trap a user in a session. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.session.clear();

    if let Err(e) = state.provider.sign_out().await {
        tracing::warn!(error = %e, "Provider sign-out failed; local session cleared anyway");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/session
///
/// Current session window: state, remaining time, warning flag.
pub async fn session_status(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SessionInfo>>> {
    Ok(Json(DataResponse {
        data: SessionInfo::snapshot(&state),
    }))
}

/// POST /api/v1/auth/session/extend
///
/// Explicitly extend the session to a full window from now. 401 with
/// `NO_SESSION` when nothing is active.
pub async fn extend_session(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<SessionInfo>>> {
    state.session.extend()?;
    Ok(Json(DataResponse {
        data: SessionInfo::snapshot(&state),
    }))
}

/// GET /api/v1/auth/lockout
///
/// Lockout countdown for the login form (disable inputs while locked).
pub async fn lockout_status(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<LockoutStatus>>> {
    let remaining_ms = state.tracker.remaining_lockout_ms();
    Ok(Json(DataResponse {
        data: LockoutStatus {
            locked: state.tracker.is_locked_out(),
            remaining_ms,
            countdown: format_countdown(remaining_ms),
            failed_attempts: state.tracker.failed_attempts(),
        },
    }))
}
