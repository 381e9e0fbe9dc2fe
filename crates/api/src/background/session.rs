//! Session countdown ticker.
//!
//! Drives the `Warning` and `Expired` transitions at 1-second resolution.
//! On expiry it performs the automatic logout: the session manager has
//! already cleared local state, and this task notifies the identity
//! provider. A failing provider sign-out is logged and otherwise ignored
//! (fail open -- never trap a user in a broken session).

use std::sync::Arc;

use portcullis_guard::{SessionManager, SessionTick};
use portcullis_provider::IdentityProvider;
use tokio_util::sync::CancellationToken;

use super::TICK_INTERVAL;

/// Run the session ticker until `cancel` is triggered.
pub async fn run(
    session: Arc<SessionManager>,
    provider: Arc<dyn IdentityProvider>,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = TICK_INTERVAL.as_secs(), "Session ticker started");

    let mut interval = tokio::time::interval(TICK_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session ticker stopping");
                break;
            }
            _ = interval.tick() => {
                match session.tick() {
                    SessionTick::Idle => {}
                    SessionTick::EnteredWarning { remaining_ms } => {
                        // The extend/logout prompt is surfaced to clients
                        // through GET /auth/session's `warning` flag.
                        tracing::warn!(remaining_ms, "Session expiring soon");
                    }
                    SessionTick::Expired => {
                        if let Err(e) = provider.sign_out().await {
                            tracing::warn!(error = %e, "Provider sign-out failed during auto-logout");
                        }
                        tracing::info!("Session expired; automatic logout completed");
                    }
                }
            }
        }
    }
}
