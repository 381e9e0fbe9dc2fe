//! Provider identity watcher.
//!
//! The browser SDK pushes auth-state changes; a service has no push
//! channel, so this task polls the provider's current identity at a coarse
//! interval and tears down the local session window when the provider no
//! longer holds one (revoked token, deleted user). The check is idempotent:
//! clearing an already-clear session is a no-op, and transient provider
//! outages are ignored rather than treated as a sign-out.

use std::sync::Arc;
use std::time::Duration;

use portcullis_guard::{SessionManager, SessionState};
use portcullis_provider::IdentityProvider;
use tokio_util::sync::CancellationToken;

/// How often the provider identity is re-checked.
const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Run the identity watcher until `cancel` is triggered.
pub async fn run(
    session: Arc<SessionManager>,
    provider: Arc<dyn IdentityProvider>,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = POLL_INTERVAL.as_secs(),
        "Identity watcher started"
    );

    let mut interval = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Identity watcher stopping");
                break;
            }
            _ = interval.tick() => {
                if session.state() == SessionState::NoSession {
                    continue;
                }
                match provider.get_session().await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        tracing::warn!("Provider no longer holds an identity; clearing local session");
                        session.clear();
                    }
                    Err(e) => {
                        // Unreachable provider is not a sign-out.
                        tracing::debug!(error = %e, "Identity check skipped");
                    }
                }
            }
        }
    }
}
