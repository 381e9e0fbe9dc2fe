//! Lockout countdown ticker.
//!
//! Clears an elapsed lockout at 1-second resolution so the login form's
//! countdown reaches zero and unlocks without a user action -- not only
//! lazily on the next attempt. The tick is a no-op while no lockout is in
//! force, so the task can live for the whole process.

use std::sync::Arc;

use portcullis_guard::AttemptTracker;
use tokio_util::sync::CancellationToken;

use super::TICK_INTERVAL;

/// Run the lockout ticker until `cancel` is triggered.
pub async fn run(tracker: Arc<AttemptTracker>, cancel: CancellationToken) {
    tracing::info!(interval_secs = TICK_INTERVAL.as_secs(), "Lockout ticker started");

    let mut interval = tokio::time::interval(TICK_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Lockout ticker stopping");
                break;
            }
            _ = interval.tick() => {
                if tracker.tick() {
                    tracing::info!("Lockout elapsed; login re-enabled");
                }
            }
        }
    }
}
