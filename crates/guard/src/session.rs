//! Session lifecycle: a fixed 30-minute window with a 5-minute warning
//! tail, explicit extension, and expiry-driven logout.
//!
//! States: `NoSession -> Active -> Warning -> Expired`, with `Extend`
//! re-entering `Active`. A 1-second ticker drives the `Warning` and
//! `Expired` transitions; the warning fires at most once per window so the
//! extend prompt is not re-raised after the user dismisses it.
//!
//! The guard's window is independent of the identity provider's own token
//! expiry: the provider session is only torn down when this window ends.

use std::sync::{Arc, Mutex};

use portcullis_core::error::CoreError;
use portcullis_core::time::Clock;
use portcullis_core::types::EpochMs;
use serde::Serialize;

use crate::store::{self, StateStore, SESSION_END_KEY};

/// Session window thresholds.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    /// Full session window in milliseconds.
    pub session_ms: i64,
    /// Warning tail: when remaining time drops to this, prompt the user.
    pub warning_ms: i64,
}

impl Default for SessionPolicy {
    /// 30-minute window, warning at 5 minutes remaining.
    fn default() -> Self {
        Self {
            session_ms: 30 * 60 * 1000,
            warning_ms: 5 * 60 * 1000,
        }
    }
}

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NoSession,
    Active,
    Warning,
    Expired,
}

/// What a 1-second tick observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTick {
    /// Nothing to do.
    Idle,
    /// Crossed into the warning window; raise the extend/logout prompt.
    /// Emitted at most once per session window.
    EnteredWarning { remaining_ms: i64 },
    /// The window elapsed; the caller must perform the logout. Emitted
    /// exactly once per expiry -- the session is already cleared when this
    /// is returned.
    Expired,
}

/// How a persisted session was brought back on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resumed {
    /// The stored deadline was still in the future; it is kept as-is.
    Restored { session_end: EpochMs },
    /// The stored deadline had already passed; a fresh full window is
    /// started instead of logging out. Upstream behavior, kept verbatim.
    Renewed { session_end: EpochMs },
}

#[derive(Debug, Default)]
struct SessionInner {
    session_end: Option<EpochMs>,
    warning_shown: bool,
}

/// Owns the session window and its persisted deadline.
pub struct SessionManager {
    policy: SessionPolicy,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    inner: Mutex<SessionInner>,
}

impl SessionManager {
    /// Create a manager with no session. Call [`SessionManager::resume`]
    /// to pick up a persisted window, or [`SessionManager::start`] after a
    /// fresh login.
    pub fn new(policy: SessionPolicy, store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            store,
            clock,
            inner: Mutex::new(SessionInner::default()),
        }
    }

    /// Begin a fresh window after a successful login.
    pub fn start(&self) -> EpochMs {
        let mut inner = self.inner.lock().unwrap();
        let session_end = self.clock.now_ms() + self.policy.session_ms;
        inner.session_end = Some(session_end);
        inner.warning_shown = false;
        self.store.set(SESSION_END_KEY, &session_end.to_string());
        tracing::info!(session_end, "Session started");
        session_end
    }

    /// Restore a persisted session deadline, if any.
    ///
    /// A stored deadline still in the future is restored unchanged. A
    /// stored deadline in the past silently starts a NEW full window
    /// rather than forcing a logout -- this weakens the expiry guarantee
    /// across restarts but matches the shipped behavior, so it is kept and
    /// logged loudly. Absent or malformed values leave the manager in
    /// `NoSession`.
    pub fn resume(&self) -> Option<Resumed> {
        let stored = store::read_i64(self.store.as_ref(), SESSION_END_KEY)?;
        let mut inner = self.inner.lock().unwrap();
        let now = self.clock.now_ms();

        if now < stored {
            inner.session_end = Some(stored);
            inner.warning_shown = false;
            tracing::info!(session_end = stored, "Session restored from persisted state");
            Some(Resumed::Restored {
                session_end: stored,
            })
        } else {
            let session_end = now + self.policy.session_ms;
            inner.session_end = Some(session_end);
            inner.warning_shown = false;
            self.store.set(SESSION_END_KEY, &session_end.to_string());
            tracing::warn!(
                stale_end = stored,
                session_end,
                "Persisted session had expired; granting a fresh window without re-authentication"
            );
            Some(Resumed::Renewed { session_end })
        }
    }

    /// Advance the state machine by one observation of the clock.
    pub fn tick(&self) -> SessionTick {
        let mut inner = self.inner.lock().unwrap();
        let Some(session_end) = inner.session_end else {
            return SessionTick::Idle;
        };
        let now = self.clock.now_ms();

        if now >= session_end {
            // Clear before reporting so a second tick cannot emit a second
            // logout.
            *inner = SessionInner::default();
            self.store.remove(SESSION_END_KEY);
            tracing::info!("Session expired");
            return SessionTick::Expired;
        }

        let remaining_ms = session_end - now;
        if remaining_ms <= self.policy.warning_ms && !inner.warning_shown {
            inner.warning_shown = true;
            tracing::info!(remaining_ms, "Session entering warning window");
            return SessionTick::EnteredWarning { remaining_ms };
        }

        SessionTick::Idle
    }

    /// Extend the current window to a full session length from now and
    /// clear the warning flag.
    pub fn extend(&self) -> Result<EpochMs, CoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.session_end.is_none() {
            return Err(CoreError::NoSession);
        }
        let session_end = self.clock.now_ms() + self.policy.session_ms;
        inner.session_end = Some(session_end);
        inner.warning_shown = false;
        self.store.set(SESSION_END_KEY, &session_end.to_string());
        tracing::info!(session_end, "Session extended");
        Ok(session_end)
    }

    /// Drop the session and its persisted deadline (explicit logout).
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = SessionInner::default();
        self.store.remove(SESSION_END_KEY);
    }

    /// `max(0, session_end - now)`; 0 with no session.
    pub fn remaining_ms(&self) -> i64 {
        let inner = self.inner.lock().unwrap();
        match inner.session_end {
            Some(end) => (end - self.clock.now_ms()).max(0),
            None => 0,
        }
    }

    /// Current observable state.
    pub fn state(&self) -> SessionState {
        let inner = self.inner.lock().unwrap();
        let Some(session_end) = inner.session_end else {
            return SessionState::NoSession;
        };
        let now = self.clock.now_ms();
        if now >= session_end {
            SessionState::Expired
        } else if session_end - now <= self.policy.warning_ms {
            SessionState::Warning
        } else {
            SessionState::Active
        }
    }

    /// The current deadline, if a session is active.
    pub fn session_end(&self) -> Option<EpochMs> {
        self.inner.lock().unwrap().session_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use portcullis_core::time::ManualClock;
    use crate::store::MemoryStore;

    const SESSION_MS: i64 = 30 * 60 * 1000;
    const WARNING_MS: i64 = 5 * 60 * 1000;

    fn manager() -> (SessionManager, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(
            SessionPolicy::default(),
            Arc::clone(&store) as Arc<dyn StateStore>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (manager, clock, store)
    }

    #[test]
    fn test_start_opens_full_window() {
        let (manager, clock, store) = manager();
        assert_eq!(manager.state(), SessionState::NoSession);
        assert_eq!(manager.remaining_ms(), 0);

        let end = manager.start();
        assert_eq!(end, clock.now_ms() + SESSION_MS);
        assert_eq!(manager.state(), SessionState::Active);
        assert_eq!(manager.remaining_ms(), SESSION_MS);
        assert_eq!(store.get(SESSION_END_KEY), Some(end.to_string()));
    }

    #[test]
    fn test_warning_enters_once_at_five_minutes() {
        let (manager, clock, _store) = manager();
        manager.start();

        // 25 minutes elapsed: exactly 5 minutes remain.
        clock.advance(SESSION_MS - WARNING_MS);
        assert_matches!(
            manager.tick(),
            SessionTick::EnteredWarning {
                remaining_ms: WARNING_MS
            }
        );
        assert_eq!(manager.state(), SessionState::Warning);

        // Subsequent ticks in the warning window do not re-raise the prompt.
        clock.advance(1_000);
        assert_eq!(manager.tick(), SessionTick::Idle);
        assert_eq!(manager.state(), SessionState::Warning);
    }

    #[test]
    fn test_extend_resets_window_and_warning() {
        let (manager, clock, _store) = manager();
        manager.start();
        clock.advance(SESSION_MS - WARNING_MS);
        assert_matches!(manager.tick(), SessionTick::EnteredWarning { .. });

        let end = manager.extend().expect("session is active");
        assert_eq!(end, clock.now_ms() + SESSION_MS);
        assert_eq!(manager.remaining_ms(), SESSION_MS);
        assert_eq!(manager.state(), SessionState::Active);

        // The warning is armed again for the new window.
        clock.advance(SESSION_MS - WARNING_MS);
        assert_matches!(manager.tick(), SessionTick::EnteredWarning { .. });
    }

    #[test]
    fn test_extend_without_session_is_rejected() {
        let (manager, _clock, _store) = manager();
        assert_matches!(manager.extend(), Err(CoreError::NoSession));
    }

    #[test]
    fn test_expiry_emits_exactly_one_logout() {
        let (manager, clock, store) = manager();
        manager.start();

        clock.advance(SESSION_MS - 1);
        assert_matches!(manager.tick(), SessionTick::Idle | SessionTick::EnteredWarning { .. });

        clock.advance(1);
        assert_eq!(manager.tick(), SessionTick::Expired);
        assert_eq!(manager.state(), SessionState::NoSession);
        assert_eq!(store.get(SESSION_END_KEY), None);

        // The follow-up tick observes no session; no second logout.
        assert_eq!(manager.tick(), SessionTick::Idle);
    }

    #[test]
    fn test_resume_restores_future_deadline() {
        let (manager, clock, store) = manager();
        let stored_end = clock.now_ms() + 10 * 60 * 1000;
        store.set(SESSION_END_KEY, &stored_end.to_string());

        assert_eq!(
            manager.resume(),
            Some(Resumed::Restored {
                session_end: stored_end
            })
        );
        assert_eq!(manager.session_end(), Some(stored_end));
        assert_eq!(manager.state(), SessionState::Active);
    }

    #[test]
    fn test_resume_renews_stale_deadline() {
        let (manager, clock, store) = manager();
        // Stored deadline 1 ms in the past: the session is silently
        // renewed with a fresh ~30-minute window, not logged out.
        let stale = clock.now_ms() - 1;
        store.set(SESSION_END_KEY, &stale.to_string());

        let expected_end = clock.now_ms() + SESSION_MS;
        assert_eq!(
            manager.resume(),
            Some(Resumed::Renewed {
                session_end: expected_end
            })
        );
        assert_eq!(manager.state(), SessionState::Active);
        assert_eq!(manager.remaining_ms(), SESSION_MS);
        assert_eq!(store.get(SESSION_END_KEY), Some(expected_end.to_string()));
    }

    #[test]
    fn test_resume_with_no_or_malformed_state() {
        let (manager, _clock, store) = manager();
        assert_eq!(manager.resume(), None);
        assert_eq!(manager.state(), SessionState::NoSession);

        store.set(SESSION_END_KEY, "three-o-clock");
        assert_eq!(manager.resume(), None);
        assert_eq!(manager.state(), SessionState::NoSession);
    }

    #[test]
    fn test_clear_drops_session_and_persisted_state() {
        let (manager, _clock, store) = manager();
        manager.start();
        assert!(store.get(SESSION_END_KEY).is_some());

        manager.clear();
        assert_eq!(manager.state(), SessionState::NoSession);
        assert_eq!(manager.remaining_ms(), 0);
        assert_eq!(store.get(SESSION_END_KEY), None);
    }

    #[test]
    fn test_remaining_is_monotone_under_ticks() {
        let (manager, clock, _store) = manager();
        manager.start();

        let mut last = manager.remaining_ms();
        for _ in 0..30 {
            clock.advance(60_000);
            manager.tick();
            let remaining = manager.remaining_ms();
            assert!(remaining <= last);
            last = remaining;
        }
        assert_eq!(last, 0);
    }
}
