//! Failed-login counting and timed lockout.
//!
//! The tracker gates login attempts independently of whatever throttling the
//! identity provider applies. After [`LockoutPolicy::max_attempts`]
//! consecutive failures the guard refuses further attempts for
//! [`LockoutPolicy::lockout_ms`] without contacting the provider at all.
//! Every state change is persisted immediately so a restart cannot reset
//! the counter.

use std::sync::{Arc, Mutex};

use portcullis_core::error::CoreError;
use portcullis_core::time::Clock;
use portcullis_core::types::EpochMs;

use crate::store::{self, StateStore, FAILED_ATTEMPTS_KEY, LOCKOUT_KEY};

/// Lockout thresholds.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lockout.
    pub max_attempts: u32,
    /// Lockout duration in milliseconds.
    pub lockout_ms: i64,
}

impl Default for LockoutPolicy {
    /// 3 attempts, 15-minute lockout.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            lockout_ms: 15 * 60 * 1000,
        }
    }
}

/// Outcome of recording a failed credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    /// Below the threshold; the user may try again.
    InvalidCredentials { attempts_remaining: u32 },
    /// This failure reached the threshold and started a lockout.
    LockedOut { remaining_ms: i64 },
}

#[derive(Debug, Default)]
struct AttemptState {
    failed_attempts: u32,
    lockout_until: Option<EpochMs>,
}

/// Tracks login failures and enforces the timed lockout.
///
/// Invariant: `lockout_until` is set iff `failed_attempts` reached the
/// configured maximum since the last reset. Both fields change together
/// under one lock, so there is no window where the count is at the
/// threshold but the lockout is unset.
pub struct AttemptTracker {
    policy: LockoutPolicy,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<AttemptState>,
}

impl AttemptTracker {
    /// Restore tracker state from the store.
    ///
    /// An already-elapsed persisted lockout is wiped on load, matching the
    /// lazy cleanup the admin UI does when it boots.
    pub fn new(policy: LockoutPolicy, store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        let mut state = AttemptState {
            failed_attempts: store::read_i64(store.as_ref(), FAILED_ATTEMPTS_KEY)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
            lockout_until: store::read_i64(store.as_ref(), LOCKOUT_KEY),
        };

        if let Some(until) = state.lockout_until {
            if clock.now_ms() >= until {
                state = AttemptState::default();
                store.remove(LOCKOUT_KEY);
                store.remove(FAILED_ATTEMPTS_KEY);
            }
        }

        Self {
            policy,
            store,
            clock,
            state: Mutex::new(state),
        }
    }

    /// Reject the attempt up front if a lockout is in force.
    ///
    /// Returns `Err(CoreError::LockedOut)` carrying the remaining duration;
    /// callers must not contact the identity provider in that case.
    pub fn precheck(&self) -> Result<(), CoreError> {
        let state = self.state.lock().unwrap();
        if let Some(until) = state.lockout_until {
            let now = self.clock.now_ms();
            if now < until {
                return Err(CoreError::LockedOut {
                    remaining_ms: until - now,
                });
            }
        }
        Ok(())
    }

    /// Record a structured credential rejection from the provider.
    ///
    /// Increments the counter and, if the threshold is reached, sets the
    /// lockout in the same critical section.
    pub fn record_failure(&self) -> LoginFailure {
        let mut state = self.state.lock().unwrap();
        let now = self.clock.now_ms();

        state.failed_attempts += 1;
        self.store
            .set(FAILED_ATTEMPTS_KEY, &state.failed_attempts.to_string());

        if state.failed_attempts >= self.policy.max_attempts {
            let until = now + self.policy.lockout_ms;
            state.lockout_until = Some(until);
            self.store.set(LOCKOUT_KEY, &until.to_string());
            tracing::warn!(
                failed_attempts = state.failed_attempts,
                lockout_ms = self.policy.lockout_ms,
                "Login lockout triggered"
            );
            LoginFailure::LockedOut {
                remaining_ms: self.policy.lockout_ms,
            }
        } else {
            let attempts_remaining = self.policy.max_attempts - state.failed_attempts;
            tracing::info!(
                failed_attempts = state.failed_attempts,
                attempts_remaining,
                "Login attempt failed"
            );
            LoginFailure::InvalidCredentials { attempts_remaining }
        }
    }

    /// Record a successful login: counter reset, lockout cleared, persisted
    /// state wiped.
    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap();
        *state = AttemptState::default();
        self.store.remove(FAILED_ATTEMPTS_KEY);
        self.store.remove(LOCKOUT_KEY);
    }

    /// True iff a lockout is set and still in the future.
    pub fn is_locked_out(&self) -> bool {
        let state = self.state.lock().unwrap();
        match state.lockout_until {
            Some(until) => self.clock.now_ms() < until,
            None => false,
        }
    }

    /// `max(0, lockout_until - now)`; 0 when not locked out.
    pub fn remaining_lockout_ms(&self) -> i64 {
        let state = self.state.lock().unwrap();
        match state.lockout_until {
            Some(until) => (until - self.clock.now_ms()).max(0),
            None => 0,
        }
    }

    /// Current consecutive failure count.
    pub fn failed_attempts(&self) -> u32 {
        self.state.lock().unwrap().failed_attempts
    }

    /// Clear an elapsed lockout. Called at 1-second resolution while locked
    /// so the countdown reaches zero and unlocks without a user action.
    ///
    /// Returns true when this tick cleared the lockout.
    pub fn tick(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(until) = state.lockout_until else {
            return false;
        };
        if self.clock.now_ms() < until {
            return false;
        }
        *state = AttemptState::default();
        self.store.remove(LOCKOUT_KEY);
        self.store.remove(FAILED_ATTEMPTS_KEY);
        tracing::info!("Login lockout expired, counter reset");
        true
    }
}
