//! Admin access guard: login-failure lockout and session lifecycle.
//!
//! This crate owns all lockout/session timing policy on top of whatever the
//! external identity provider enforces. It is deliberately synchronous and
//! I/O-free apart from the injected [`store::StateStore`]: every decision is
//! a function of the injected clock and the persisted state, so the whole
//! state machine is unit-testable without a server or wall-clock waits.
//!
//! - [`store`] -- key-value persistence boundary (memory and file backed).
//! - [`attempt`] -- failed-login counting and timed lockout.
//! - [`session`] -- 30-minute session window with warning and extension.

pub mod attempt;
pub mod session;
pub mod store;

pub use attempt::{AttemptTracker, LockoutPolicy, LoginFailure};
pub use session::{SessionManager, SessionPolicy, SessionState, SessionTick};
pub use store::{FileStore, MemoryStore, StateStore};
