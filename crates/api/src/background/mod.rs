//! Background tickers.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`. All tasks accept a
//! [`tokio_util::sync::CancellationToken`] for graceful shutdown. The
//! lockout and session countdowns are deliberately independent 1-second
//! tasks, matching the two timers they replace in the admin UI; the
//! identity watcher polls at a coarser interval.

pub mod identity;
pub mod lockout;
pub mod session;

use std::time::Duration;

/// Resolution of both countdown timers.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
