#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid credentials: {attempts_remaining} attempts remaining")]
    InvalidCredentials { attempts_remaining: u32 },

    #[error("Account locked: try again in {remaining_ms} ms")]
    LockedOut { remaining_ms: i64 },

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("No active session")]
    NoSession,

    #[error("Session expired")]
    SessionExpired,

    #[error("Internal error: {0}")]
    Internal(String),
}
