use serde::{Deserialize, Serialize};

/// All guard timestamps are absolute UTC epoch milliseconds.
pub type EpochMs = i64;

/// Identity returned by the external provider on successful sign-in.
///
/// The guard never inspects credentials itself; this is the only identity
/// data it carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    /// Provider-assigned stable user id.
    pub id: String,
    pub email: String,
}

/// Format a millisecond duration as `M:SS` for countdown display.
///
/// Matches the admin UI countdown (e.g. `14:59` for a fresh lockout tick).
/// Negative inputs clamp to `0:00`.
pub fn format_countdown(ms: i64) -> String {
    let ms = ms.max(0);
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    format!("{minutes}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(0), "0:00");
        assert_eq!(format_countdown(59_000), "0:59");
        assert_eq!(format_countdown(60_000), "1:00");
        assert_eq!(format_countdown(899_000), "14:59");
        assert_eq!(format_countdown(900_000), "15:00");
        // Sub-second remainders truncate rather than round up.
        assert_eq!(format_countdown(1_999), "0:01");
    }

    #[test]
    fn test_format_countdown_clamps_negative() {
        assert_eq!(format_countdown(-5_000), "0:00");
    }
}
