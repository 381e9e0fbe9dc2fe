use std::path::PathBuf;

use portcullis_guard::{LockoutPolicy, SessionPolicy};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Where persisted guard state lives (default: `./data/guard_state.json`).
    pub state_path: PathBuf,
    /// Lockout and session thresholds.
    pub guard: GuardConfig,
    /// External identity provider endpoint.
    pub provider: ProviderConfig,
}

/// Lockout/session policy knobs.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Consecutive failed logins before lockout (default: `3`).
    pub max_login_attempts: u32,
    /// Lockout duration in minutes (default: `15`).
    pub lockout_duration_mins: i64,
    /// Session window in minutes (default: `30`).
    pub session_duration_mins: i64,
    /// Warning tail in minutes (default: `5`).
    pub warning_window_mins: i64,
}

/// Identity provider connection settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Auth endpoint root, e.g. `https://xyz.supabase.co/auth/v1`.
    pub base_url: String,
    /// Project API key sent on every request.
    pub api_key: String,
}

impl GuardConfig {
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: self.max_login_attempts,
            lockout_ms: self.lockout_duration_mins * 60 * 1000,
        }
    }

    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            session_ms: self.session_duration_mins * 60 * 1000,
            warning_ms: self.warning_window_mins * 60 * 1000,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                      |
    /// |--------------------------|------------------------------|
    /// | `HOST`                   | `0.0.0.0`                    |
    /// | `PORT`                   | `3000`                       |
    /// | `CORS_ORIGINS`           | `http://localhost:3000`      |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                         |
    /// | `GUARD_STATE_PATH`       | `./data/guard_state.json`    |
    /// | `MAX_LOGIN_ATTEMPTS`     | `3`                          |
    /// | `LOCKOUT_DURATION_MINS`  | `15`                         |
    /// | `SESSION_DURATION_MINS`  | `30`                         |
    /// | `WARNING_WINDOW_MINS`    | `5`                          |
    /// | `PROVIDER_URL`           | `http://localhost:9999`      |
    /// | `PROVIDER_API_KEY`       | (empty)                      |
    ///
    /// # Panics
    ///
    /// Panics on malformed numeric values -- misconfiguration should fail
    /// fast at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let state_path = PathBuf::from(
            std::env::var("GUARD_STATE_PATH").unwrap_or_else(|_| "./data/guard_state.json".into()),
        );

        let guard = GuardConfig {
            max_login_attempts: env_parse("MAX_LOGIN_ATTEMPTS", 3),
            lockout_duration_mins: env_parse("LOCKOUT_DURATION_MINS", 15),
            session_duration_mins: env_parse("SESSION_DURATION_MINS", 30),
            warning_window_mins: env_parse("WARNING_WINDOW_MINS", 5),
        };

        let provider = ProviderConfig {
            base_url: std::env::var("PROVIDER_URL")
                .unwrap_or_else(|_| "http://localhost:9999".into()),
            api_key: std::env::var("PROVIDER_API_KEY").unwrap_or_default(),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            state_path,
            guard,
            provider,
        }
    }
}

/// Parse a numeric env var, falling back to `default` when unset.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T
where
    T::Err: std::fmt::Debug,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid number: {e:?}")),
        Err(_) => default,
    }
}
