use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portcullis_api::config::ServerConfig;
use portcullis_api::{background, routes, state};
use portcullis_core::time::SystemClock;
use portcullis_guard::{AttemptTracker, FileStore, SessionManager};
use portcullis_provider::http::HttpProvider;

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portcullis_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Guard state ---
    let store = Arc::new(FileStore::open(&config.state_path));
    let clock = Arc::new(SystemClock);
    tracing::info!(path = %config.state_path.display(), "Guard state store opened");

    let tracker = Arc::new(AttemptTracker::new(
        config.guard.lockout_policy(),
        Arc::clone(&store) as _,
        Arc::clone(&clock) as _,
    ));
    let session = Arc::new(SessionManager::new(
        config.guard.session_policy(),
        Arc::clone(&store) as _,
        Arc::clone(&clock) as _,
    ));

    // Pick up a persisted session window from before the restart.
    if let Some(resumed) = session.resume() {
        tracing::info!(?resumed, "Session resumed from persisted state");
    }

    // --- Identity provider ---
    let provider = Arc::new(HttpProvider::new(
        config.provider.base_url.clone(),
        config.provider.api_key.clone(),
    ));
    tracing::info!(url = %config.provider.base_url, "Identity provider configured");

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- Background tickers ---
    let ticker_cancel = tokio_util::sync::CancellationToken::new();
    let lockout_handle = tokio::spawn(background::lockout::run(
        Arc::clone(&tracker),
        ticker_cancel.clone(),
    ));
    let session_handle = tokio::spawn(background::session::run(
        Arc::clone(&session),
        Arc::clone(&provider) as _,
        ticker_cancel.clone(),
    ));
    let identity_handle = tokio::spawn(background::identity::run(
        Arc::clone(&session),
        Arc::clone(&provider) as _,
        ticker_cancel.clone(),
    ));
    tracing::info!("Background tasks started (lockout ticker, session ticker, identity watcher)");

    // --- App state ---
    let state = AppState {
        tracker,
        session,
        provider,
        config: Arc::new(config.clone()),
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    ticker_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), lockout_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), session_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), identity_handle).await;
    tracing::info!("Background tasks stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
