#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use portcullis_api::config::{GuardConfig, ProviderConfig, ServerConfig};
use portcullis_api::routes;
use portcullis_api::state::AppState;
use portcullis_core::time::{Clock, ManualClock};
use portcullis_guard::{
    AttemptTracker, LockoutPolicy, MemoryStore, SessionManager, SessionPolicy, StateStore,
};
use portcullis_provider::fixed::StaticProvider;

/// The one valid credential pair registered with the test provider.
pub const TEST_EMAIL: &str = "admin@example.com";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Everything a test needs to drive the app deterministically: the router
/// plus direct handles to the fake clock, the store, and the guard state.
pub struct TestEnv {
    pub app: Router,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub tracker: Arc<AttemptTracker>,
    pub session: Arc<SessionManager>,
    pub provider: Arc<StaticProvider>,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        state_path: PathBuf::from("unused-in-tests"),
        guard: GuardConfig {
            max_login_attempts: 3,
            lockout_duration_mins: 15,
            session_duration_mins: 30,
            warning_window_mins: 5,
        },
        provider: ProviderConfig {
            base_url: "http://localhost:9999".to_string(),
            api_key: String::new(),
        },
    }
}

/// Build the full application router with all middleware layers over a
/// manual clock, an in-memory store, and a fixed-credential provider.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. The background tickers are NOT
/// spawned; tests drive `tick()` by hand for determinism.
pub fn build_test_env() -> TestEnv {
    let config = test_config();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store = Arc::new(MemoryStore::new());

    let tracker = Arc::new(AttemptTracker::new(
        LockoutPolicy::default(),
        Arc::clone(&store) as Arc<dyn StateStore>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    let session = Arc::new(SessionManager::new(
        SessionPolicy::default(),
        Arc::clone(&store) as Arc<dyn StateStore>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    let provider = Arc::new(StaticProvider::new().with_user(TEST_EMAIL, TEST_PASSWORD));

    let state = AppState {
        tracker: Arc::clone(&tracker),
        session: Arc::clone(&session),
        provider: Arc::clone(&provider) as _,
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:3000".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    TestEnv {
        app,
        clock,
        store,
        tracker,
        session,
        provider,
    }
}

/// POST a JSON body and return the raw response.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// POST with an empty body.
pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// GET and return the raw response.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in with the test credentials and assert success.
pub async fn login_ok(env: &TestEnv) -> serde_json::Value {
    let body = serde_json::json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD });
    let response = post_json(env.app.clone(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// Log in with a wrong password and return the response.
pub async fn login_wrong_password(env: &TestEnv) -> Response<Body> {
    let body = serde_json::json!({ "email": TEST_EMAIL, "password": "nope" });
    post_json(env.app.clone(), "/api/v1/auth/login", body).await
}
