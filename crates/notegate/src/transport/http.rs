//! HTTP transport implementation

use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::{FromRef, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{Router, middleware};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{
    AuthError, AuthState, Profile, ProfileStore, TokenManager, TokenPair, VerifiedIdentity,
    optional_auth, require_auth,
};
use crate::config::TransportConfig;
use crate::{Error, Result};

/// Shared state for every route
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub profiles: Arc<dyn ProfileStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl AppState {
    #[must_use]
    pub fn new(tokens: TokenManager, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            auth: AuthState::new(tokens),
            profiles,
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
struct CallbackRequest {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct CallbackUser {
    id: String,
    email: String,
    metadata: HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
struct CallbackResponse {
    user: CallbackUser,
    tokens: TokenPair,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    id: String,
    email: String,
    role: String,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
}

/// Routes without transport layers.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/user", get(current_user_handler))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_auth,
        ));

    let public_or_private = Router::new()
        .route("/api/session", get(session_handler))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            optional_auth,
        ));

    #[allow(unused_mut)]
    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/callback", post(callback_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/logout", post(logout_handler));

    #[cfg(feature = "metrics")]
    {
        app = app.route("/metrics", get(metrics_handler));
    }

    app.merge(protected)
        .merge(public_or_private)
        .with_state(state)
}

/// Run the HTTP server until `shutdown` resolves
pub async fn run_http(
    state: AppState,
    config: &TransportConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = SocketAddr::new(config.http_host, config.http_port);
    let cancellation_token = CancellationToken::new();

    emit_security_warnings(config.http_host);

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ))
        .layer(build_cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Transport(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("HTTP server listening on {addr}");

    // Spawn shutdown handler
    let token = cancellation_token.clone();
    tokio::spawn(async move {
        shutdown.await;
        token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(cancellation_token.cancelled_owned())
        .await
        .map_err(|e| Error::Transport(format!("HTTP server error: {e}")))?;

    tracing::info!("HTTP server shutdown complete");
    Ok(())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| {
            o.parse::<HeaderValue>()
                .inspect_err(|_| tracing::warn!(origin = %o, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn emit_security_warnings(host: IpAddr) {
    let is_all_interfaces =
        host == IpAddr::V4(Ipv4Addr::UNSPECIFIED) || host == IpAddr::V6(Ipv6Addr::UNSPECIFIED);

    if is_all_interfaces {
        tracing::warn!(
            "HTTP server binding to all interfaces. \
             Terminate TLS in front of it; bearer tokens travel in plain headers."
        );
    } else if !host.is_loopback() {
        tracing::warn!(
            "HTTP server binding to non-loopback address ({host}). \
             Ensure network security policies are in place."
        );
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(feature = "metrics")]
async fn metrics_handler() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        crate::observability::render_metrics(),
    )
}

/// Exchange a provider token for a locally signed pair.
///
/// The provider token must carry a valid signature under the shared secret.
async fn callback_handler(
    State(state): State<AppState>,
    Json(payload): Json<CallbackRequest>,
) -> std::result::Result<Json<CallbackResponse>, AuthError> {
    let identity = state
        .auth
        .tokens
        .verify_provider(&payload.access_token)
        .inspect_err(|err| tracing::warn!(reason = err.kind(), "provider token rejected"))?;

    let profile = Profile::from(&identity);
    state.profiles.upsert(profile.clone());

    let tokens = state
        .auth
        .tokens
        .issue_pair(&profile.id, &profile.email, &profile.role)?;

    tracing::info!(user_id = %profile.id, "user signed in");

    Ok(Json(CallbackResponse {
        user: CallbackUser {
            id: profile.id,
            email: profile.email,
            metadata: profile.metadata,
        },
        tokens,
    }))
}

async fn refresh_handler(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> std::result::Result<Json<TokenPair>, AuthError> {
    state
        .auth
        .tokens
        .rotate(&payload.refresh_token, state.profiles.as_ref())
        .map(Json)
        .inspect_err(|err| tracing::warn!(reason = err.kind(), "refresh rejected"))
}

// Tokens are stateless; the client discards them.
async fn logout_handler() -> impl IntoResponse {
    Json(MessageResponse {
        message: "logged out",
    })
}

async fn current_user_handler(identity: VerifiedIdentity) -> impl IntoResponse {
    Json(UserResponse {
        id: identity.subject().to_string(),
        email: identity.email().to_string(),
        role: identity.role().to_string(),
    })
}

async fn session_handler(identity: Option<VerifiedIdentity>) -> impl IntoResponse {
    Json(SessionResponse {
        authenticated: identity.is_some(),
        user_id: identity.map(|i| i.subject().to_string()),
    })
}
