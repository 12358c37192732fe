//! Bearer-token authorization middleware
//!
//! Both functions are meant for `axum::middleware::from_fn_with_state`.
//! [`require_auth`] rejects the request before the handler runs;
//! [`optional_auth`] only attaches an identity when one verifies.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use super::claims::VerifiedIdentity;
use super::error::{AuthError, Result};
use super::lifecycle::TokenManager;
use crate::constants::BEARER_PREFIX;

/// Authentication state for middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenManager>,
}

impl AuthState {
    #[must_use]
    pub fn new(tokens: TokenManager) -> Self {
        Self {
            tokens: Arc::new(tokens),
        }
    }

    #[must_use]
    pub const fn from_shared(tokens: Arc<TokenManager>) -> Self {
        Self { tokens }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?;

    let value = value.to_str().map_err(|_| AuthError::MalformedAuthHeader)?;

    match value.strip_prefix(BEARER_PREFIX).map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedAuthHeader),
    }
}

fn authenticate(state: &AuthState, headers: &HeaderMap) -> Result<VerifiedIdentity> {
    let token = bearer_token(headers)?;
    state.tokens.validate_access(token)
}

/// Reject unauthenticated requests with 401.
#[allow(clippy::future_not_send)]
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, AuthError> {
    let identity = authenticate(&state, request.headers()).map_err(|err| {
        // Error kind only; never the token
        tracing::warn!(reason = err.kind(), "request rejected");
        err
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Attach the caller's identity when present and valid, never reject.
#[allow(clippy::future_not_send)]
pub async fn optional_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
        }
        Err(AuthError::MissingCredentials) => {}
        Err(err) => {
            tracing::debug!(reason = err.kind(), "continuing without identity");
        }
    }
    next.run(request).await
}
