//! Identity handoff to request handlers
//!
//! The middleware stores a [`VerifiedIdentity`] in the request extensions.
//! Handlers read it through the getters below or take it as an extractor.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::Extensions;
use axum::http::request::Parts;

use super::claims::{Identity, VerifiedIdentity};
use super::error::{AuthError, Result};
use super::trust::Verified;

pub fn identity(extensions: &Extensions) -> Option<&VerifiedIdentity> {
    extensions.get::<VerifiedIdentity>()
}

pub fn user_id(extensions: &Extensions) -> Option<&str> {
    identity(extensions).map(Identity::subject)
}

pub fn user_email(extensions: &Extensions) -> Option<&str> {
    identity(extensions).map(Identity::email)
}

pub fn user_role(extensions: &Extensions) -> Option<&str> {
    identity(extensions).map(Identity::role)
}

/// Subject of the authenticated caller, or `NotAuthenticated` (401).
pub fn require_user(extensions: &Extensions) -> Result<&str> {
    user_id(extensions).ok_or(AuthError::NotAuthenticated)
}

impl<S: Send + Sync> FromRequestParts<S> for Identity<Verified> {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        identity(&parts.extensions)
            .cloned()
            .ok_or(AuthError::NotAuthenticated)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for Identity<Verified> {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Option<Self>, Infallible> {
        Ok(identity(&parts.extensions).cloned())
    }
}
