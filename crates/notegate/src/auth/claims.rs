//! JWT claims types

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{AuthError, Result};
use super::trust::{TrustLevel, Unverified, Verified};
use crate::constants::DEFAULT_ROLE;

/// Audience can be a single string or array of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::One(s) => s == value,
            Self::Many(v) => v.iter().any(|s| s == value),
        }
    }
}

/// Registered claims shared by every locally issued token.
///
/// `sub` lives on the outer claim types because access and refresh tokens
/// populate it differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    pub exp: i64,
}

impl RegisteredClaims {
    /// Claims valid from `now` for `ttl_secs` seconds.
    #[must_use]
    pub fn issued_at(issuer: &str, now: i64, ttl_secs: i64) -> Self {
        Self {
            iss: Some(issuer.to_string()),
            aud: None,
            iat: Some(now),
            nbf: Some(now),
            exp: now.saturating_add(ttl_secs),
        }
    }
}

/// Claim sets the verifier can decode.
pub trait TokenClaims {
    fn registered(&self) -> &RegisteredClaims;
}

/// Payload of an access token.
///
/// Identity-provider tokens signed with the shared secret decode into this
/// shape too; fields they do not carry fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    /// Only ever set on refresh tokens; presence here means role confusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Carried by provider tokens only. Locally issued tokens leave both empty.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub user_metadata: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub app_metadata: HashMap<String, Value>,
    #[serde(flatten)]
    pub registered: RegisteredClaims,
}

impl TokenClaims for AccessClaims {
    fn registered(&self) -> &RegisteredClaims {
        &self.registered
    }
}

/// Payload of a refresh token.
///
/// `user_id` and `token_type` default to empty so that an access token
/// presented here decodes cleanly and is rejected as the wrong type rather
/// than as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub sub: String,
    #[serde(flatten)]
    pub registered: RegisteredClaims,
}

impl TokenClaims for RefreshClaims {
    fn registered(&self) -> &RegisteredClaims {
        &self.registered
    }
}

/// Claims as issued by the external identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub app_metadata: Option<HashMap<String, Value>>,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub aud: Option<OneOrMany>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// A user identity tagged with how far it can be trusted.
///
/// `Identity<Unverified>` only comes out of
/// [`extract_claims`](super::extract_claims); `Identity<Verified>` only comes
/// out of [`TokenManager::validate_access`](super::TokenManager::validate_access)
/// and [`TokenManager::verify_provider`](super::TokenManager::verify_provider).
/// Middleware and extractors accept the verified form exclusively.
#[derive(Clone, PartialEq)]
pub struct Identity<T: TrustLevel> {
    subject: String,
    email: String,
    role: String,
    issuer: Option<String>,
    expires_at: Option<i64>,
    user_metadata: HashMap<String, Value>,
    app_metadata: HashMap<String, Value>,
    _trust: PhantomData<T>,
}

/// Request identity attached by the authorization middleware
pub type VerifiedIdentity = Identity<Verified>;

impl<T: TrustLevel> Identity<T> {
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub const fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    pub const fn user_metadata(&self) -> &HashMap<String, Value> {
        &self.user_metadata
    }

    pub const fn app_metadata(&self) -> &HashMap<String, Value> {
        &self.app_metadata
    }
}

impl Identity<Unverified> {
    pub(crate) fn from_provider(claims: ProviderClaims) -> Self {
        let role = claims
            .role
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());
        Self {
            subject: claims.sub,
            email: claims.email.unwrap_or_default(),
            role,
            issuer: claims.iss,
            expires_at: claims.exp,
            user_metadata: claims.user_metadata.unwrap_or_default(),
            app_metadata: claims.app_metadata.unwrap_or_default(),
            _trust: PhantomData,
        }
    }

    /// Reject a provider token whose own `exp` has passed.
    ///
    /// The signature is still unchecked; this only keeps stale tokens from
    /// minting fresh local pairs.
    pub fn ensure_fresh(&self, now: i64) -> Result<()> {
        match self.expires_at {
            Some(exp) if now >= exp => Err(AuthError::Expired),
            _ => Ok(()),
        }
    }
}

impl Identity<Verified> {
    pub(crate) fn from_access(claims: AccessClaims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
            role: claims.role,
            issuer: claims.registered.iss,
            expires_at: Some(claims.registered.exp),
            user_metadata: claims.user_metadata,
            app_metadata: claims.app_metadata,
            _trust: PhantomData,
        }
    }
}

// Email and metadata stay out of Debug output so identities can be traced
// without leaking claim contents.
impl<T: TrustLevel> fmt::Debug for Identity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("trust", &T::LABEL)
            .field("subject", &self.subject)
            .field("role", &self.role)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
