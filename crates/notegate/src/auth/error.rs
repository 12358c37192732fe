//! Authentication error types

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    // Provider token (claim extraction) failures
    #[error("token must have exactly three segments")]
    Format,

    #[error("token payload is not valid base64url")]
    Decode,

    #[error("token payload is not a valid claim set")]
    Parse,

    // Local token failures
    #[error("malformed token")]
    MalformedToken,

    #[error("invalid signature")]
    SignatureInvalid,

    #[error("signing algorithm not allowed")]
    AlgorithmMismatch,

    #[error("invalid issuer")]
    InvalidIssuer,

    #[error("token expired")]
    Expired,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("wrong token type")]
    WrongTokenType,

    // Request-level failures
    #[error("authorization header required")]
    MissingCredentials,

    #[error("invalid authorization header format")]
    MalformedAuthHeader,

    #[error("authentication required")]
    NotAuthenticated,

    // Internal failures
    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Stable label for logs and metrics. Never contains token or claim data.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Format => "format",
            Self::Decode => "decode",
            Self::Parse => "parse",
            Self::MalformedToken => "malformed_token",
            Self::SignatureInvalid => "signature_invalid",
            Self::AlgorithmMismatch => "algorithm_mismatch",
            Self::InvalidIssuer => "invalid_issuer",
            Self::Expired => "expired",
            Self::NotYetValid => "not_yet_valid",
            Self::WrongTokenType => "wrong_token_type",
            Self::MissingCredentials => "missing_credentials",
            Self::MalformedAuthHeader => "malformed_auth_header",
            Self::NotAuthenticated => "not_authenticated",
            Self::Signing(_) => "signing",
            Self::Config(_) => "config",
        }
    }

    /// True for failures of a presented token (integrity, temporal, role).
    #[must_use]
    pub const fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken
                | Self::SignatureInvalid
                | Self::AlgorithmMismatch
                | Self::InvalidIssuer
                | Self::Expired
                | Self::NotYetValid
                | Self::WrongTokenType
        )
    }

    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Signing(_) | Self::Config(_))
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Format | Self::Decode | Self::Parse => StatusCode::BAD_REQUEST,
            Self::Signing(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message exposed to callers.
    ///
    /// Every token rejection collapses to "invalid token" so an attacker
    /// cannot tell a forged token from an expired one.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_token_rejection() {
            "invalid token".to_string()
        } else if self.is_internal() {
            "internal error".to_string()
        } else if matches!(self, Self::Format | Self::Decode | Self::Parse) {
            "invalid token format".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::InvalidSignature => Self::SignatureInvalid,
            ErrorKind::InvalidAlgorithm => Self::AlgorithmMismatch,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidIssuer => Self::InvalidIssuer,
            _ => Self::MalformedToken,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = self
            .is_token_rejection()
            .then_some("re-authenticate or refresh your session");
        let body = ErrorBody {
            error: self.public_message(),
            message,
        };
        (self.status_code(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
