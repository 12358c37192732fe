//! Token signing configuration

use std::time::Duration;

use super::jwt::HmacAlgorithm;
use crate::constants::DEFAULT_ISSUER;

/// Shared-secret JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret, also used by the identity provider
    pub secret: String,
    /// Issuer written into locally minted tokens
    pub issuer: String,
    /// Algorithm used when signing; verification accepts the whole HMAC family
    pub algorithm: HmacAlgorithm,
    /// Clock skew tolerance for exp/nbf validation
    pub leeway: Duration,
    /// When non-empty, tokens must carry one of these issuers (or our own)
    pub accepted_issuers: Vec<String>,
}

// Custom Debug impl that redacts the secret
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("leeway", &self.leeway)
            .field("accepted_issuers", &self.accepted_issuers)
            .finish_non_exhaustive()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: DEFAULT_ISSUER.to_string(),
            algorithm: HmacAlgorithm::default(),
            leeway: Duration::ZERO,
            accepted_issuers: vec![],
        }
    }
}

impl JwtConfig {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: HmacAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub const fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    #[must_use]
    pub fn with_accepted_issuers(mut self, issuers: Vec<String>) -> Self {
        self.accepted_issuers = issuers;
        self
    }

    #[must_use]
    pub const fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }
}
