//! HMAC token signing and verification

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::claims::TokenClaims;
use super::config::JwtConfig;
use super::error::{AuthError, Result};
use super::extract::{BASE64_URL_LENIENT, split_segments};

/// Signing algorithms accepted on verification.
///
/// Anything outside this enum, `none` and every asymmetric family included,
/// is rejected before the signature is looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HmacAlgorithm {
    #[default]
    Hs256,
    Hs384,
    Hs512,
}

impl HmacAlgorithm {
    /// Match a JOSE `alg` header value exactly.
    #[must_use]
    pub fn from_header(alg: &str) -> Option<Self> {
        match alg {
            "HS256" => Some(Self::Hs256),
            "HS384" => Some(Self::Hs384),
            "HS512" => Some(Self::Hs512),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        }
    }

    #[must_use]
    pub const fn as_jwt(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Hs384 => Algorithm::HS384,
            Self::Hs512 => Algorithm::HS512,
        }
    }
}

impl fmt::Display for HmacAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HmacAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_header(&s.to_ascii_uppercase()).ok_or_else(|| {
            AuthError::Config(format!(
                "unsupported JWT algorithm '{s}', expected HS256, HS384 or HS512"
            ))
        })
    }
}

#[derive(serde::Deserialize)]
struct RawHeader {
    alg: String,
}

/// Current Unix time in seconds.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

/// Signs and verifies tokens with a single shared secret.
///
/// Keys are derived once at construction. The signer is immutable and safe
/// to share across request handlers.
pub struct TokenSigner {
    algorithm: HmacAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    accepted_issuers: Vec<String>,
    leeway: i64,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("accepted_issuers", &self.accepted_issuers)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(config: &JwtConfig) -> Result<Self> {
        if !config.has_secret() {
            return Err(AuthError::Config("JWT secret must not be empty".into()));
        }

        let secret = config.secret.as_bytes();
        let mut accepted_issuers = config.accepted_issuers.clone();
        if !accepted_issuers.is_empty() && !accepted_issuers.contains(&config.issuer) {
            accepted_issuers.push(config.issuer.clone());
        }

        Ok(Self {
            algorithm: config.algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: config.issuer.clone(),
            accepted_issuers,
            leeway: i64::try_from(config.leeway.as_secs()).unwrap_or(i64::MAX),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub const fn algorithm(&self) -> HmacAlgorithm {
        self.algorithm
    }

    pub fn sign<C: Serialize>(&self, claims: &C) -> Result<String> {
        jsonwebtoken::encode(&Header::new(self.algorithm.as_jwt()), claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn verify<C>(&self, token: &str) -> Result<C>
    where
        C: DeserializeOwned + Clone + TokenClaims,
    {
        self.verify_at(token, unix_now())
    }

    /// Verify `token` as of the Unix time `now`.
    pub fn verify_at<C>(&self, token: &str, now: i64) -> Result<C>
    where
        C: DeserializeOwned + Clone + TokenClaims,
    {
        let algorithm = self.pinned_algorithm(token)?;

        let mut validation = Validation::new(algorithm.as_jwt());
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        if !self.accepted_issuers.is_empty() {
            validation.set_issuer(&self.accepted_issuers);
        }

        let claims = jsonwebtoken::decode::<C>(token, &self.decoding_key, &validation)?.claims;

        let registered = claims.registered();
        if now >= registered.exp.saturating_add(self.leeway) {
            return Err(AuthError::Expired);
        }
        if let Some(nbf) = registered.nbf
            && now.saturating_add(self.leeway) < nbf
        {
            return Err(AuthError::NotYetValid);
        }

        Ok(claims)
    }

    fn pinned_algorithm(&self, token: &str) -> Result<HmacAlgorithm> {
        let (header, _, _) = split_segments(token).ok_or(AuthError::MalformedToken)?;
        let bytes = BASE64_URL_LENIENT
            .decode(header)
            .map_err(|_| AuthError::MalformedToken)?;
        let raw: RawHeader =
            serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;

        HmacAlgorithm::from_header(&raw.alg).ok_or(AuthError::AlgorithmMismatch)
    }
}
