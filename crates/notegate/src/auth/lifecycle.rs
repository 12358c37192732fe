//! Access/refresh token pair issuance and rotation

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::claims::{AccessClaims, Identity, RefreshClaims, RegisteredClaims};
use super::config::JwtConfig;
use super::error::{AuthError, Result};
use super::jwt::{TokenSigner, unix_now};
use super::profile::ProfileStore;
use super::trust::Verified;
use crate::constants::{
    ACCESS_TOKEN_TTL_SECS, BEARER_TOKEN_TYPE, DEFAULT_ROLE, REFRESH_TOKEN_TTL_SECS,
    REFRESH_TOKEN_TYPE,
};

/// Co-issued access and refresh tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub token_type: String,
}

/// Owns the signer and both token lifetimes.
///
/// Holds no per-token state. A refresh token stays valid until its own
/// expiry even after it has been exchanged.
#[derive(Debug)]
pub struct TokenManager {
    signer: TokenSigner,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenManager {
    pub fn new(config: &JwtConfig) -> Result<Self> {
        Ok(Self::from_signer(TokenSigner::new(config)?))
    }

    #[must_use]
    pub const fn from_signer(signer: TokenSigner) -> Self {
        Self {
            signer,
            access_ttl: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl: REFRESH_TOKEN_TTL_SECS,
        }
    }

    /// Override the default 15 minute / 7 day lifetimes.
    #[must_use]
    pub fn with_lifetimes(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_ttl = i64::try_from(access.as_secs()).unwrap_or(i64::MAX);
        self.refresh_ttl = i64::try_from(refresh.as_secs()).unwrap_or(i64::MAX);
        self
    }

    pub const fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub const fn access_ttl_secs(&self) -> i64 {
        self.access_ttl
    }

    pub const fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl
    }

    pub fn issue_pair(&self, user_id: &str, email: &str, role: &str) -> Result<TokenPair> {
        self.issue_pair_at(user_id, email, role, unix_now())
    }

    /// Mint both tokens from the single instant `now`.
    pub fn issue_pair_at(
        &self,
        user_id: &str,
        email: &str,
        role: &str,
        now: i64,
    ) -> Result<TokenPair> {
        let issuer = self.signer.issuer();

        let access = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            token_type: None,
            user_metadata: HashMap::new(),
            app_metadata: HashMap::new(),
            registered: RegisteredClaims::issued_at(issuer, now, self.access_ttl),
        };
        let refresh = RefreshClaims {
            user_id: user_id.to_string(),
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            sub: user_id.to_string(),
            registered: RegisteredClaims::issued_at(issuer, now, self.refresh_ttl),
        };

        let access_token = self.signer.sign(&access)?;
        let refresh_token = self.signer.sign(&refresh)?;

        #[cfg(feature = "metrics")]
        {
            crate::observability::record_token_issued("access");
            crate::observability::record_token_issued("refresh");
        }
        tracing::debug!(user_id, "issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl,
            token_type: BEARER_TOKEN_TYPE.to_string(),
        })
    }

    pub fn validate_refresh(&self, token: &str) -> Result<RefreshClaims> {
        self.validate_refresh_at(token, unix_now())
    }

    pub fn validate_refresh_at(&self, token: &str, now: i64) -> Result<RefreshClaims> {
        let result = self
            .signer
            .verify_at::<RefreshClaims>(token, now)
            .and_then(|claims| {
                if claims.token_type != REFRESH_TOKEN_TYPE {
                    return Err(AuthError::WrongTokenType);
                }
                if claims.user_id.is_empty() {
                    return Err(AuthError::MalformedToken);
                }
                Ok(claims)
            });
        observe(result)
    }

    pub fn validate_access(&self, token: &str) -> Result<Identity<Verified>> {
        self.validate_access_at(token, unix_now())
    }

    pub fn validate_access_at(&self, token: &str, now: i64) -> Result<Identity<Verified>> {
        let result = self
            .signer
            .verify_at::<AccessClaims>(token, now)
            .and_then(|claims| {
                if claims.token_type.is_some() {
                    return Err(AuthError::WrongTokenType);
                }
                Ok(Identity::from_access(claims))
            });
        observe(result)
    }

    /// Verify an identity-provider token signed with the shared secret.
    ///
    /// Signature, algorithm, expiry and issuer are checked exactly as for
    /// access tokens. Tokens minted by this manager are refused, so a local
    /// access token cannot be traded for a fresh pair.
    pub fn verify_provider(&self, token: &str) -> Result<Identity<Verified>> {
        self.verify_provider_at(token, unix_now())
    }

    pub fn verify_provider_at(&self, token: &str, now: i64) -> Result<Identity<Verified>> {
        let result = self
            .signer
            .verify_at::<AccessClaims>(token, now)
            .and_then(|mut claims| {
                if claims.token_type.is_some()
                    || claims.registered.iss.as_deref() == Some(self.signer.issuer())
                {
                    return Err(AuthError::WrongTokenType);
                }
                if claims.sub.is_empty() {
                    return Err(AuthError::MalformedToken);
                }
                if claims.role.is_empty() {
                    claims.role = DEFAULT_ROLE.to_string();
                }
                Ok(Identity::from_access(claims))
            });
        observe(result)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// Email and role are re-read from `profiles` so the new access token
    /// reflects the user's current profile.
    pub fn rotate(&self, refresh_token: &str, profiles: &dyn ProfileStore) -> Result<TokenPair> {
        self.rotate_at(refresh_token, profiles, unix_now())
    }

    pub fn rotate_at(
        &self,
        refresh_token: &str,
        profiles: &dyn ProfileStore,
        now: i64,
    ) -> Result<TokenPair> {
        let claims = self.validate_refresh_at(refresh_token, now)?;

        let profile = profiles.get(&claims.user_id).ok_or_else(|| {
            tracing::warn!("refresh presented for unknown user");
            AuthError::NotAuthenticated
        })?;

        let pair = self.issue_pair_at(&profile.id, &profile.email, &profile.role, now)?;

        #[cfg(feature = "metrics")]
        crate::observability::record_rotation();
        tracing::info!(user_id = %profile.id, "rotated refresh token");

        Ok(pair)
    }
}

fn observe<T>(result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        tracing::debug!(reason = err.kind(), "token rejected");
        #[cfg(feature = "metrics")]
        crate::observability::record_token_rejection(err.kind());
    }
    result
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;
    use crate::auth::profile::{InMemoryProfiles, Profile};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";
    const NOW: i64 = 1_700_000_000;

    fn manager() -> TokenManager {
        TokenManager::new(&JwtConfig::new(SECRET)).unwrap()
    }

    fn profiles_with(id: &str, email: &str, role: &str) -> InMemoryProfiles {
        let store = InMemoryProfiles::new();
        store.upsert(Profile {
            id: id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            metadata: HashMap::new(),
        });
        store
    }

    #[test]
    fn test_issue_pair_lifetimes() {
        let manager = manager();
        let pair = manager
            .issue_pair_at("u1", "a@b.com", "authenticated", NOW)
            .unwrap();

        assert_eq!(pair.expires_in, 900);
        assert_eq!(pair.token_type, "bearer");

        let access: AccessClaims = manager.signer().verify_at(&pair.access_token, NOW).unwrap();
        let refresh: RefreshClaims = manager.signer().verify_at(&pair.refresh_token, NOW).unwrap();

        assert_eq!(access.registered.iat, Some(NOW));
        assert_eq!(refresh.registered.iat, Some(NOW));
        assert_eq!(access.registered.exp - NOW, 900);
        assert_eq!(refresh.registered.exp - NOW, 604_800);
        assert_eq!(access.registered.iss.as_deref(), Some("notegate"));
        assert_eq!(refresh.token_type, "refresh");
    }

    #[test]
    fn test_issue_then_validate_refresh() {
        let manager = manager();
        let pair = manager.issue_pair("u1", "a@b.com", "authenticated").unwrap();
        let claims = manager.validate_refresh(&pair.refresh_token).unwrap();
        assert_eq!(claims.user_id, "u1");
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let manager = manager();
        let pair = manager.issue_pair("u1", "a@b.com", "authenticated").unwrap();
        assert!(matches!(
            manager.validate_refresh(&pair.access_token),
            Err(AuthError::WrongTokenType)
        ));
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let manager = manager();
        let pair = manager.issue_pair("u1", "a@b.com", "authenticated").unwrap();
        assert!(matches!(
            manager.validate_access(&pair.refresh_token),
            Err(AuthError::WrongTokenType)
        ));
    }

    #[test]
    fn test_validate_access_identity() {
        let manager = manager();
        let pair = manager
            .issue_pair_at("u1", "a@b.com", "authenticated", NOW)
            .unwrap();
        let identity = manager.validate_access_at(&pair.access_token, NOW + 60).unwrap();
        assert_eq!(identity.subject(), "u1");
        assert_eq!(identity.email(), "a@b.com");
        assert_eq!(identity.role(), "authenticated");
        assert_eq!(identity.expires_at(), Some(NOW + 900));
    }

    #[test]
    fn test_access_expires_before_refresh() {
        let manager = manager();
        let pair = manager
            .issue_pair_at("u1", "a@b.com", "authenticated", NOW)
            .unwrap();
        let later = NOW + 3600;

        assert!(matches!(
            manager.validate_access_at(&pair.access_token, later),
            Err(AuthError::Expired)
        ));
        assert!(manager.validate_refresh_at(&pair.refresh_token, later).is_ok());
        assert!(matches!(
            manager.validate_refresh_at(&pair.refresh_token, NOW + 604_800),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_refresh_without_user_id_is_malformed() {
        let manager = manager();
        let claims = RefreshClaims {
            user_id: String::new(),
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            sub: String::new(),
            registered: RegisteredClaims::issued_at("notegate", NOW, 60),
        };
        let token = manager.signer().sign(&claims).unwrap();
        assert!(matches!(
            manager.validate_refresh_at(&token, NOW),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn test_rotate_issues_new_pair() {
        let manager = manager();
        let profiles = profiles_with("u1", "new@b.com", "editor");
        let pair = manager
            .issue_pair_at("u1", "old@b.com", "authenticated", NOW)
            .unwrap();

        let rotated = manager
            .rotate_at(&pair.refresh_token, &profiles, NOW + 1000)
            .unwrap();
        assert_ne!(rotated.access_token, pair.access_token);

        let identity = manager
            .validate_access_at(&rotated.access_token, NOW + 1000)
            .unwrap();
        assert_eq!(identity.email(), "new@b.com");
        assert_eq!(identity.role(), "editor");
        assert_eq!(identity.expires_at(), Some(NOW + 1900));
    }

    #[test]
    fn test_rotate_leaves_old_refresh_valid() {
        let manager = manager();
        let profiles = profiles_with("u1", "a@b.com", "authenticated");
        let pair = manager
            .issue_pair_at("u1", "a@b.com", "authenticated", NOW)
            .unwrap();

        manager
            .rotate_at(&pair.refresh_token, &profiles, NOW + 10)
            .unwrap();
        assert!(
            manager
                .rotate_at(&pair.refresh_token, &profiles, NOW + 20)
                .is_ok()
        );
    }

    #[test]
    fn test_rotate_unknown_user() {
        let manager = manager();
        let pair = manager
            .issue_pair_at("ghost", "g@b.com", "authenticated", NOW)
            .unwrap();
        let result = manager.rotate_at(&pair.refresh_token, &InMemoryProfiles::new(), NOW);
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[test]
    fn test_rotate_rejects_access_token() {
        let manager = manager();
        let profiles = profiles_with("u1", "a@b.com", "authenticated");
        let pair = manager
            .issue_pair_at("u1", "a@b.com", "authenticated", NOW)
            .unwrap();
        assert!(matches!(
            manager.rotate_at(&pair.access_token, &profiles, NOW),
            Err(AuthError::WrongTokenType)
        ));
    }

    #[test]
    fn test_custom_lifetimes() {
        let manager = manager().with_lifetimes(Duration::from_secs(60), Duration::from_secs(120));
        let pair = manager
            .issue_pair_at("u1", "a@b.com", "authenticated", NOW)
            .unwrap();
        assert_eq!(pair.expires_in, 60);
        assert_eq!(manager.refresh_ttl_secs(), 120);
        assert!(matches!(
            manager.validate_refresh_at(&pair.refresh_token, NOW + 120),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_huge_refresh_lifetime_saturates() {
        let manager = manager().with_lifetimes(Duration::from_secs(900), Duration::MAX);
        let pair = manager
            .issue_pair_at("u1", "a@b.com", "authenticated", NOW)
            .unwrap();

        let claims = manager.validate_refresh_at(&pair.refresh_token, NOW).unwrap();
        assert_eq!(claims.registered.exp, i64::MAX);
        assert_eq!(pair.expires_in, 900);
    }

    fn provider_token(manager: &TokenManager, claims: &serde_json::Value) -> String {
        manager.signer().sign(claims).unwrap()
    }

    #[test]
    fn test_verify_provider_token() {
        let manager = manager();
        let token = provider_token(
            &manager,
            &serde_json::json!({
                "sub": "u1",
                "email": "a@b.com",
                "iss": "https://project.supabase.co/auth/v1",
                "aud": "authenticated",
                "exp": NOW + 3600,
                "user_metadata": {"full_name": "Ada"}
            }),
        );

        let identity = manager.verify_provider_at(&token, NOW).unwrap();
        assert_eq!(identity.subject(), "u1");
        assert_eq!(identity.role(), "authenticated");
        assert_eq!(identity.user_metadata()["full_name"], "Ada");
    }

    #[test]
    fn test_verify_provider_rejects_forged_signature() {
        let manager = manager();
        let other =
            TokenManager::new(&JwtConfig::new("another-secret-at-least-32-bytes-long")).unwrap();
        let token = provider_token(
            &other,
            &serde_json::json!({"sub": "admin", "role": "service_role", "exp": NOW + 3600}),
        );
        assert!(matches!(
            manager.verify_provider_at(&token, NOW),
            Err(AuthError::SignatureInvalid)
        ));

        let unsigned = format!(
            "{}.{}.x",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none"}"#),
            URL_SAFE_NO_PAD.encode(r#"{"sub":"admin","role":"service_role","exp":9999999999}"#)
        );
        assert!(matches!(
            manager.verify_provider_at(&unsigned, NOW),
            Err(AuthError::AlgorithmMismatch)
        ));
    }

    #[test]
    fn test_verify_provider_rejects_expired() {
        let manager = manager();
        let token = provider_token(&manager, &serde_json::json!({"sub": "u1", "exp": NOW}));
        assert!(matches!(
            manager.verify_provider_at(&token, NOW),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_verify_provider_refuses_local_tokens() {
        let manager = manager();
        let pair = manager
            .issue_pair_at("u1", "a@b.com", "authenticated", NOW)
            .unwrap();
        assert!(matches!(
            manager.verify_provider_at(&pair.access_token, NOW),
            Err(AuthError::WrongTokenType)
        ));
        assert!(matches!(
            manager.verify_provider_at(&pair.refresh_token, NOW),
            Err(AuthError::WrongTokenType)
        ));
    }

    #[test]
    fn test_token_pair_json_shape() {
        let pair = manager()
            .issue_pair_at("u1", "a@b.com", "authenticated", NOW)
            .unwrap();
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["expires_in"], 900);
        assert_eq!(json["token_type"], "bearer");
        assert!(json["access_token"].is_string());
        assert!(json["refresh_token"].is_string());
    }
}
