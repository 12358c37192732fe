//! Token lifecycle gateway for a multi-tenant notes API
//!
//! Exchanges identity-provider tokens for locally signed access/refresh
//! pairs, verifies access tokens per request, and rotates refresh tokens.

pub mod auth;
pub mod config;
mod constants;
mod error;
pub mod observability;
pub mod transport;

pub use auth::{
    AuthError, AuthState, HmacAlgorithm, Identity, InMemoryProfiles, JwtConfig, Profile,
    ProfileStore, TokenManager, TokenPair, TokenSigner, Unverified, Verified, VerifiedIdentity,
    extract_claims, optional_auth, require_auth,
};
pub use config::{Config, ConfigBuilder, TelemetryConfig, TransportConfig};
pub use constants::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};
pub use error::{Error, Result};
