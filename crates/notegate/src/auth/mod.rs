//! Token lifecycle and request authorization
//!
//! Provider tokens are verified against the shared secret once, at login.
//! From then on [`TokenManager`] issues and rotates access/refresh pairs, and
//! the middleware verifies the access token on every protected request.
//! [`extract_claims`] reads a token's claims without any signature check and
//! is only meant for tokens whose origin is already trusted.
//!
//! # Trust levels
//!
//! [`Identity<Unverified>`](Identity) and [`Identity<Verified>`](Identity)
//! are distinct types. Only the verified form reaches request extensions.

mod claims;
mod config;
mod error;
mod extract;
mod jwt;
mod lifecycle;
mod middleware;
mod profile;
mod trust;
pub mod user_context;

pub use claims::{
    AccessClaims, Identity, OneOrMany, ProviderClaims, RefreshClaims, RegisteredClaims,
    TokenClaims, VerifiedIdentity,
};
pub use config::JwtConfig;
pub use error::{AuthError, Result};
pub use extract::extract_claims;
pub use jwt::{HmacAlgorithm, TokenSigner, unix_now};
pub use lifecycle::{TokenManager, TokenPair};
pub use middleware::{AuthState, bearer_token, optional_auth, require_auth};
pub use profile::{InMemoryProfiles, Profile, ProfileStore};
pub use trust::{TrustLevel, Unverified, Verified};
