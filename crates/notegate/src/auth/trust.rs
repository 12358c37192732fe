//! Trust levels for identity claims.
//!
//! Claims reach this crate two ways: decoded from an identity-provider token
//! without checking its signature, or recovered from a token this service
//! signed and has just verified. [`Identity`](super::Identity) carries one of
//! the markers below so the two can never be mixed up at compile time.
//!
//! The [`TrustLevel`] trait is sealed: code outside this crate can name the
//! markers but cannot invent a new one.

pub(crate) mod private {
    /// Marker trait that seals [`TrustLevel`](super::TrustLevel).
    pub trait Sealed {}
}

/// Provenance of a claim set.
///
/// This trait is sealed - external implementations are not allowed.
pub trait TrustLevel: private::Sealed + Send + Sync + 'static {
    /// Label used in `Debug` output and logs.
    const LABEL: &'static str;
}

/// Claims decoded from an external provider token. Signature not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unverified {}

/// Claims recovered from a locally signed token after full verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verified {}

impl private::Sealed for Unverified {}
impl TrustLevel for Unverified {
    const LABEL: &'static str = "unverified";
}

impl private::Sealed for Verified {}
impl TrustLevel for Verified {
    const LABEL: &'static str = "verified";
}
