//! Claim extraction from identity-provider tokens.
//!
//! The payload is decoded without any signature check. Only call this on
//! tokens received straight from the provider's redirect, never on a
//! client-supplied header.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::claims::{Identity, ProviderClaims};
use super::error::{AuthError, Result};
use super::trust::Unverified;

/// base64url that accepts both padded and unpadded input
pub(crate) const BASE64_URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Split a compact token into its three segments.
pub(crate) fn split_segments(token: &str) -> Option<(&str, &str, &str)> {
    let mut parts = token.split('.');
    let header = parts.next()?;
    let payload = parts.next()?;
    let signature = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((header, payload, signature))
}

/// Decode the claims of a provider-issued token without verifying it.
pub fn extract_claims(token: &str) -> Result<Identity<Unverified>> {
    let (_, payload, _) = split_segments(token).ok_or(AuthError::Format)?;

    let bytes = BASE64_URL_LENIENT
        .decode(payload)
        .map_err(|_| AuthError::Decode)?;

    let claims: ProviderClaims = serde_json::from_slice(&bytes).map_err(|_| AuthError::Parse)?;

    Ok(Identity::from_provider(claims))
}
