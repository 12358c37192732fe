//! Constants for the token lifecycle

/// Access token lifetime in seconds (15 minutes)
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh token lifetime in seconds (7 days)
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Type marker carried by refresh tokens
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// `token_type` label returned with every issued pair
pub const BEARER_TOKEN_TYPE: &str = "bearer";

/// Issuer written into locally minted tokens unless configured otherwise
pub const DEFAULT_ISSUER: &str = "notegate";

/// Role assigned when the identity provider does not supply one
pub const DEFAULT_ROLE: &str = "authenticated";

/// Prefix of the `Authorization` header value
pub const BEARER_PREFIX: &str = "Bearer ";

/// Secrets shorter than this trigger a startup warning
pub const MIN_RECOMMENDED_SECRET_LEN: usize = 32;

/// Default service name for logs and metrics
pub const DEFAULT_SERVICE_NAME: &str = "notegate";
