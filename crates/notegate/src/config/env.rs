//! Environment variable loading for configuration

use std::env;
use std::net::IpAddr;
use std::time::Duration;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::auth::HmacAlgorithm;

/// Environment variable names
mod vars {
    pub const NOTEGATE_JWT_SECRET: &str = "NOTEGATE_JWT_SECRET";
    pub const SUPABASE_JWT_SECRET: &str = "SUPABASE_JWT_SECRET";
    pub const NOTEGATE_ISSUER: &str = "NOTEGATE_ISSUER";
    pub const NOTEGATE_JWT_ALGORITHM: &str = "NOTEGATE_JWT_ALGORITHM";
    pub const NOTEGATE_JWT_LEEWAY_SECS: &str = "NOTEGATE_JWT_LEEWAY_SECS";
    pub const NOTEGATE_ACCEPTED_ISSUERS: &str = "NOTEGATE_ACCEPTED_ISSUERS";
    pub const NOTEGATE_HTTP_HOST: &str = "NOTEGATE_HTTP_HOST";
    pub const NOTEGATE_HTTP_PORT: &str = "NOTEGATE_HTTP_PORT";
    pub const PORT: &str = "PORT";
    pub const NOTEGATE_CORS_ORIGIN: &str = "NOTEGATE_CORS_ORIGIN";
    pub const FRONTEND_URL: &str = "FRONTEND_URL";
    pub const NOTEGATE_REQUEST_TIMEOUT_SECS: &str = "NOTEGATE_REQUEST_TIMEOUT_SECS";
    pub const NOTEGATE_SERVICE_NAME: &str = "NOTEGATE_SERVICE_NAME";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const NOTEGATE_JSON_LOGS: &str = "NOTEGATE_JSON_LOGS";
}

/// First non-empty value among `names`.
fn var_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| env::var(name).ok().filter(|v| !v.is_empty()))
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    // Auth
    if let Some(secret) = var_any(&[vars::NOTEGATE_JWT_SECRET, vars::SUPABASE_JWT_SECRET]) {
        builder = builder.jwt_secret(secret);
    }

    if let Ok(issuer) = env::var(vars::NOTEGATE_ISSUER) {
        builder = builder.issuer(issuer);
    }

    if let Ok(alg) = env::var(vars::NOTEGATE_JWT_ALGORITHM) {
        let algorithm: HmacAlgorithm = alg.parse().map_err(|e| {
            crate::Error::Config(format!("Invalid {}: {e}", vars::NOTEGATE_JWT_ALGORITHM))
        })?;
        builder = builder.algorithm(algorithm);
    }

    if let Ok(leeway_str) = env::var(vars::NOTEGATE_JWT_LEEWAY_SECS)
        && let Ok(secs) = leeway_str.parse::<u64>()
    {
        builder = builder.leeway(Duration::from_secs(secs));
    }

    if let Ok(issuers) = env::var(vars::NOTEGATE_ACCEPTED_ISSUERS) {
        let issuers: Vec<String> = issuers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        builder = builder.accepted_issuers(issuers);
    }

    // Transport
    if let Ok(host_str) = env::var(vars::NOTEGATE_HTTP_HOST)
        && let Ok(host) = host_str.parse::<IpAddr>()
    {
        builder = builder.http_host(host);
    }

    if let Some(port_str) = var_any(&[vars::NOTEGATE_HTTP_PORT, vars::PORT])
        && let Ok(port) = port_str.parse::<u16>()
    {
        builder = builder.http_port(port);
    }

    if let Some(origin) = var_any(&[vars::NOTEGATE_CORS_ORIGIN, vars::FRONTEND_URL]) {
        builder = builder.cors_origin(origin);
    }

    if let Ok(timeout_str) = env::var(vars::NOTEGATE_REQUEST_TIMEOUT_SECS)
        && let Ok(secs) = timeout_str.parse::<u64>()
    {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }

    // Telemetry
    if let Ok(name) = env::var(vars::NOTEGATE_SERVICE_NAME) {
        builder = builder.service_name(name);
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::NOTEGATE_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
