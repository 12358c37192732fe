//! TOML configuration file loading

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::builder::ConfigBuilder;
use crate::Result;
use crate::auth::HmacAlgorithm;

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./notegate.toml",
    "~/.config/notegate/config.toml",
    "/etc/notegate/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        crate::Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    builder = apply_file_config(builder, file_config)?;
    Ok(builder)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    // Auth settings
    if let Some(auth) = config.auth {
        if let Some(secret) = auth.jwt_secret {
            builder = builder.jwt_secret(secret);
        }

        if let Some(issuer) = auth.issuer {
            builder = builder.issuer(issuer);
        }

        if let Some(alg) = auth.algorithm {
            let algorithm: HmacAlgorithm = alg
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid auth.algorithm: {e}")))?;
            builder = builder.algorithm(algorithm);
        }

        if let Some(secs) = auth.leeway_secs {
            builder = builder.leeway(Duration::from_secs(secs));
        }

        if let Some(issuers) = auth.accepted_issuers {
            builder = builder.accepted_issuers(issuers);
        }
    }

    // Transport settings
    if let Some(transport) = config.transport {
        if let Some(host_str) = transport.http_host
            && let Ok(host) = host_str.parse::<IpAddr>()
        {
            builder = builder.http_host(host);
        }

        if let Some(port) = transport.http_port {
            builder = builder.http_port(port);
        }

        for origin in transport.cors_origins.unwrap_or_default() {
            builder = builder.cors_origin(origin);
        }

        if let Some(secs) = transport.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
    }

    // Observability settings
    if let Some(obs) = config.observability {
        if let Some(name) = obs.service_name {
            builder = builder.service_name(name);
        }

        if let Some(level) = obs.log_level {
            builder = builder.log_level(level);
        }

        if let Some(json) = obs.json_logs {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    auth: Option<AuthFileConfig>,
    transport: Option<TransportFileConfig>,
    observability: Option<ObservabilityConfig>,
}

#[derive(Deserialize)]
struct AuthFileConfig {
    jwt_secret: Option<String>,
    issuer: Option<String>,
    algorithm: Option<String>,
    leeway_secs: Option<u64>,
    accepted_issuers: Option<Vec<String>>,
}

impl std::fmt::Debug for AuthFileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFileConfig")
            .field("has_jwt_secret", &self.jwt_secret.is_some())
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .field("accepted_issuers", &self.accepted_issuers)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TransportFileConfig {
    http_host: Option<String>,
    http_port: Option<u16>,
    cors_origins: Option<Vec<String>>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ObservabilityConfig {
    service_name: Option<String>,
    log_level: Option<String>,
    json_logs: Option<bool>,
}
