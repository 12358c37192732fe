//! Configuration builder

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::Error;
use crate::auth::{HmacAlgorithm, JwtConfig};
use crate::constants::{DEFAULT_ISSUER, DEFAULT_SERVICE_NAME, MIN_RECOMMENDED_SECRET_LEN};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub jwt: JwtConfig,
    pub transport: TransportConfig,
    pub telemetry: TelemetryConfig,
}

impl Config {
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    #[must_use]
    pub const fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub http_host: IpAddr,
    pub http_port: u16,
    /// Browser origins allowed by CORS
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
}

impl TransportConfig {
    const DEFAULT_PORT: u16 = 8080;
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    const DEFAULT_CORS_ORIGIN: &'static str = "http://localhost:5173";
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            http_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            http_port: Self::DEFAULT_PORT,
            cors_origins: vec![Self::DEFAULT_CORS_ORIGIN.to_string()],
            request_timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Configuration builder with fluent API
pub struct ConfigBuilder {
    jwt_secret: Option<String>,
    issuer: String,
    algorithm: HmacAlgorithm,
    leeway: Duration,
    accepted_issuers: Vec<String>,
    transport: TransportConfig,
    telemetry: TelemetryConfig,
}

// Custom Debug impl that redacts the secret
impl std::fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("has_jwt_secret", &self.jwt_secret.is_some())
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("leeway", &self.leeway)
            .field("accepted_issuers", &self.accepted_issuers)
            .field("transport", &self.transport)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jwt_secret: None,
            issuer: DEFAULT_ISSUER.to_string(),
            algorithm: HmacAlgorithm::default(),
            leeway: Duration::ZERO,
            accepted_issuers: vec![],
            transport: TransportConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    #[must_use]
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    #[must_use]
    pub const fn algorithm(mut self, algorithm: HmacAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub const fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    #[must_use]
    pub fn accepted_issuers(mut self, issuers: Vec<String>) -> Self {
        self.accepted_issuers = issuers;
        self
    }

    #[must_use]
    pub const fn http_host(mut self, host: IpAddr) -> Self {
        self.transport.http_host = host;
        self
    }

    #[must_use]
    pub const fn http_port(mut self, port: u16) -> Self {
        self.transport.http_port = port;
        self
    }

    /// Allow one more browser origin. Duplicates are ignored.
    #[must_use]
    pub fn cors_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        if !origin.is_empty() && !self.transport.cors_origins.contains(&origin) {
            self.transport.cors_origins.push(origin);
        }
        self
    }

    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.transport.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn service_name(mut self, name: String) -> Self {
        self.telemetry.service_name = name;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: String) -> Self {
        self.telemetry.log_level = level;
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.telemetry.json_logs = enabled;
        self
    }

    pub fn build(self) -> crate::Result<Config> {
        let secret = self
            .jwt_secret
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "JWT secret is required (set NOTEGATE_JWT_SECRET or SUPABASE_JWT_SECRET)"
                        .into(),
                )
            })?;

        if secret.len() < MIN_RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                min_len = MIN_RECOMMENDED_SECRET_LEN,
                "JWT secret is shorter than recommended"
            );
        }

        if self.issuer.is_empty() {
            return Err(Error::Config("JWT issuer must not be empty".into()));
        }

        if self.transport.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be greater than zero".into()));
        }

        let jwt = JwtConfig::new(secret)
            .with_issuer(self.issuer)
            .with_algorithm(self.algorithm)
            .with_leeway(self.leeway)
            .with_accepted_issuers(self.accepted_issuers);

        Ok(Config {
            jwt,
            transport: self.transport,
            telemetry: self.telemetry,
        })
    }
}
