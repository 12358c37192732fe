use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use notegate::config;
use notegate::observability::init_observability;
use notegate::transport::{AppState, run_http};
use notegate::{HmacAlgorithm, InMemoryProfiles, TokenManager};

#[derive(Parser, Debug)]
#[command(name = "notegate")]
#[command(about = "Token issuance and verification gateway", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP bind host
    #[arg(long)]
    http_host: Option<IpAddr>,

    /// HTTP bind port
    #[arg(long)]
    http_port: Option<u16>,

    /// Issuer written into locally signed tokens
    #[arg(long)]
    issuer: Option<String>,

    /// Signing algorithm (HS256, HS384, HS512)
    #[arg(long)]
    algorithm: Option<HmacAlgorithm>,

    /// Clock skew tolerance in seconds
    #[arg(long)]
    leeway_secs: Option<u64>,

    /// Additional allowed CORS origin
    #[arg(long)]
    cors_origin: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Precedence: CLI > env > file > defaults
    let mut builder = if let Some(ref path) = args.config {
        config::load_config_from_path(path)?
    } else {
        config::load_config()?
    };

    if let Some(host) = args.http_host {
        builder = builder.http_host(host);
    }
    if let Some(port) = args.http_port {
        builder = builder.http_port(port);
    }
    if let Some(issuer) = args.issuer {
        builder = builder.issuer(issuer);
    }
    if let Some(algorithm) = args.algorithm {
        builder = builder.algorithm(algorithm);
    }
    if let Some(secs) = args.leeway_secs {
        builder = builder.leeway(Duration::from_secs(secs));
    }
    if let Some(origin) = args.cors_origin {
        builder = builder.cors_origin(origin);
    }
    if let Some(secs) = args.request_timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }
    if args.verbose {
        builder = builder.log_level("debug".to_string());
    }
    if args.json_logs {
        builder = builder.json_logs(true);
    }

    let config = builder.build()?;

    init_observability(&config.telemetry)?;

    let tokens = TokenManager::new(config.jwt())?;
    let state = AppState::new(tokens, Arc::new(InMemoryProfiles::new()));

    tracing::info!("Starting notegate");
    tracing::info!("Issuer: {}", config.jwt.issuer);
    tracing::info!("Signing algorithm: {}", config.jwt.algorithm);
    tracing::info!("Clock skew leeway: {:?}", config.jwt.leeway);
    tracing::info!("CORS origins: {:?}", config.transport.cors_origins);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };

    run_http(state, &config.transport, shutdown)
        .await
        .map_err(Into::into)
}
