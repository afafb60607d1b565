//! # EC2 Offering Gateway - Main Entry Point
//!
//! Boots the read-through pricing proxy: observability first, then
//! configuration (file plus environment overrides), then the server with
//! graceful SIGTERM/SIGINT shutdown.

use tracing::{error, info};

use ec2_offering_gateway::gateway::server::GatewayServer;
use ec2_offering_gateway::{GatewayConfig, OfferingResult};

#[tokio::main]
async fn main() -> OfferingResult<()> {
    init_observability();

    info!("🚀 Starting EC2 Offering Gateway");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::var("EC2OFFERING_CONFIG_PATH")
        .unwrap_or_else(|_| "config/gateway.yaml".to_string());

    let config = GatewayConfig::load(&config_path).await.map_err(|e| {
        error!("Failed to load configuration from {}: {}", config_path, e);
        e
    })?;

    info!(
        "Cache TTL {}, on-demand source {}",
        humantime::format_duration(config.cache.ttl),
        config.upstream.on_demand_url
    );

    let server = GatewayServer::from_config(&config)?;
    info!("🌐 Offering API ready on {}", server.bind_addr());

    server.start().await?;

    info!("✅ Gateway shutdown complete");
    Ok(())
}

/// Initialize logging and tracing
fn init_observability() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ec2_offering_gateway=info,tower_http=debug".into()),
        )
        .init();
}
