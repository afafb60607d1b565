//! # Gateway Server
//!
//! Wires the aggregator, cache, and upstream clients into an axum router and
//! runs it. Every endpoint is GET-only and CORS-enabled for all origins
//! (allow-origin `*`, allow-methods `GET`, allow-headers `Content-Type`), so
//! browser dashboards can call the API directly.

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::aggregator::OfferingAggregator;
use crate::caching::OfferingCache;
use crate::core::config::{GatewayConfig, UpstreamCredentials};
use crate::core::error::{OfferingError, OfferingResult};
use crate::gateway::handlers::{self, AppState};
use crate::upstream::{HttpOnDemandClient, HttpReservedClient};

/// Build the application router around the given state
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api", get(handlers::all_offerings))
        .route("/api/", get(handlers::all_offerings))
        .route("/api/:availability_zone", get(handlers::offerings_by_zone))
        .route(
            "/api/:availability_zone/:product_description",
            get(handlers::offerings_by_product),
        )
        .route(
            "/api/:availability_zone/:product_description/:offering_type",
            get(handlers::offerings_by_type),
        )
        .route(
            "/api/:availability_zone/:product_description/:offering_type/:instance_type",
            get(handlers::offerings_by_instance),
        )
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// The assembled HTTP server, ready to `start`
pub struct GatewayServer {
    router: Router,
    bind_addr: SocketAddr,
}

impl GatewayServer {
    /// Construct the full component stack from configuration: one shared
    /// cache, one reqwest connection pool across both upstream clients, one
    /// aggregator behind every request
    pub fn from_config(config: &GatewayConfig) -> OfferingResult<Self> {
        let bind_addr: SocketAddr =
            format!("{}:{}", config.server.bind_address, config.server.http_port)
                .parse()
                .map_err(|e| OfferingError::config(format!("Invalid bind address: {}", e)))?;

        let http = reqwest::Client::new();
        let on_demand = HttpOnDemandClient::with_client(http.clone(), &config.upstream.on_demand_url);
        let reserved = HttpReservedClient::with_client(
            http,
            &config.upstream.reserved_url,
            UpstreamCredentials::from_env(),
        );

        let aggregator = OfferingAggregator::new(
            Arc::new(OfferingCache::new(config.cache.ttl)),
            Arc::new(on_demand),
            Arc::new(reserved),
        );

        let state = AppState {
            aggregator: Arc::new(aggregator),
        };

        Ok(Self {
            router: build_router(state),
            bind_addr,
        })
    }

    /// Address the server will bind to
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Bind the listener and serve until a shutdown signal arrives
    pub async fn start(self) -> OfferingResult<()> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;
        info!("listening on {}", self.bind_addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Resolve on SIGTERM or SIGINT, whichever comes first
async fn shutdown_signal() {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("Failed to install SIGTERM handler");
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("Failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            info!("received SIGINT, initiating graceful shutdown");
        }
    }
}
