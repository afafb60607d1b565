//! # Configuration Module
//!
//! Gateway configuration loaded from a YAML file with environment variable
//! overrides. The gateway runs fine with no config file at all: every field
//! has a default, and overrides follow the pattern `EC2OFFERING_<SECTION>_<FIELD>`
//! (for example `EC2OFFERING_SERVER_HTTP_PORT=8080` or
//! `EC2OFFERING_CACHE_TTL=24h`).
//!
//! Upstream credentials are deliberately not part of the config file; the
//! reserved-offerings collaborator resolves them from the environment
//! (`AWS_ACCESS_KEY_ID` / `AWS_SECRET_KEY`).

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::core::error::{OfferingError, OfferingResult};

/// On-demand pricing document the original deployment published
pub const ONDEMAND_URL_DEFAULT: &str =
    "https://raw2.github.com/kenklin/awsec2offering/master/src/main/resources/aws-ec2-ondemand.json";

/// Main gateway configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server configuration (bind address, port)
    pub server: ServerConfig,

    /// Offering cache configuration
    pub cache: CacheConfig,

    /// Upstream pricing source configuration
    pub upstream: UpstreamConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    pub bind_address: String,

    /// Port for the HTTP listener
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            http_port: 8080,
        }
    }
}

/// Offering cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whole-store time-to-live; the entire cache is cleared on the first
    /// read past this deadline
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Upstream pricing source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// URL of the static on-demand pricing document
    pub on_demand_url: String,

    /// Endpoint of the paginated reserved-offerings query service
    pub reserved_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            on_demand_url: ONDEMAND_URL_DEFAULT.to_string(),
            reserved_url: "http://localhost:9090/reserved-offerings".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> OfferingResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| OfferingError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| OfferingError::config(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path` if it exists, otherwise fall back to
    /// defaults. Environment overrides apply either way.
    pub async fn load<P: AsRef<Path>>(path: P) -> OfferingResult<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path).await
        } else {
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Environment variables follow the pattern: EC2OFFERING_<SECTION>_<FIELD>
    pub fn apply_env_overrides(&mut self) -> OfferingResult<()> {
        if let Ok(port) = env::var("EC2OFFERING_SERVER_HTTP_PORT") {
            self.server.http_port = port.parse().map_err(|e| {
                OfferingError::config(format!("Invalid EC2OFFERING_SERVER_HTTP_PORT: {}", e))
            })?;
        }

        if let Ok(addr) = env::var("EC2OFFERING_SERVER_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }

        if let Ok(ttl) = env::var("EC2OFFERING_CACHE_TTL") {
            self.cache.ttl = humantime::parse_duration(&ttl).map_err(|e| {
                OfferingError::config(format!("Invalid EC2OFFERING_CACHE_TTL: {}", e))
            })?;
        }

        if let Ok(url) = env::var("EC2OFFERING_UPSTREAM_ONDEMAND_URL") {
            self.upstream.on_demand_url = url;
        }

        if let Ok(url) = env::var("EC2OFFERING_UPSTREAM_RESERVED_URL") {
            self.upstream.reserved_url = url;
        }

        Ok(())
    }

    /// Validate the configuration, returning a descriptive error on the first
    /// problem found
    pub fn validate(&self) -> OfferingResult<()> {
        if self.server.bind_address.is_empty() {
            return Err(OfferingError::config("server.bind_address must not be empty"));
        }
        if self.server.http_port == 0 {
            return Err(OfferingError::config("server.http_port must not be 0"));
        }
        if self.cache.ttl.is_zero() {
            return Err(OfferingError::config("cache.ttl must be greater than zero"));
        }
        for (name, url) in [
            ("upstream.on_demand_url", &self.upstream.on_demand_url),
            ("upstream.reserved_url", &self.upstream.reserved_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(OfferingError::config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
        Ok(())
    }
}

/// Credentials for the reserved-offerings upstream, resolved from the
/// environment the same way the original deployment resolved them
#[derive(Debug, Clone, Default)]
pub struct UpstreamCredentials {
    pub access_key_id: Option<String>,
    pub secret_key: Option<String>,
}

impl UpstreamCredentials {
    /// Read `AWS_ACCESS_KEY_ID` and `AWS_SECRET_KEY` (falling back to
    /// `AWS_SECRET_ACCESS_KEY`) from the environment. Missing variables leave
    /// the corresponding field unset; the upstream client then sends
    /// unauthenticated requests.
    pub fn from_env() -> Self {
        Self {
            access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_key: env::var("AWS_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .ok(),
        }
    }
}
