//! # EC2 Offering Gateway Library
//!
//! A read-through caching proxy in front of EC2 reserved and on-demand
//! instance pricing. GET requests parameterized by availability zone, product
//! description, offering type, and optional comma-separated instance types
//! are answered from an in-process whole-store-TTL cache; on a miss the
//! gateway fans out to both pricing sources, merges and filters the results,
//! caches them under a canonical key, and returns a flat JSON array under
//! `ec2offerings`.
//!
//! ## Architecture Overview
//!
//! - `core`: error types and configuration
//! - `model`: the sparse-serialized offering record and response envelope
//! - `query`: raw-token normalization and canonical cache-key construction
//! - `caching`: the whole-store TTL offering cache
//! - `upstream`: the two pricing sources behind trait seams, plus pagination
//! - `aggregator`: cache-and-fetch orchestration
//! - `gateway`: axum routes, handlers, and the server

/// Error types and configuration
pub mod core;

/// Offering records and the response envelope
pub mod model;

/// Filter-token normalization and cache-key construction
pub mod query;

/// Whole-store TTL offering cache
pub mod caching;

/// Upstream pricing sources (on-demand document, paginated reserved query)
pub mod upstream;

/// Cache-and-fetch orchestration
pub mod aggregator;

/// HTTP surface: routes, handlers, server
pub mod gateway;

// Re-export the types most callers need directly from the crate root.

pub use crate::aggregator::OfferingAggregator;
pub use crate::caching::OfferingCache;
pub use crate::core::config::GatewayConfig;
pub use crate::core::error::{OfferingError, OfferingResult};
pub use crate::gateway::handlers::AppState;
pub use crate::gateway::server::{build_router, GatewayServer};
pub use crate::model::{Offering, OfferingEnvelope};
