//! # Request Handlers
//!
//! Thin adapters between axum path extraction and the aggregator. The five
//! route arities peel path segments off `/api/...` left to right; segments
//! that were not supplied fall back to the documented defaults (a fixed
//! availability zone and the `linux` product token for the two shortest
//! forms, unfiltered otherwise).

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::aggregator::OfferingAggregator;
use crate::core::error::OfferingResult;
use crate::model::OfferingEnvelope;

/// Zone assumed when the request does not name one
pub const AVAILABILITY_ZONE_DEFAULT: &str = "us-east-1a";

/// Product description token assumed when the request does not name one
pub const PRODUCT_DESCRIPTION_DEFAULT: &str = "linux";

/// Shared per-process state behind every handler
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<OfferingAggregator>,
}

/// GET `/api/`
pub async fn all_offerings(State(state): State<AppState>) -> OfferingResult<Json<OfferingEnvelope>> {
    offerings(
        &state,
        AVAILABILITY_ZONE_DEFAULT.to_string(),
        Some(PRODUCT_DESCRIPTION_DEFAULT.to_string()),
        None,
        None,
    )
    .await
}

/// GET `/api/{availabilityZone}`
pub async fn offerings_by_zone(
    State(state): State<AppState>,
    Path(availability_zone): Path<String>,
) -> OfferingResult<Json<OfferingEnvelope>> {
    offerings(
        &state,
        availability_zone,
        Some(PRODUCT_DESCRIPTION_DEFAULT.to_string()),
        None,
        None,
    )
    .await
}

/// GET `/api/{availabilityZone}/{productDescription}`
pub async fn offerings_by_product(
    State(state): State<AppState>,
    Path((availability_zone, product_description)): Path<(String, String)>,
) -> OfferingResult<Json<OfferingEnvelope>> {
    offerings(&state, availability_zone, Some(product_description), None, None).await
}

/// GET `/api/{availabilityZone}/{productDescription}/{offeringType}`
pub async fn offerings_by_type(
    State(state): State<AppState>,
    Path((availability_zone, product_description, offering_type)): Path<(String, String, String)>,
) -> OfferingResult<Json<OfferingEnvelope>> {
    offerings(
        &state,
        availability_zone,
        Some(product_description),
        Some(offering_type),
        None,
    )
    .await
}

/// GET `/api/{availabilityZone}/{productDescription}/{offeringType}/{instanceType}`
///
/// The instance-type segment may carry several comma-separated values.
pub async fn offerings_by_instance(
    State(state): State<AppState>,
    Path((availability_zone, product_description, offering_type, instance_type)): Path<(
        String,
        String,
        String,
        String,
    )>,
) -> OfferingResult<Json<OfferingEnvelope>> {
    offerings(
        &state,
        availability_zone,
        Some(product_description),
        Some(offering_type),
        Some(instance_type),
    )
    .await
}

/// GET `/health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn offerings(
    state: &AppState,
    availability_zone: String,
    product_description: Option<String>,
    offering_type: Option<String>,
    instance_type: Option<String>,
) -> OfferingResult<Json<OfferingEnvelope>> {
    let envelope = state
        .aggregator
        .get_offerings(
            Some(&availability_zone),
            product_description.as_deref(),
            offering_type.as_deref(),
            instance_type.as_deref(),
        )
        .await?;
    Ok(Json(envelope))
}
