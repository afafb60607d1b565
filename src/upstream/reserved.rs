//! HTTP client for the paginated reserved-offerings query service.
//!
//! Filters are applied server-side via query parameters; the continuation
//! token rides along as `NextToken`. Marketplace listings are excluded and
//! tenancy is pinned to default, matching what the aggregator expects to
//! merge. Credentials resolved from the environment are attached as HTTP
//! basic auth when present.

use async_trait::async_trait;
use serde::Deserialize;

use super::{OfferingPage, ReservedSource};
use crate::core::config::UpstreamCredentials;
use crate::core::error::OfferingResult;
use crate::model::{Offering, ReservedOfferingRecord};
use crate::query::OfferingFilter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReservedOfferingsResponse {
    #[serde(default)]
    reserved_instances_offerings: Vec<ReservedOfferingRecord>,
    next_token: Option<String>,
}

/// Queries a reserved-offerings endpoint speaking the filtered, paginated
/// JSON contract
#[derive(Debug, Clone)]
pub struct HttpReservedClient {
    http: reqwest::Client,
    url: String,
    credentials: UpstreamCredentials,
}

impl HttpReservedClient {
    pub fn new(url: impl Into<String>, credentials: UpstreamCredentials) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            credentials,
        }
    }

    /// Reuse an existing client, sharing its connection pool
    pub fn with_client(
        http: reqwest::Client,
        url: impl Into<String>,
        credentials: UpstreamCredentials,
    ) -> Self {
        Self {
            http,
            url: url.into(),
            credentials,
        }
    }
}

#[async_trait]
impl ReservedSource for HttpReservedClient {
    async fn fetch_page(
        &self,
        filter: &OfferingFilter,
        next_token: Option<&str>,
    ) -> OfferingResult<OfferingPage> {
        let mut query: Vec<(&str, &str)> = vec![
            ("IncludeMarketplace", "false"),
            ("InstanceTenancy", "default"),
        ];
        if let Some(zone) = filter.availability_zone.as_deref() {
            query.push(("AvailabilityZone", zone));
        }
        if let Some(description) = filter.product_description.as_deref() {
            query.push(("ProductDescription", description));
        }
        if let Some(offering_type) = filter.offering_type.as_deref() {
            query.push(("OfferingType", offering_type));
        }
        if let Some(instance_type) = filter.instance_type.as_deref() {
            query.push(("InstanceType", instance_type));
        }
        if let Some(token) = next_token {
            query.push(("NextToken", token));
        }

        let mut request = self.http.get(&self.url).query(&query);
        if let Some(access_key_id) = self.credentials.access_key_id.as_deref() {
            request = request.basic_auth(access_key_id, self.credentials.secret_key.as_deref());
        }

        let response = request.send().await?.error_for_status()?;
        let body: ReservedOfferingsResponse = response.json().await?;

        Ok(OfferingPage {
            offerings: body
                .reserved_instances_offerings
                .into_iter()
                .map(Offering::from)
                .collect(),
            next_token: body.next_token,
        })
    }
}
