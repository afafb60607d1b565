//! HTTP client for the static on-demand pricing document.
//!
//! The document is a plain JSON file in the response-envelope shape
//! (`{"ec2offerings": [...]}`); there is no server-side filtering, the
//! aggregator filters client-side.

use async_trait::async_trait;

use super::OnDemandSource;
use crate::core::error::OfferingResult;
use crate::model::{Offering, OfferingEnvelope};

/// Fetches the on-demand catalog document from a fixed URL
#[derive(Debug, Clone)]
pub struct HttpOnDemandClient {
    http: reqwest::Client,
    url: String,
}

impl HttpOnDemandClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Reuse an existing client, sharing its connection pool
    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl OnDemandSource for HttpOnDemandClient {
    async fn fetch_catalog(&self) -> OfferingResult<Vec<Offering>> {
        let response = self.http.get(&self.url).send().await?.error_for_status()?;
        let catalog: OfferingEnvelope = response.json().await?;
        Ok(catalog.ec2offerings)
    }
}
