//! # Offering Aggregator
//!
//! The read-through orchestration layer: normalize the raw filter tokens,
//! build the canonical key, consult the cache, and on a miss fan out to both
//! upstream sources, merge, store, and wrap the result in the response
//! envelope.
//!
//! Multi-value instance-type filters decompose into one dual-source fetch
//! round per token, in input order, with no de-duplication across tokens.
//!
//! Degradation policy: an upstream failure for a given source and filter
//! combination is logged at warn and contributes whatever was already
//! collected (zero offerings if it failed outright). It never aborts the
//! other source or the remaining tokens, and never prevents the merged
//! (possibly partial or empty) result from being cached. The gateway traits
//! return explicit `Result`s, so this policy is applied by inspecting them
//! here rather than by unwinding.

use futures::TryStreamExt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::caching::{CachedOfferings, OfferingCache};
use crate::core::error::OfferingResult;
use crate::model::{Offering, OfferingEnvelope};
use crate::query::{self, OfferingFilter};
use crate::upstream::{page_stream, OnDemandSource, ReservedSource};

/// Orchestrates normalization, cache lookup, and multi-source fetching
pub struct OfferingAggregator {
    cache: Arc<OfferingCache>,
    on_demand: Arc<dyn OnDemandSource>,
    reserved: Arc<dyn ReservedSource>,
}

impl OfferingAggregator {
    pub fn new(
        cache: Arc<OfferingCache>,
        on_demand: Arc<dyn OnDemandSource>,
        reserved: Arc<dyn ReservedSource>,
    ) -> Self {
        Self {
            cache,
            on_demand,
            reserved,
        }
    }

    /// The shared cache, exposed for introspection
    pub fn cache(&self) -> &OfferingCache {
        &self.cache
    }

    /// Resolve one filter tuple to an offering envelope
    ///
    /// The availability zone passes through verbatim; product description and
    /// offering type are normalized; the instance-type segment may carry
    /// several comma-separated tokens. Invalid tokens fail with
    /// `InvalidArgument` before the cache is consulted or mutated.
    pub async fn get_offerings(
        &self,
        availability_zone: Option<&str>,
        product_description: Option<&str>,
        offering_type: Option<&str>,
        instance_type: Option<&str>,
    ) -> OfferingResult<OfferingEnvelope> {
        let product_description = query::normalize_product_description(product_description)?;
        let offering_type = query::normalize_offering_type(offering_type)?;
        let instance_types = query::parse_instance_types(instance_type)?;

        let key = query::cache_key(
            availability_zone,
            product_description.as_deref(),
            offering_type.as_deref(),
            instance_types.as_deref(),
        );

        if let Some(cached) = self.cache.get(&key) {
            debug!(%key, offerings = cached.len(), "serving offerings from cache");
            return Ok(OfferingEnvelope {
                ec2offerings: cached.to_vec(),
            });
        }

        debug!(%key, "cache miss, fetching offerings from upstream");
        let mut merged = Vec::new();
        match &instance_types {
            None => {
                self.fetch_round(
                    &mut merged,
                    availability_zone,
                    product_description.as_deref(),
                    offering_type.as_deref(),
                    None,
                )
                .await;
            }
            Some(tokens) => {
                for token in tokens {
                    self.fetch_round(
                        &mut merged,
                        availability_zone,
                        product_description.as_deref(),
                        offering_type.as_deref(),
                        Some(token),
                    )
                    .await;
                }
            }
        }

        let stored: CachedOfferings = Arc::from(merged);
        self.cache.put(key, Arc::clone(&stored));

        Ok(OfferingEnvelope {
            ec2offerings: stored.to_vec(),
        })
    }

    /// One dual-source fetch for a single instance-type token (or none)
    ///
    /// Appends all matches from the on-demand catalog (filtered client-side)
    /// and every page of the reserved query (filtered server-side) to
    /// `merged`. Failures degrade to an empty contribution from the failing
    /// source; pages drained before a mid-pagination failure are kept.
    async fn fetch_round(
        &self,
        merged: &mut Vec<Offering>,
        availability_zone: Option<&str>,
        product_description: Option<&str>,
        offering_type: Option<&str>,
        instance_type: Option<&str>,
    ) {
        match self.on_demand.fetch_catalog().await {
            Ok(catalog) => {
                merged.extend(catalog.into_iter().filter(|offering| {
                    matches_on_demand(offering, availability_zone, product_description, instance_type)
                }));
            }
            Err(error) => {
                warn!(%error, "on-demand catalog fetch failed, contributing no offerings");
            }
        }

        let filter = OfferingFilter {
            availability_zone: availability_zone.map(str::to_string),
            product_description: product_description.map(str::to_string),
            offering_type: offering_type.map(str::to_string),
            instance_type: instance_type.map(str::to_string),
        };

        let pages = page_stream(self.reserved.as_ref(), &filter);
        futures::pin_mut!(pages);
        loop {
            match pages.try_next().await {
                Ok(Some(page)) => merged.extend(page.offerings),
                Ok(None) => break,
                Err(error) => {
                    warn!(%error, "reserved offerings query failed, keeping pages fetched so far");
                    break;
                }
            }
        }
    }
}

/// Client-side filter for on-demand records: absent components are
/// wildcards; the offering type does not apply to on-demand pricing
fn matches_on_demand(
    offering: &Offering,
    availability_zone: Option<&str>,
    product_description: Option<&str>,
    instance_type: Option<&str>,
) -> bool {
    component_matches(availability_zone, offering.availability_zone.as_deref())
        && component_matches(product_description, offering.product_description.as_deref())
        && component_matches(instance_type, offering.instance_type.as_deref())
}

fn component_matches(filter: Option<&str>, value: Option<&str>) -> bool {
    match filter {
        None => true,
        Some(expected) => value == Some(expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::OfferingError;
    use crate::upstream::OfferingPage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn offering(zone: &str, description: &str, instance_type: &str) -> Offering {
        Offering {
            availability_zone: Some(zone.to_string()),
            product_description: Some(description.to_string()),
            instance_type: Some(instance_type.to_string()),
            ..Default::default()
        }
    }

    /// On-demand source serving a fixed catalog, counting fetches
    struct FixedOnDemand {
        catalog: Vec<Offering>,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl OnDemandSource for FixedOnDemand {
        async fn fetch_catalog(&self) -> OfferingResult<Vec<Offering>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(OfferingError::upstream("on-demand", "document unreachable"));
            }
            Ok(self.catalog.clone())
        }
    }

    /// Reserved source answering one single page per query, echoing the
    /// requested instance type, counting queries
    struct EchoReserved {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl ReservedSource for EchoReserved {
        async fn fetch_page(
            &self,
            filter: &OfferingFilter,
            _next_token: Option<&str>,
        ) -> OfferingResult<OfferingPage> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                return Err(OfferingError::upstream("reserved", "service down"));
            }
            Ok(OfferingPage {
                offerings: vec![Offering {
                    availability_zone: filter.availability_zone.clone(),
                    offering_type: filter.offering_type.clone(),
                    instance_type: filter
                        .instance_type
                        .clone()
                        .or_else(|| Some("unfiltered".to_string())),
                    ..Default::default()
                }],
                next_token: None,
            })
        }
    }

    struct Harness {
        aggregator: OfferingAggregator,
        on_demand_calls: Arc<AtomicUsize>,
        reserved_calls: Arc<AtomicUsize>,
    }

    fn harness(catalog: Vec<Offering>, on_demand_fail: bool, reserved_fail: bool) -> Harness {
        let on_demand_calls = Arc::new(AtomicUsize::new(0));
        let reserved_calls = Arc::new(AtomicUsize::new(0));
        let aggregator = OfferingAggregator::new(
            Arc::new(OfferingCache::new(Duration::from_secs(60))),
            Arc::new(FixedOnDemand {
                catalog,
                calls: Arc::clone(&on_demand_calls),
                fail: on_demand_fail,
            }),
            Arc::new(EchoReserved {
                calls: Arc::clone(&reserved_calls),
                fail: reserved_fail,
            }),
        );
        Harness {
            aggregator,
            on_demand_calls,
            reserved_calls,
        }
    }

    #[tokio::test]
    async fn test_single_token_round_merges_both_sources() {
        let harness = harness(
            vec![
                offering("us-east-1a", "Linux/UNIX", "t1.micro"),
                offering("us-east-1a", "Linux/UNIX", "m1.small"),
                offering("us-west-2a", "Linux/UNIX", "t1.micro"),
            ],
            false,
            false,
        );

        let envelope = harness
            .aggregator
            .get_offerings(Some("us-east-1a"), Some("linux"), Some("heavy"), Some("t1.micro"))
            .await
            .unwrap();

        // One on-demand match (zone + description + type) plus one reserved echo
        assert_eq!(envelope.ec2offerings.len(), 2);
        assert_eq!(
            envelope.ec2offerings[0].instance_type.as_deref(),
            Some("t1.micro")
        );
        assert_eq!(
            envelope.ec2offerings[1].offering_type.as_deref(),
            Some("Heavy Utilization")
        );
        assert_eq!(harness.on_demand_calls.load(Ordering::Relaxed), 1);
        assert_eq!(harness.reserved_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_multi_token_fan_out_preserves_token_order() {
        let harness = harness(vec![], false, false);

        let envelope = harness
            .aggregator
            .get_offerings(
                Some("us-east-1a"),
                Some("linux"),
                None,
                Some("t1.micro,m1.small"),
            )
            .await
            .unwrap();

        let types: Vec<_> = envelope
            .ec2offerings
            .iter()
            .filter_map(|o| o.instance_type.as_deref())
            .collect();
        assert_eq!(types, vec!["t1.micro", "m1.small"]);

        // One dual-source round per token
        assert_eq!(harness.on_demand_calls.load(Ordering::Relaxed), 2);
        assert_eq!(harness.reserved_calls.load(Ordering::Relaxed), 2);
        assert_eq!(harness.aggregator.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upstream() {
        let harness = harness(vec![offering("us-east-1a", "Linux/UNIX", "t1.micro")], false, false);

        let first = harness
            .aggregator
            .get_offerings(Some("us-east-1a"), Some("linux"), None, Some("t1.micro"))
            .await
            .unwrap();
        // Same filter spelled through aliases still hits the same entry
        let second = harness
            .aggregator
            .get_offerings(Some("us-east-1a"), Some("Linux/UNIX"), None, Some("t1.micro,"))
            .await
            .unwrap();

        assert_eq!(first.ec2offerings, second.ec2offerings);
        assert_eq!(harness.on_demand_calls.load(Ordering::Relaxed), 1);
        assert_eq!(harness.reserved_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_absent_instance_type_fetches_once_unfiltered() {
        let harness = harness(vec![offering("us-east-1a", "Linux/UNIX", "t1.micro")], false, false);

        let envelope = harness
            .aggregator
            .get_offerings(Some("us-east-1a"), Some("linux"), None, None)
            .await
            .unwrap();

        assert_eq!(harness.on_demand_calls.load(Ordering::Relaxed), 1);
        assert_eq!(harness.reserved_calls.load(Ordering::Relaxed), 1);
        let types: Vec<_> = envelope
            .ec2offerings
            .iter()
            .filter_map(|o| o.instance_type.as_deref())
            .collect();
        assert_eq!(types, vec!["t1.micro", "unfiltered"]);
    }

    #[tokio::test]
    async fn test_upstream_failures_degrade_to_empty_and_still_cache() {
        let harness = harness(vec![], true, true);

        let envelope = harness
            .aggregator
            .get_offerings(Some("us-east-1a"), Some("linux"), None, Some("t1.micro"))
            .await
            .unwrap();

        assert!(envelope.ec2offerings.is_empty());
        // The empty merge result was cached regardless
        assert_eq!(harness.aggregator.cache().len(), 1);

        // And the cached emptiness is reused without refetching
        harness
            .aggregator
            .get_offerings(Some("us-east-1a"), Some("linux"), None, Some("t1.micro"))
            .await
            .unwrap();
        assert_eq!(harness.on_demand_calls.load(Ordering::Relaxed), 1);
        assert_eq!(harness.reserved_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_one_failing_source_does_not_abort_the_other() {
        let harness = harness(vec![], true, false);

        let envelope = harness
            .aggregator
            .get_offerings(Some("us-east-1a"), Some("linux"), None, Some("t1.micro"))
            .await
            .unwrap();

        assert_eq!(envelope.ec2offerings.len(), 1);
        assert_eq!(
            envelope.ec2offerings[0].instance_type.as_deref(),
            Some("t1.micro")
        );
    }

    #[tokio::test]
    async fn test_invalid_argument_fails_before_cache_mutation() {
        let harness = harness(vec![], false, false);

        let err = harness
            .aggregator
            .get_offerings(Some("us-east-1a"), Some("solaris"), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, OfferingError::InvalidArgument { .. }));
        assert!(harness.aggregator.cache().is_empty());
        assert_eq!(harness.on_demand_calls.load(Ordering::Relaxed), 0);
    }
}
