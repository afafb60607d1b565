//! # Upstream Gateway
//!
//! The two pricing sources behind the aggregator, each behind a trait so the
//! orchestration layer never knows what transport it is talking to:
//!
//! - [`OnDemandSource`]: one blocking-from-the-caller's-perspective fetch of
//!   the full static on-demand catalog; the caller filters client-side.
//! - [`ReservedSource`]: a server-side-filtered, continuation-token-paginated
//!   query. Absence of a continuation token signals the last page.
//!
//! [`page_stream`] lifts the pagination contract into a lazy, finite
//! `futures::Stream` of pages that the aggregator drains fully, instead of a
//! do-while loop over a mutable token.

pub mod ondemand;
pub mod reserved;

pub use ondemand::HttpOnDemandClient;
pub use reserved::HttpReservedClient;

use async_trait::async_trait;
use futures::stream::try_unfold;
use futures::Stream;

use crate::core::error::OfferingResult;
use crate::model::Offering;
use crate::query::OfferingFilter;

/// One page of reserved offerings plus the cursor to the next page, if any
#[derive(Debug, Clone, Default)]
pub struct OfferingPage {
    pub offerings: Vec<Offering>,
    /// Opaque continuation token; `None` means this was the last page
    pub next_token: Option<String>,
}

/// The static on-demand pricing document
#[async_trait]
pub trait OnDemandSource: Send + Sync {
    /// Fetch the full catalog in one call
    async fn fetch_catalog(&self) -> OfferingResult<Vec<Offering>>;
}

/// The paginated reserved-offerings query service
#[async_trait]
pub trait ReservedSource: Send + Sync {
    /// Fetch one page of offerings matching `filter`, continuing from
    /// `next_token` when one was returned by the prior page
    async fn fetch_page(
        &self,
        filter: &OfferingFilter,
        next_token: Option<&str>,
    ) -> OfferingResult<OfferingPage>;
}

enum PageCursor {
    First,
    Next(String),
    Done,
}

/// A finite stream over every page the reserved source has for `filter`
///
/// The stream terminates exactly when a page comes back without a
/// continuation token. Each call produces a fresh, restartable traversal.
pub fn page_stream<'a>(
    source: &'a dyn ReservedSource,
    filter: &'a OfferingFilter,
) -> impl Stream<Item = OfferingResult<OfferingPage>> + 'a {
    try_unfold(PageCursor::First, move |cursor| async move {
        let token = match cursor {
            PageCursor::First => None,
            PageCursor::Next(token) => Some(token),
            PageCursor::Done => return Ok(None),
        };

        let page = source.fetch_page(filter, token.as_deref()).await?;
        let next = match page.next_token.clone() {
            Some(token) => PageCursor::Next(token),
            None => PageCursor::Done,
        };
        Ok(Some((page, next)))
    })
}
