//! Pluggable upstream feed seam.
//!
//! Concrete adapters (a municipal bus API client, a replay file, a test
//! fixture) implement this trait outside the serving core; the poller only
//! sees decoded [`BusState`] batches.

use std::future::Future;
use std::pin::Pin;

use bustrackr_transit::BusState;

use crate::error::Result;

/// Fetch the current vehicle batch from the upstream provider.
pub trait FeedSource: Send + Sync {
    fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<Vec<BusState>>> + Send + 'a>>;
}
