//! Periodic feed ingestion.
//!
//! The poller is the only writer to a [`LiveFeed`]. Every tick it asks the
//! upstream source for a fresh batch under a timeout and publishes it; any
//! failure leaves the previous snapshot in effect, so in-flight queries
//! never block on a slow or dead upstream.

use std::sync::Arc;

use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use bustrackr_transit::LiveFeed;

use crate::config::PollerConfig;
use crate::error::{CoreError, Result};
use crate::source::FeedSource;

pub struct FeedPoller {
    feed: Arc<LiveFeed>,
    source: Arc<dyn FeedSource>,
    config: PollerConfig,
}

impl FeedPoller {
    pub fn new(feed: Arc<LiveFeed>, source: Arc<dyn FeedSource>, config: PollerConfig) -> Self {
        Self {
            feed,
            source,
            config,
        }
    }

    /// Fetch one batch and publish it. Returns the published vehicle count.
    pub async fn poll_once(&self) -> Result<usize> {
        let batch = timeout(self.config.fetch_timeout(), self.source.fetch())
            .await
            .map_err(|_| {
                CoreError::Fetch(format!(
                    "no response within {}s",
                    self.config.fetch_timeout_secs
                ))
            })??;
        let count = batch.len();
        self.feed.ingest(batch)?;
        Ok(count)
    }

    /// Poll on the configured interval until the task is dropped.
    ///
    /// Retry policy is deliberately plain: failures are logged and counted,
    /// the next tick tries again. Upstream-specific backoff belongs to the
    /// [`FeedSource`] adapter.
    pub async fn run(self) {
        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures = 0u32;

        loop {
            ticker.tick().await;
            debug!("polling upstream feed");
            match self.poll_once().await {
                Ok(count) => {
                    if consecutive_failures > 0 {
                        info!(after_failures = consecutive_failures, "upstream recovered");
                    }
                    consecutive_failures = 0;
                    info!(vehicles = count, "published feed snapshot");
                }
                Err(err) => {
                    consecutive_failures += 1;
                    warn!(
                        %err,
                        consecutive_failures,
                        "feed update failed, keeping previous snapshot"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_batch, sample_catalog, FixtureFeedSource};
    use bustrackr_transit::{BusState, RouteIdentifier};
    use std::future::Future;
    use std::pin::Pin;

    fn feed() -> Arc<LiveFeed> {
        Arc::new(LiveFeed::new(Arc::new(sample_catalog())))
    }

    #[tokio::test]
    async fn test_poll_once_publishes_batch() {
        let feed = feed();
        let source = Arc::new(FixtureFeedSource::single(sample_batch()));
        let poller = FeedPoller::new(Arc::clone(&feed), source, PollerConfig::default());

        let count = poller.poll_once().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(feed.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_snapshot() {
        let feed = feed();
        let source = Arc::new(FixtureFeedSource::single(sample_batch()));
        let poller = FeedPoller::new(Arc::clone(&feed), source, PollerConfig::default());

        poller.poll_once().await.unwrap();
        let err = poller.poll_once().await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch(_)));
        assert_eq!(feed.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_batch_keeps_previous_snapshot() {
        let mut bad = sample_batch();
        bad[0].route_id = RouteIdentifier::new("999");

        let feed = feed();
        let source = Arc::new(FixtureFeedSource::new([sample_batch(), bad]));
        let poller = FeedPoller::new(Arc::clone(&feed), source, PollerConfig::default());

        poller.poll_once().await.unwrap();
        let err = poller.poll_once().await.unwrap_err();
        assert!(matches!(err, CoreError::Transit(_)));

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.buses()[0].route_id.as_str(), "472");
    }

    struct StalledSource;

    impl FeedSource for StalledSource {
        fn fetch<'a>(
            &'a self,
        ) -> Pin<Box<dyn Future<Output = crate::error::Result<Vec<BusState>>> + Send + 'a>>
        {
            Box::pin(async {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Ok(Vec::new())
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_surfaces_as_fetch_error() {
        let poller = FeedPoller::new(feed(), Arc::new(StalledSource), PollerConfig::default());
        let err = poller.poll_once().await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch(_)));
    }
}
