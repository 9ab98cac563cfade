//! Sample dataset: two central-Seoul bus routes, four stops, two vehicles.
//!
//! Stands in for a real upstream adapter in tests and demos, behind the
//! same contracts the production sources use.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use geo::Point;

use bustrackr_transit::{
    BusIdentifier, BusState, Catalog, CongestionLevel, Route, RouteCategory, RouteIdentifier,
    Stop, StopIdentifier,
};

use crate::error::{CoreError, Result};
use crate::source::FeedSource;

/// Reference data for routes 472 and 143.
pub fn sample_catalog() -> Catalog {
    let routes = vec![
        Route {
            id: RouteIdentifier::new("472"),
            name: "Bus 472".into(),
            category: RouteCategory::Branch,
            direction: "Gangnam to City Hall".into(),
            stops: vec![StopIdentifier::new("23001"), StopIdentifier::new("23002")],
        },
        Route {
            id: RouteIdentifier::new("143"),
            name: "Bus 143".into(),
            category: RouteCategory::Trunk,
            direction: "Yeoksam to Gwanghwamun".into(),
            stops: vec![StopIdentifier::new("23003"), StopIdentifier::new("23004")],
        },
    ];
    let stops = vec![
        Stop {
            id: StopIdentifier::new("23001"),
            name: "Gangnam-gu Office".into(),
            location: Point::new(127.0473, 37.5172),
            direction: "toward City Hall".into(),
            district: "Gangnam-gu".into(),
        },
        Stop {
            id: StopIdentifier::new("23002"),
            name: "City Hall Station".into(),
            location: Point::new(126.9779, 37.5658),
            direction: "toward Gangnam".into(),
            district: "Jung-gu".into(),
        },
        Stop {
            id: StopIdentifier::new("23003"),
            name: "Yeoksam Station".into(),
            location: Point::new(127.0366, 37.5006),
            direction: "toward Gwanghwamun".into(),
            district: "Gangnam-gu".into(),
        },
        Stop {
            id: StopIdentifier::new("23004"),
            name: "Gwanghwamun".into(),
            location: Point::new(126.9769, 37.5720),
            direction: "toward Yeoksam".into(),
            district: "Jongno-gu".into(),
        },
    ];
    Catalog::from_data(routes, stops).expect("fixture catalog is well formed")
}

/// One vehicle per sample route, mid-run.
pub fn sample_batch() -> Vec<BusState> {
    vec![
        BusState {
            bus_id: BusIdentifier::new("472001"),
            route_id: RouteIdentifier::new("472"),
            location: Point::new(126.9780, 37.5665),
            speed_kmh: 25.0,
            congestion: CongestionLevel::Medium,
            next_stop_id: StopIdentifier::new("23002"),
            eta_minutes: 3,
        },
        BusState {
            bus_id: BusIdentifier::new("143001"),
            route_id: RouteIdentifier::new("143"),
            location: Point::new(126.9758, 37.5635),
            speed_kmh: 30.0,
            congestion: CongestionLevel::Low,
            next_stop_id: StopIdentifier::new("23004"),
            eta_minutes: 8,
        },
    ]
}

/// Scripted [`FeedSource`]: hands out the given batches in order, then
/// fails like a dead upstream.
pub struct FixtureFeedSource {
    batches: Mutex<VecDeque<Vec<BusState>>>,
}

impl FixtureFeedSource {
    pub fn new(batches: impl IntoIterator<Item = Vec<BusState>>) -> Self {
        Self {
            batches: Mutex::new(batches.into_iter().collect()),
        }
    }

    pub fn single(batch: Vec<BusState>) -> Self {
        Self::new([batch])
    }
}

impl FeedSource for FixtureFeedSource {
    fn fetch<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<Vec<BusState>>> + Send + 'a>> {
        Box::pin(async move {
            let mut batches = match self.batches.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            batches
                .pop_front()
                .ok_or_else(|| CoreError::Fetch("fixture source exhausted".into()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bustrackr_transit::LiveFeed;
    use std::sync::Arc;

    #[test]
    fn test_sample_batch_matches_sample_catalog() {
        let feed = LiveFeed::new(Arc::new(sample_catalog()));
        feed.ingest(sample_batch()).unwrap();
        assert_eq!(feed.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_fixture_source_exhausts() {
        let source = FixtureFeedSource::single(sample_batch());
        assert_eq!(source.fetch().await.unwrap().len(), 2);
        assert!(matches!(
            source.fetch().await.unwrap_err(),
            CoreError::Fetch(_)
        ));
    }
}
