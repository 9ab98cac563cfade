//! Time-varying vehicle state behind copy-on-write snapshots.
//!
//! The feed has exactly one write operation, [`LiveFeed::ingest`], which
//! replaces the whole vehicle set. Readers hold an `Arc` to an immutable
//! [`FeedSnapshot`] and can never observe half of an old batch and half of
//! a new one: the replacement snapshot is built entirely off to the side
//! and published with a single pointer swap.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::catalog::Catalog;
use crate::identifiers::{BusIdentifier, RouteIdentifier, StopIdentifier};
use crate::models::types::{BusState, Result, TransitError};

/// Immutable point-in-time view of the live bus set.
pub struct FeedSnapshot {
    buses: Vec<BusState>,
    by_bus: HashMap<BusIdentifier, usize>,
    by_route: HashMap<RouteIdentifier, Vec<usize>>,
    by_next_stop: HashMap<StopIdentifier, Vec<usize>>,
    published_at: Option<DateTime<Utc>>,
}

impl FeedSnapshot {
    fn empty() -> Self {
        Self::build(Vec::new(), None)
    }

    fn build(buses: Vec<BusState>, published_at: Option<DateTime<Utc>>) -> Self {
        let mut by_bus = HashMap::with_capacity(buses.len());
        let mut by_route: HashMap<RouteIdentifier, Vec<usize>> = HashMap::new();
        let mut by_next_stop: HashMap<StopIdentifier, Vec<usize>> = HashMap::new();
        for (index, bus) in buses.iter().enumerate() {
            by_bus.insert(bus.bus_id.clone(), index);
            by_route.entry(bus.route_id.clone()).or_default().push(index);
            by_next_stop
                .entry(bus.next_stop_id.clone())
                .or_default()
                .push(index);
        }
        Self {
            buses,
            by_bus,
            by_route,
            by_next_stop,
            published_at,
        }
    }

    pub fn buses(&self) -> &[BusState] {
        &self.buses
    }

    pub fn bus(&self, id: &BusIdentifier) -> Option<&BusState> {
        self.by_bus.get(id).map(|&index| &self.buses[index])
    }

    /// Vehicles currently reporting on a route.
    pub fn on_route(&self, id: &RouteIdentifier) -> impl Iterator<Item = &BusState> {
        self.by_route
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&index| &self.buses[index])
    }

    /// Vehicles whose next stop is `id`.
    pub fn approaching(&self, id: &StopIdentifier) -> impl Iterator<Item = &BusState> {
        self.by_next_stop
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&index| &self.buses[index])
    }

    /// When this snapshot was published; `None` for the initial empty one.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }
}

/// The mutable live bus set. One writer (the feed poller), any number of
/// concurrent readers.
pub struct LiveFeed {
    catalog: Arc<Catalog>,
    current: RwLock<Arc<FeedSnapshot>>,
}

impl LiveFeed {
    /// An empty feed, maximally stale until the first successful ingest.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            current: RwLock::new(Arc::new(FeedSnapshot::empty())),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Replace the entire vehicle set, all-or-nothing.
    ///
    /// The batch is validated first; on any defect the error names the
    /// first offending record and the previous snapshot stays in effect.
    /// A vehicle absent from the batch is dropped: absence in the latest
    /// tick is its logical deletion. An empty batch is valid and clears
    /// the feed.
    pub fn ingest(&self, batch: Vec<BusState>) -> Result<()> {
        self.validate_batch(&batch)?;
        self.publish(Arc::new(FeedSnapshot::build(batch, Some(Utc::now()))));
        Ok(())
    }

    /// The last successfully published snapshot.
    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        // A poisoned lock still holds the last fully published snapshot;
        // the swap in `publish` is a single assignment and cannot tear it.
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Time since the last successful ingest; `None` before the first one.
    pub fn age(&self) -> Option<Duration> {
        self.snapshot().published_at().map(|t| Utc::now() - t)
    }

    /// Whole seconds since the last successful ingest, saturating to
    /// `u64::MAX` for a feed that has never been filled.
    pub fn age_seconds(&self) -> u64 {
        match self.age() {
            Some(age) => age.num_seconds().max(0) as u64,
            None => u64::MAX,
        }
    }

    fn publish(&self, next: Arc<FeedSnapshot>) {
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn validate_batch(&self, batch: &[BusState]) -> Result<()> {
        let mut seen = HashSet::with_capacity(batch.len());
        for bus in batch {
            if !seen.insert(bus.bus_id.clone()) {
                return Err(TransitError::RejectedBatch(format!(
                    "bus {}: reported twice in one batch",
                    bus.bus_id
                )));
            }
            if self.catalog.route(&bus.route_id).is_none() {
                return Err(TransitError::RejectedBatch(format!(
                    "bus {}: unknown route {}",
                    bus.bus_id, bus.route_id
                )));
            }
            if self.catalog.stop(&bus.next_stop_id).is_none() {
                return Err(TransitError::RejectedBatch(format!(
                    "bus {}: unknown next stop {}",
                    bus.bus_id, bus.next_stop_id
                )));
            }
            if !bus.speed_kmh.is_finite() || bus.speed_kmh < 0.0 {
                return Err(TransitError::RejectedBatch(format!(
                    "bus {}: invalid speed {}",
                    bus.bus_id, bus.speed_kmh
                )));
            }
            let (lon, lat) = (bus.location.x(), bus.location.y());
            if !lon.is_finite()
                || !lat.is_finite()
                || !(-180.0..=180.0).contains(&lon)
                || !(-90.0..=90.0).contains(&lat)
            {
                return Err(TransitError::RejectedBatch(format!(
                    "bus {}: coordinate ({lon}, {lat}) out of range",
                    bus.bus_id
                )));
            }
        }
        Ok(())
    }

    /// Shift the current snapshot's publish time into the past.
    #[cfg(test)]
    pub(crate) fn backdate(&self, seconds: i64) {
        let snapshot = self.snapshot();
        let shifted = FeedSnapshot::build(
            snapshot.buses().to_vec(),
            snapshot.published_at().map(|t| t - Duration::seconds(seconds)),
        );
        self.publish(Arc::new(shifted));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{CongestionLevel, Route, RouteCategory, Stop};
    use geo::Point;

    fn test_catalog() -> Arc<Catalog> {
        let stops = vec![
            Stop {
                id: StopIdentifier::new("s1"),
                name: "City Hall Station".into(),
                location: Point::new(126.9779, 37.5658),
                direction: "toward Gangnam".into(),
                district: "Jung-gu".into(),
            },
            Stop {
                id: StopIdentifier::new("s2"),
                name: "Gwanghwamun".into(),
                location: Point::new(126.9769, 37.5720),
                direction: "toward Yeoksam".into(),
                district: "Jongno-gu".into(),
            },
        ];
        let routes = vec![
            Route {
                id: RouteIdentifier::new("472"),
                name: "Bus 472".into(),
                category: RouteCategory::Branch,
                direction: "Gangnam to City Hall".into(),
                stops: vec![StopIdentifier::new("s1")],
            },
            Route {
                id: RouteIdentifier::new("143"),
                name: "Bus 143".into(),
                category: RouteCategory::Trunk,
                direction: "Yeoksam to Gwanghwamun".into(),
                stops: vec![StopIdentifier::new("s2")],
            },
        ];
        Arc::new(Catalog::from_data(routes, stops).unwrap())
    }

    fn bus(bus_id: &str, route_id: &str, next_stop: &str) -> BusState {
        BusState {
            bus_id: BusIdentifier::new(bus_id),
            route_id: RouteIdentifier::new(route_id),
            location: Point::new(126.9780, 37.5665),
            speed_kmh: 25.0,
            congestion: CongestionLevel::Medium,
            next_stop_id: StopIdentifier::new(next_stop),
            eta_minutes: 3,
        }
    }

    #[test]
    fn test_empty_feed_is_maximally_stale() {
        let feed = LiveFeed::new(test_catalog());
        assert!(feed.snapshot().is_empty());
        assert_eq!(feed.age_seconds(), u64::MAX);
        assert!(feed.age().is_none());
    }

    #[test]
    fn test_ingest_and_lookups() {
        let feed = LiveFeed::new(test_catalog());
        feed.ingest(vec![bus("472001", "472", "s1"), bus("143001", "143", "s2")])
            .unwrap();

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.bus(&BusIdentifier::new("472001")).is_some());
        assert_eq!(snapshot.on_route(&RouteIdentifier::new("472")).count(), 1);
        assert_eq!(snapshot.approaching(&StopIdentifier::new("s2")).count(), 1);
        assert!(feed.age_seconds() < 5);
    }

    #[test]
    fn test_absent_vehicle_is_dropped() {
        let feed = LiveFeed::new(test_catalog());
        feed.ingest(vec![bus("472001", "472", "s1"), bus("472002", "472", "s1")])
            .unwrap();
        feed.ingest(vec![bus("472002", "472", "s1")]).unwrap();

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.bus(&BusIdentifier::new("472001")).is_none());
    }

    #[test]
    fn test_empty_batch_clears_feed() {
        let feed = LiveFeed::new(test_catalog());
        feed.ingest(vec![bus("472001", "472", "s1")]).unwrap();
        feed.ingest(vec![]).unwrap();
        assert!(feed.snapshot().is_empty());
        // Still counts as a successful ingest
        assert!(feed.age_seconds() < 5);
    }

    #[test]
    fn test_unknown_route_rejects_whole_batch() {
        let feed = LiveFeed::new(test_catalog());
        feed.ingest(vec![bus("472001", "472", "s1")]).unwrap();

        let err = feed
            .ingest(vec![bus("472002", "472", "s1"), bus("999001", "999", "s1")])
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("999001"), "{message}");

        // Prior snapshot untouched
        let snapshot = feed.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.bus(&BusIdentifier::new("472001")).is_some());
    }

    #[test]
    fn test_unknown_next_stop_rejected() {
        let feed = LiveFeed::new(test_catalog());
        let err = feed.ingest(vec![bus("472001", "472", "ghost")]).unwrap_err();
        assert!(matches!(err, TransitError::RejectedBatch(_)));
    }

    #[test]
    fn test_duplicate_vehicle_rejected() {
        let feed = LiveFeed::new(test_catalog());
        let err = feed
            .ingest(vec![bus("472001", "472", "s1"), bus("472001", "472", "s1")])
            .unwrap_err();
        assert!(matches!(err, TransitError::RejectedBatch(_)));
    }

    #[test]
    fn test_negative_speed_rejected() {
        let feed = LiveFeed::new(test_catalog());
        let mut b = bus("472001", "472", "s1");
        b.speed_kmh = -1.0;
        assert!(feed.ingest(vec![b]).is_err());

        let mut b = bus("472001", "472", "s1");
        b.speed_kmh = f64::NAN;
        assert!(feed.ingest(vec![b]).is_err());
    }

    #[test]
    fn test_snapshot_never_mixes_batches() {
        let feed = Arc::new(LiveFeed::new(test_catalog()));
        let batch_a = || vec![bus("a1", "472", "s1"), bus("a2", "472", "s1")];
        let batch_b = || vec![bus("b1", "143", "s2"), bus("b2", "143", "s2")];
        feed.ingest(batch_a()).unwrap();

        let writer = {
            let feed = Arc::clone(&feed);
            std::thread::spawn(move || {
                for i in 0..500 {
                    let batch = if i % 2 == 0 { batch_b() } else { batch_a() };
                    feed.ingest(batch).unwrap();
                }
            })
        };

        for _ in 0..500 {
            let snapshot = feed.snapshot();
            let all_a = snapshot
                .buses()
                .iter()
                .all(|b| b.bus_id.as_str().starts_with('a'));
            let all_b = snapshot
                .buses()
                .iter()
                .all(|b| b.bus_id.as_str().starts_with('b'));
            assert!(all_a || all_b, "observed a half-applied batch");
            assert_eq!(snapshot.len(), 2);
        }

        writer.join().unwrap();
    }

    #[test]
    fn test_backdate_shifts_age() {
        let feed = LiveFeed::new(test_catalog());
        feed.ingest(vec![bus("472001", "472", "s1")]).unwrap();
        feed.backdate(300);
        let age = feed.age_seconds();
        assert!((300..=305).contains(&age), "age {age}");
    }
}
