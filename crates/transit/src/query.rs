//! Read-side joins over the catalog and the live feed.
//!
//! Every query is a pure read of the immutable catalog plus one feed
//! snapshot, so the service needs no locking of its own and a slow feed
//! poll can never block a caller.

use std::sync::Arc;
use std::time::Duration;

use geo::Point;

use crate::catalog::Catalog;
use crate::identifiers::{RouteIdentifier, StopIdentifier};
use crate::live::LiveFeed;
use crate::models::types::{Arrival, BusState, Result, Route, RouteCategory, Stop, TransitError};
use crate::spatial::{haversine_km, prefilter_radius_degrees};

/// A stop matched by [`QueryService::find_nearby`], with its distance from
/// the query point and the serving routes that passed the category filter.
#[derive(Clone, Debug)]
pub struct NearbyStop {
    pub stop: Arc<Stop>,
    pub distance_km: f64,
    pub routes: Vec<Arc<Route>>,
}

pub struct QueryService {
    catalog: Arc<Catalog>,
    feed: Arc<LiveFeed>,
    staleness_threshold: Duration,
}

impl QueryService {
    /// Feed age beyond which arrivals are flagged unreliable.
    pub const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::from_secs(120);

    pub fn new(catalog: Arc<Catalog>, feed: Arc<LiveFeed>) -> Self {
        Self::with_staleness_threshold(catalog, feed, Self::DEFAULT_STALENESS_THRESHOLD)
    }

    pub fn with_staleness_threshold(
        catalog: Arc<Catalog>,
        feed: Arc<LiveFeed>,
        staleness_threshold: Duration,
    ) -> Self {
        Self {
            catalog,
            feed,
            staleness_threshold,
        }
    }

    /// Stops within `radius_km` of `point` whose serving routes intersect
    /// `filter` (an empty filter means no category restriction), ordered by
    /// ascending haversine distance, ties by ascending stop id.
    pub fn find_nearby(
        &self,
        point: Point,
        radius_km: f64,
        filter: &[RouteCategory],
    ) -> Result<Vec<NearbyStop>> {
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(TransitError::InvalidRadius(radius_km));
        }

        let prefilter = prefilter_radius_degrees(radius_km, point.y());
        let mut results = Vec::new();
        for node in self.catalog.stops_within_degrees(point, prefilter) {
            let stop = node.stop();
            let distance_km = haversine_km(point, stop.location);
            if distance_km > radius_km {
                continue;
            }
            let routes: Vec<Arc<Route>> = self
                .catalog
                .routes_serving(&stop.id)
                .iter()
                .filter(|route| filter.is_empty() || filter.contains(&route.category))
                .cloned()
                .collect();
            if !filter.is_empty() && routes.is_empty() {
                continue;
            }
            results.push(NearbyStop {
                stop: Arc::clone(stop),
                distance_km,
                routes,
            });
        }

        results.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.stop.id.cmp(&b.stop.id))
        });
        Ok(results)
    }

    /// Projected arrivals at a stop: every vehicle whose next stop is
    /// `stop_id`, sorted by ascending ETA (ties by route id, then bus id).
    ///
    /// An empty vector means no vehicle is en route; that is an answer,
    /// not an error. A feed older than the staleness threshold flags every
    /// arrival `stale` instead of failing the call.
    pub fn arrivals_for(&self, stop_id: &StopIdentifier) -> Result<Vec<Arrival>> {
        if self.catalog.stop(stop_id).is_none() {
            return Err(TransitError::StopNotFound(stop_id.clone()));
        }

        let snapshot = self.feed.snapshot();
        let stale = self.feed.age_seconds() > self.staleness_threshold.as_secs();

        let mut en_route: Vec<&BusState> = snapshot.approaching(stop_id).collect();
        en_route.sort_by(|a, b| {
            a.eta_minutes
                .cmp(&b.eta_minutes)
                .then_with(|| a.route_id.cmp(&b.route_id))
                .then_with(|| a.bus_id.cmp(&b.bus_id))
        });

        Ok(en_route
            .into_iter()
            .map(|bus| {
                let remaining_stops = self
                    .catalog
                    .route(&bus.route_id)
                    .and_then(|route| route.stops_until(&bus.next_stop_id, stop_id))
                    // The vehicle's next stop is the queried stop, so it is
                    // one stop away even when the route sequence is sparse
                    .unwrap_or(1);
                Arrival {
                    route_id: bus.route_id.clone(),
                    stop_id: stop_id.clone(),
                    eta_minutes: bus.eta_minutes,
                    remaining_stops,
                    congestion: bus.congestion,
                    stale,
                }
            })
            .collect())
    }

    /// Live vehicle states on one route, sorted by bus id.
    pub fn buses_on_route(&self, route_id: &RouteIdentifier) -> Result<Vec<BusState>> {
        if self.catalog.route(route_id).is_none() {
            return Err(TransitError::RouteNotFound(route_id.clone()));
        }
        let snapshot = self.feed.snapshot();
        let mut buses: Vec<BusState> = snapshot.on_route(route_id).cloned().collect();
        buses.sort_by(|a, b| a.bus_id.cmp(&b.bus_id));
        Ok(buses)
    }

    /// Case-insensitive stop-name search; see [`Catalog::search_stops`].
    pub fn search_stops(&self, keyword: &str) -> Vec<Arc<Stop>> {
        self.catalog.search_stops(keyword)
    }

    /// Stops in a district; see [`Catalog::stops_in_district`].
    pub fn stops_in_district(&self, district: &str) -> Vec<Arc<Stop>> {
        self.catalog.stops_in_district(district)
    }
}
