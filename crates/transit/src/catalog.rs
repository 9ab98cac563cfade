//! Static reference data: routes and stops.
//!
//! Loaded once at startup, validated eagerly, read-only afterwards. Where
//! the data comes from (a fixture, a file, a network adapter) is the
//! caller's concern; this type only sees the finished rows.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use geo::Point;
use rstar::RTree;

use crate::identifiers::{RouteIdentifier, StopIdentifier};
use crate::models::types::{Result, Route, Stop, TransitError};
use crate::spatial::index::StopNode;

/// Immutable catalog of routes and stops with id lookups, a serving-route
/// index, and a spatial index over stop locations.
///
/// Cheap to clone; all rows live behind `Arc`s.
#[derive(Clone)]
pub struct Catalog {
    routes: Vec<Arc<Route>>,
    stops: Vec<Arc<Stop>>,

    route_map: HashMap<RouteIdentifier, Arc<Route>>,
    stop_map: HashMap<StopIdentifier, Arc<Stop>>,
    routes_by_stop: HashMap<StopIdentifier, Vec<Arc<Route>>>,

    stop_tree: RTree<StopNode>,
}

impl Catalog {
    /// Build and validate a catalog.
    ///
    /// Fails fast with [`TransitError::MalformedCatalog`] on the first
    /// defect: duplicate ids, blank display names, coordinates outside
    /// valid degree ranges, or a route stop sequence naming an unknown stop.
    pub fn from_data(routes: Vec<Route>, stops: Vec<Stop>) -> Result<Self> {
        let stops: Vec<Arc<Stop>> = stops.into_iter().map(Arc::new).collect();
        let routes: Vec<Arc<Route>> = routes.into_iter().map(Arc::new).collect();

        let mut stop_map = HashMap::with_capacity(stops.len());
        for stop in &stops {
            validate_stop(stop)?;
            match stop_map.entry(stop.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(stop.clone());
                }
                Entry::Occupied(_) => {
                    return Err(TransitError::MalformedCatalog(format!(
                        "duplicate stop id {}",
                        stop.id
                    )));
                }
            }
        }

        let mut route_map = HashMap::with_capacity(routes.len());
        let mut routes_by_stop: HashMap<StopIdentifier, Vec<Arc<Route>>> = HashMap::new();
        for route in &routes {
            if route.name.trim().is_empty() {
                return Err(TransitError::MalformedCatalog(format!(
                    "route {}: blank display name",
                    route.id
                )));
            }
            match route_map.entry(route.id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(route.clone());
                }
                Entry::Occupied(_) => {
                    return Err(TransitError::MalformedCatalog(format!(
                        "duplicate route id {}",
                        route.id
                    )));
                }
            }
            for stop_id in &route.stops {
                if !stop_map.contains_key(stop_id) {
                    return Err(TransitError::MalformedCatalog(format!(
                        "route {}: unknown stop {} in stop sequence",
                        route.id, stop_id
                    )));
                }
                let serving = routes_by_stop.entry(stop_id.clone()).or_default();
                // A circular route lists its terminal twice; index it once
                if !serving.iter().any(|r| r.id == route.id) {
                    serving.push(route.clone());
                }
            }
        }

        let stop_tree = RTree::bulk_load(stops.iter().map(|s| StopNode::new(s.clone())).collect());

        Ok(Self {
            routes,
            stops,
            route_map,
            stop_map,
            routes_by_stop,
            stop_tree,
        })
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn stops(&self) -> &[Arc<Stop>] {
        &self.stops
    }

    pub fn route(&self, id: &RouteIdentifier) -> Option<&Arc<Route>> {
        self.route_map.get(id)
    }

    pub fn stop(&self, id: &StopIdentifier) -> Option<&Arc<Stop>> {
        self.stop_map.get(id)
    }

    /// Routes whose stop sequence contains `id`, in catalog order.
    pub fn routes_serving(&self, id: &StopIdentifier) -> &[Arc<Route>] {
        self.routes_by_stop
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Case-insensitive substring search over stop names, sorted by stop id.
    pub fn search_stops(&self, keyword: &str) -> Vec<Arc<Stop>> {
        let needle = keyword.to_lowercase();
        let mut hits: Vec<Arc<Stop>> = self
            .stops
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        hits
    }

    /// Stops with an exact district label, sorted by stop id.
    pub fn stops_in_district(&self, district: &str) -> Vec<Arc<Stop>> {
        let mut hits: Vec<Arc<Stop>> = self
            .stops
            .iter()
            .filter(|s| s.district.as_ref() == district)
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        hits
    }

    /// Degree-space candidate scan for the query layer; results still need
    /// the exact haversine check.
    pub(crate) fn stops_within_degrees(
        &self,
        center: Point,
        radius_degrees: f64,
    ) -> impl Iterator<Item = &StopNode> {
        self.stop_tree
            .locate_within_distance([center.x(), center.y()], radius_degrees * radius_degrees)
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("routes", &self.routes.len())
            .field("stops", &self.stops.len())
            .finish()
    }
}

fn validate_stop(stop: &Stop) -> Result<()> {
    if stop.name.trim().is_empty() {
        return Err(TransitError::MalformedCatalog(format!(
            "stop {}: blank display name",
            stop.id
        )));
    }
    let (lon, lat) = (stop.location.x(), stop.location.y());
    if !lon.is_finite() || !lat.is_finite() || !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(TransitError::MalformedCatalog(format!(
            "stop {}: coordinate ({lon}, {lat}) out of range",
            stop.id
        )));
    }
    Ok(())
}
