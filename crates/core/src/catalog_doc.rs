//! JSON catalog documents.
//!
//! Reference data arrives as a flat document of route and stop records
//! (a bundled fixture file, an operator export, whatever the deployment
//! points at) and is converted into a validated [`Catalog`]. Field names
//! follow the upstream data dictionary (`route_id`, `stop_name`, ...).

use std::fs;
use std::path::Path;

use geo::Point;
use serde::Deserialize;

use bustrackr_transit::{Catalog, Route, RouteCategory, Stop, TransitError};

use crate::error::{CoreError, Result};

#[derive(Debug, Deserialize)]
pub struct CatalogDocument {
    pub routes: Vec<RouteRecord>,
    pub stops: Vec<StopRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RouteRecord {
    pub route_id: String,
    pub route_name: String,
    /// Lowercase category name: express, trunk, branch, circular, wide.
    pub route_type: String,
    #[serde(default)]
    pub direction: String,
    /// Ordered stop ids the route serves.
    #[serde(default)]
    pub stops: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StopRecord {
    pub stop_id: String,
    pub stop_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub district: String,
}

/// Parse a catalog document and build the validated catalog.
pub fn parse_catalog(json: &str) -> Result<Catalog> {
    catalog_from_document(serde_json::from_str(json)?)
}

/// Read and parse a catalog document from disk.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog> {
    parse_catalog(&fs::read_to_string(path)?)
}

pub fn catalog_from_document(document: CatalogDocument) -> Result<Catalog> {
    let mut routes = Vec::with_capacity(document.routes.len());
    for record in document.routes {
        let category = RouteCategory::from_name(&record.route_type).ok_or_else(|| {
            CoreError::Transit(TransitError::MalformedCatalog(format!(
                "route {}: unknown category {:?}",
                record.route_id, record.route_type
            )))
        })?;
        routes.push(Route {
            id: record.route_id.into(),
            name: record.route_name.into(),
            category,
            direction: record.direction.into(),
            stops: record.stops.into_iter().map(Into::into).collect(),
        });
    }

    let stops = document
        .stops
        .into_iter()
        .map(|record| Stop {
            id: record.stop_id.into(),
            name: record.stop_name.into(),
            location: Point::new(record.longitude, record.latitude),
            direction: record.direction.into(),
            district: record.district.into(),
        })
        .collect();

    Ok(Catalog::from_data(routes, stops)?)
}
