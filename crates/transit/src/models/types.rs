//! Core data types and enums for the bus-tracking domain.

use std::sync::Arc;

use geo::Point;

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Service category of a bus route.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RouteCategory {
    Express,
    Trunk,
    Branch,
    Circular,
    Wide,
}

impl RouteCategory {
    /// Parse the lowercase name used in catalog documents.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "express" => Some(Self::Express),
            "trunk" => Some(Self::Trunk),
            "branch" => Some(Self::Branch),
            "circular" => Some(Self::Circular),
            "wide" => Some(Self::Wide),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Express => "express",
            Self::Trunk => "trunk",
            Self::Branch => "branch",
            Self::Circular => "circular",
            Self::Wide => "wide",
        }
    }
}

/// Coarse per-vehicle occupancy indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CongestionLevel {
    Low,
    Medium,
    High,
}

impl CongestionLevel {
    /// Map the upstream feed's congestion codes (3 = relaxed, 4 = normal,
    /// 5 = crowded).
    pub fn from_code(value: u8) -> Option<Self> {
        match value {
            3 => Some(Self::Low),
            4 => Some(Self::Medium),
            5 => Some(Self::High),
            _ => None,
        }
    }
}

// ============================================================================
// Reference data
// ============================================================================

/// A bus route. Immutable once the catalog is loaded.
///
/// `stops` is the ordered sequence of stops the route serves; the query
/// layer derives serving-route sets and remaining-stop counts from it.
#[derive(Clone, Debug)]
pub struct Route {
    pub id: RouteIdentifier,
    pub name: Arc<str>,
    pub category: RouteCategory,
    pub direction: Arc<str>,
    pub stops: Vec<StopIdentifier>,
}

impl Route {
    pub fn serves(&self, stop: &StopIdentifier) -> bool {
        self.stops.contains(stop)
    }

    /// Number of stop visits left until the route serves `to`, for a vehicle
    /// whose next stop is `from` (both inclusive, so `from == to` gives 1).
    /// `None` if either stop is not on the route in that order.
    pub fn stops_until(&self, from: &StopIdentifier, to: &StopIdentifier) -> Option<u32> {
        let start = self.stops.iter().position(|s| s == from)?;
        let offset = self.stops[start..].iter().position(|s| s == to)?;
        Some(offset as u32 + 1)
    }
}

/// A bus stop. Immutable once the catalog is loaded.
///
/// `location` stores longitude as x and latitude as y, in degrees.
#[derive(Clone, Debug)]
pub struct Stop {
    pub id: StopIdentifier,
    pub name: Arc<str>,
    pub location: Point,
    pub direction: Arc<str>,
    pub district: Arc<str>,
}

// ============================================================================
// Live data
// ============================================================================

/// Last reported state of a single vehicle.
///
/// Replaced wholesale on every feed batch; a vehicle absent from the latest
/// batch is gone from the snapshot.
#[derive(Clone, Debug)]
pub struct BusState {
    pub bus_id: BusIdentifier,
    pub route_id: RouteIdentifier,
    pub location: Point,
    pub speed_kmh: f64,
    pub congestion: CongestionLevel,
    pub next_stop_id: StopIdentifier,
    pub eta_minutes: u32,
}

/// Projected arrival of a vehicle at a stop. Computed per query, never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Arrival {
    pub route_id: RouteIdentifier,
    pub stop_id: StopIdentifier,
    pub eta_minutes: u32,
    pub remaining_stops: u32,
    pub congestion: CongestionLevel,
    /// Set when the feed was older than the staleness threshold at query time.
    pub stale: bool,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("stop not found: {0}")]
    StopNotFound(StopIdentifier),

    #[error("route not found: {0}")]
    RouteNotFound(RouteIdentifier),

    #[error("invalid search radius: {0} km")]
    InvalidRadius(f64),

    #[error("malformed reference data: {0}")]
    MalformedCatalog(String),

    #[error("rejected feed batch: {0}")]
    RejectedBatch(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;
