//! # bustrackr-transit
//!
//! In-memory serving core for live bus tracking.
//!
//! ## Features
//!
//! - **Static catalog**: routes and stops loaded once, validated, then read-only
//! - **Live feed**: whole-batch vehicle updates published as copy-on-write snapshots
//! - **Spatial queries**: R-tree pre-filter plus exact haversine distances
//! - **Query layer**: nearby-stop search and per-stop arrival projections
//!
//! ## Example
//!
//! ```
//! use bustrackr_transit::prelude::*;
//! use geo::Point;
//! use std::sync::Arc;
//!
//! let city_hall = Stop {
//!     id: StopIdentifier::new("23002"),
//!     name: "City Hall Station".into(),
//!     location: Point::new(126.9779, 37.5658),
//!     direction: "toward Gangnam".into(),
//!     district: "Jung-gu".into(),
//! };
//!
//! let route = Route {
//!     id: RouteIdentifier::new("472"),
//!     name: "Bus 472".into(),
//!     category: RouteCategory::Branch,
//!     direction: "Gangnam to City Hall".into(),
//!     stops: vec![StopIdentifier::new("23002")],
//! };
//!
//! let catalog = Arc::new(Catalog::from_data(vec![route], vec![city_hall]).unwrap());
//! let feed = Arc::new(LiveFeed::new(catalog.clone()));
//! let queries = QueryService::new(catalog, feed);
//!
//! // Stops within 2 km of Gwanghwamun, any category
//! let point = Point::new(126.9769, 37.5759);
//! let nearby = queries.find_nearby(point, 2.0, &[]).unwrap();
//! assert_eq!(nearby.len(), 1);
//! ```

pub mod catalog;
pub mod identifiers;
pub mod live;
pub mod models;
pub mod query;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::identifiers::*;
    pub use crate::live::{FeedSnapshot, LiveFeed};
    pub use crate::models::types::*;
    pub use crate::query::{NearbyStop, QueryService};
}

pub use prelude::*;
