//! Spatial indexing and query utilities.

pub mod index;
pub mod queries;

pub use queries::{haversine_km, prefilter_radius_degrees};
