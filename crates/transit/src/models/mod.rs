//! Transit data models and types.

pub mod types;

// Re-exports for convenience
pub use types::{
    Arrival, BusState, CongestionLevel, Result, Route, RouteCategory, Stop, TransitError,
};
