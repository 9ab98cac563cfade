//! Runtime glue around the bustrackr serving core: upstream feed polling,
//! configuration, catalog documents, and sample fixtures.
//!
//! The data model and query layer live in the transit crate; this crate
//! owns everything that touches a clock, a file, or a network seam.

pub mod catalog_doc;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod poller;
pub mod source;

// Re-export the data-model crate under a short name
pub use bustrackr_transit as transit;

pub use config::PollerConfig;
pub use error::{CoreError, Result};
pub use poller::FeedPoller;
pub use source::FeedSource;
