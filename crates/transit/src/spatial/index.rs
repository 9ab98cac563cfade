//! R-tree node wrapping a catalog stop for spatial lookups.
//!
//! The tree works in raw degree space; callers convert their search radius
//! with [`super::queries::prefilter_radius_degrees`] and re-check candidates
//! with the haversine distance.

use std::sync::Arc;

use geo::Point;
use rstar::{PointDistance, RTreeObject, AABB};

use crate::models::types::Stop;

#[derive(Clone)]
pub struct StopNode {
    stop: Arc<Stop>,
    point: [f64; 2],
}

impl StopNode {
    pub fn new(stop: Arc<Stop>) -> Self {
        let point = [stop.location.x(), stop.location.y()];
        Self { stop, point }
    }

    pub fn stop(&self) -> &Arc<Stop> {
        &self.stop
    }

    pub fn location(&self) -> Point {
        self.stop.location
    }
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StopNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}
