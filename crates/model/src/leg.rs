use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    coordinate::{Coordinate, Geometry},
    waypoint::Waypoint,
};

/// Why a leg is drawn as a straight fallback line instead of a road geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FallbackReason {
    /// The routing service could not be reached or failed internally.
    Unreachable,
    /// The routing service refused the request because of its rate limit.
    RateLimited,
    /// The routing service answered, but knows no route between the points.
    NoRoute,
    /// The answer could not be understood.
    InvalidResponse,
    /// Routing is switched off, the straight line was asked for.
    NotRequested,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "routing service unreachable"),
            Self::RateLimited => write!(f, "rate limit reached"),
            Self::NoRoute => write!(f, "no route found"),
            Self::InvalidResponse => write!(f, "invalid routing response"),
            Self::NotRequested => write!(f, "routing disabled"),
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub from: Waypoint,
    pub to: Waypoint,
    pub geometry: Option<Geometry>,
    pub fallback: Option<FallbackReason>,
}

impl RouteLeg {
    pub fn resolved(from: Waypoint, to: Waypoint, geometry: Geometry) -> Self {
        Self {
            from,
            to,
            geometry: Some(geometry),
            fallback: None,
        }
    }

    pub fn fallback(from: Waypoint, to: Waypoint, reason: FallbackReason) -> Self {
        Self {
            from,
            to,
            geometry: None,
            fallback: Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.geometry.is_none()
    }

    /// The coordinates to draw: the routed geometry, or a direct line between
    /// both waypoints.
    pub fn path(&self) -> Vec<Coordinate> {
        match &self.geometry {
            Some(geometry) => geometry.coordinates.clone(),
            None => vec![self.from.coordinate(), self.to.coordinate()],
        }
    }

    pub fn length_km(&self) -> f64 {
        match &self.geometry {
            Some(geometry) => geometry.length_km(),
            None => self.from.coordinate().distance_km(&self.to.coordinate()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoint::WaypointRole;

    fn waypoints() -> (Waypoint, Waypoint) {
        (
            Waypoint::new(0.0, 0.0, "A", WaypointRole::Pickup),
            Waypoint::new(0.0, 1.0, "B", WaypointRole::Dropoff),
        )
    }

    #[test]
    fn fallback_path_is_straight() {
        let (a, b) = waypoints();
        let leg = RouteLeg::fallback(a.clone(), b.clone(), FallbackReason::NoRoute);
        assert!(leg.is_fallback());
        assert_eq!(leg.path(), vec![a.coordinate(), b.coordinate()]);
    }

    #[test]
    fn resolved_path_follows_geometry() {
        let (a, b) = waypoints();
        let geometry = Geometry::from_lon_lat(&[[0.0, 0.0], [0.5, 0.1], [1.0, 0.0]]);
        let leg = RouteLeg::resolved(a, b, geometry.clone());
        assert!(!leg.is_fallback());
        assert_eq!(leg.path(), geometry.coordinates);
        assert!(leg.length_km() > 111.0);
    }
}
