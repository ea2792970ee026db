use model::{
    coordinate::bounds_of,
    leg::{FallbackReason, RouteLeg},
    waypoint::Waypoint,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo::Bounds;

use crate::surface::{FitOptions, LineStyle, MapSurface, Marker, Polyline};

pub const DEFAULT_ROUTE_COLOR: &str = "#3388ff";
pub const PARTIAL_FAILURE_NOTICE: &str = "Failed to load some routes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailedLeg {
    /// Position of the leg, leg `i` connects waypoint `i` and `i + 1`.
    pub index: usize,
    pub reason: FallbackReason,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderSummary {
    pub markers: usize,
    pub lines: usize,
    pub failed_legs: Vec<FailedLeg>,
    pub bounds: Option<Bounds>,
    pub distance_km: f64,
    pub notice: Option<String>,
}

/// Draws waypoints and legs onto the surface it owns.
pub struct MapRenderer<S> {
    surface: S,
    fit: FitOptions,
}

impl<S: MapSurface> MapRenderer<S> {
    pub fn new(surface: S, fit: FitOptions) -> Self {
        Self { surface, fit }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn clear(&mut self) {
        self.surface.clear();
    }

    /// Replaces everything on the surface with `waypoints` and `legs` and
    /// fits the view to all of it.
    pub fn render(
        &mut self,
        waypoints: &[Waypoint],
        legs: &[RouteLeg],
        color: &str,
    ) -> RenderSummary {
        self.surface.clear();

        for waypoint in waypoints {
            self.surface.add_marker(Marker {
                coordinate: waypoint.coordinate(),
                label: waypoint.label.clone(),
                role: waypoint.role,
                color: Marker::role_color(waypoint.role).to_owned(),
            });
        }

        let mut bounds = Bounds::from_points(
            waypoints
                .iter()
                .map(|waypoint| (waypoint.latitude, waypoint.longitude)),
        );
        let mut failed_legs = vec![];
        let mut distance_km = 0.0;

        // legs only exist for two or more waypoints
        let legs = if waypoints.len() < 2 { &[][..] } else { legs };
        for (index, leg) in legs.iter().enumerate() {
            let path = leg.path();
            let style = if leg.is_fallback() {
                failed_legs.push(FailedLeg {
                    index,
                    reason: leg.fallback.unwrap_or(FallbackReason::NoRoute),
                });
                LineStyle::fallback(color)
            } else {
                LineStyle::solid(color)
            };
            if let Some(leg_bounds) = bounds_of(path.iter()) {
                bounds = Some(match bounds {
                    Some(bounds) => bounds.union(&leg_bounds),
                    None => leg_bounds,
                });
            }
            distance_km += leg.length_km();
            self.surface.add_line(Polyline {
                coordinates: path,
                style,
            });
        }

        if let Some(bounds) = bounds {
            self.surface.fit_bounds(bounds, self.fit);
        }

        RenderSummary {
            markers: waypoints.len(),
            lines: legs.len(),
            notice: failed_legs
                .iter()
                .any(|leg| leg.reason != FallbackReason::NotRequested)
                .then(|| PARTIAL_FAILURE_NOTICE.to_owned()),
            failed_legs,
            bounds,
            distance_km,
        }
    }
}
