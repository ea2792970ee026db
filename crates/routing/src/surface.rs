use model::{coordinate::Coordinate, waypoint::WaypointRole};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo::Bounds;

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_TILE_ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Raster tile source of the map background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_TILE_URL.to_owned(),
            attribution: DEFAULT_TILE_ATTRIBUTION.to_owned(),
            max_zoom: 19,
        }
    }
}

impl TileLayer {
    /// Url of a single tile.
    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        self.url_template
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub coordinate: Coordinate,
    pub label: String,
    pub role: WaypointRole,
    pub color: String,
}

impl Marker {
    pub fn role_color(role: WaypointRole) -> &'static str {
        match role {
            WaypointRole::Pickup => "#2e7d32",
            WaypointRole::Dropoff => "#c62828",
            WaypointRole::Intermediate => "#1565c0",
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub dash_array: Option<String>,
}

impl LineStyle {
    pub fn solid<S: Into<String>>(color: S) -> Self {
        Self {
            color: color.into(),
            weight: 4.0,
            opacity: 0.8,
            dash_array: None,
        }
    }

    pub fn fallback<S: Into<String>>(color: S) -> Self {
        Self {
            color: color.into(),
            weight: 3.0,
            opacity: 0.5,
            dash_array: Some("5, 10".to_owned()),
        }
    }

    pub fn is_dashed(&self) -> bool {
        self.dash_array.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Polyline {
    pub coordinates: Vec<Coordinate>,
    pub style: LineStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FitOptions {
    /// Space kept free on every side of the viewport, in pixels.
    pub padding: u32,
    pub max_zoom: u8,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding: 50,
            max_zoom: 15,
        }
    }
}

/// Something routes can be drawn on. The renderer owns exactly one surface
/// and is the only one mutating it.
pub trait MapSurface: Send {
    /// Removes every marker and line and forgets the fitted view.
    fn clear(&mut self);

    fn add_marker(&mut self, marker: Marker);

    fn add_line(&mut self, line: Polyline);

    /// Moves the view so that `bounds` is visible.
    fn fit_bounds(&mut self, bounds: Bounds, options: FitOptions);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_url_from_template() {
        let layer = TileLayer::default();
        assert_eq!(
            layer.tile_url(12, 2163, 1290),
            "https://tile.openstreetmap.org/12/2163/1290.png"
        );
    }

    #[test]
    fn fallback_lines_are_dashed() {
        assert!(LineStyle::fallback("#000").is_dashed());
        assert!(!LineStyle::solid("#000").is_dashed());
    }
}
