use serde::Serialize;
use serde_json::{json, Value};
use utility::geo::{self, Bounds, FittedView};

use crate::surface::{FitOptions, MapSurface, Marker, Polyline, TileLayer};

/// The view after the last `fit_bounds`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneView {
    pub bounds: Bounds,
    pub fitted: FittedView,
}

/// In-memory map surface. Keeps everything drawn on it and exports it as a
/// GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSurface {
    pub tile_layer: TileLayer,
    pub width: u32,
    pub height: u32,
    pub markers: Vec<Marker>,
    pub lines: Vec<Polyline>,
    pub view: Option<SceneView>,
}

impl SceneSurface {
    pub fn new(tile_layer: TileLayer, width: u32, height: u32) -> Self {
        Self {
            tile_layer,
            width,
            height,
            markers: vec![],
            lines: vec![],
            view: None,
        }
    }

    pub fn to_geojson(&self) -> Value {
        let markers = self.markers.iter().map(|marker| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": marker.coordinate.to_lon_lat(),
                },
                "properties": {
                    "label": marker.label,
                    "role": marker.role,
                    "marker-color": marker.color,
                },
            })
        });
        let lines = self.lines.iter().map(|line| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": line
                        .coordinates
                        .iter()
                        .map(|coordinate| coordinate.to_lon_lat())
                        .collect::<Vec<_>>(),
                },
                "properties": {
                    "stroke": line.style.color,
                    "stroke-width": line.style.weight,
                    "stroke-opacity": line.style.opacity,
                    "dashArray": line.style.dash_array,
                    "fallback": line.style.is_dashed(),
                },
            })
        });

        let mut collection = json!({
            "type": "FeatureCollection",
            "features": markers.chain(lines).collect::<Vec<_>>(),
        });
        if let Some(view) = &self.view {
            collection["bbox"] = json!([
                view.bounds.min_longitude,
                view.bounds.min_latitude,
                view.bounds.max_longitude,
                view.bounds.max_latitude,
            ]);
            collection["view"] = json!(view.fitted);
        }
        collection["attribution"] = json!(self.tile_layer.attribution);
        collection
    }
}

impl Default for SceneSurface {
    fn default() -> Self {
        Self::new(TileLayer::default(), 800, 600)
    }
}

impl MapSurface for SceneSurface {
    fn clear(&mut self) {
        self.markers.clear();
        self.lines.clear();
        self.view = None;
    }

    fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    fn add_line(&mut self, line: Polyline) {
        self.lines.push(line);
    }

    fn fit_bounds(&mut self, bounds: Bounds, options: FitOptions) {
        let max_zoom = options.max_zoom.min(self.tile_layer.max_zoom);
        let fitted = geo::fit_bounds(&bounds, self.width, self.height, options.padding, max_zoom);
        self.view = Some(SceneView { bounds, fitted });
    }
}
