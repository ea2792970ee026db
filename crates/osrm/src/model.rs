use serde::{Deserialize, Serialize};

/// Answer of the OSRM `route` service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    pub code: String,
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub geometry: LineString,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<[f64; 2]>,
}

/// A requested coordinate snapped to the road network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(default)]
    pub name: String,
    pub location: [f64; 2],
    pub distance: Option<f64>,
}
