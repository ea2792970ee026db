use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Web-Mercator cuts off at this latitude.
pub const MERCATOR_MAX_LATITUDE: f64 = 85.05112877980659;

/// Size of one raster tile in pixels, zoom level 0 shows the world on one tile.
pub const TILE_SIZE: f64 = 256.0;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

pub fn calculate_bounding_box(
    lat: f64,
    lon: f64,
    radius_km: f64,
) -> ((f64, f64), (f64, f64)) {
    // Convert latitude and longitude from degrees to radians
    let lat_rad = to_radians(lat);
    let lon_rad = to_radians(lon);

    // Latitude bounds
    let min_lat = lat_rad - radius_km / EARTH_RADIUS_KM;
    let max_lat = lat_rad + radius_km / EARTH_RADIUS_KM;

    // Longitude bounds (adjusted by latitude)
    let min_lon = lon_rad - radius_km / (EARTH_RADIUS_KM * lat_rad.cos());
    let max_lon = lon_rad + radius_km / (EARTH_RADIUS_KM * lat_rad.cos());

    ((to_degrees(min_lat), to_degrees(min_lon)), (to_degrees(max_lat), to_degrees(max_lon)))
}

pub fn haversine_distance(
    latitude_1: f64,
    longitude_1: f64,
    latitude_2: f64,
    longitude_2: f64,
) -> f64 {
    let lat1_rad = to_radians(latitude_1);
    let lon1_rad = to_radians(longitude_1);
    let lat2_rad = to_radians(latitude_2);
    let lon2_rad = to_radians(longitude_2);

    let dlat = lat2_rad - lat1_rad;
    let dlon = lon2_rad - lon1_rad;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// An axis aligned latitude/longitude box that grows with every point added.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl Bounds {
    pub fn from_point(latitude: f64, longitude: f64) -> Self {
        Self {
            min_latitude: latitude,
            min_longitude: longitude,
            max_latitude: latitude,
            max_longitude: longitude,
        }
    }

    /// Accumulates a box over an iterator of `(latitude, longitude)` pairs.
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut bounds: Option<Self> = None;
        for (latitude, longitude) in points {
            match bounds.as_mut() {
                Some(bounds) => bounds.extend(latitude, longitude),
                None => bounds = Some(Self::from_point(latitude, longitude)),
            }
        }
        bounds
    }

    pub fn extend(&mut self, latitude: f64, longitude: f64) {
        self.min_latitude = self.min_latitude.min(latitude);
        self.min_longitude = self.min_longitude.min(longitude);
        self.max_latitude = self.max_latitude.max(latitude);
        self.max_longitude = self.max_longitude.max(longitude);
    }

    pub fn union(mut self, other: &Bounds) -> Self {
        self.extend(other.min_latitude, other.min_longitude);
        self.extend(other.max_latitude, other.max_longitude);
        self
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }
}

/// Normalized Web-Mercator y in `[0, 1]`, 0 being the northern edge.
fn mercator_y(latitude: f64) -> f64 {
    let latitude = latitude.clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE);
    let sin = to_radians(latitude).sin();
    0.5 - ((1.0 + sin) / (1.0 - sin)).ln() / (4.0 * std::f64::consts::PI)
}

fn mercator_latitude(y: f64) -> f64 {
    let n = std::f64::consts::PI * (1.0 - 2.0 * y);
    to_degrees(n.sinh().atan())
}

/// Center and integer zoom level of a fitted viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FittedView {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub zoom: u8,
}

/// Finds the largest zoom level at which `bounds` fits into a viewport of
/// `width` x `height` pixels minus `padding` on every side, capped at
/// `max_zoom`.
pub fn fit_bounds(
    bounds: &Bounds,
    width: u32,
    height: u32,
    padding: u32,
    max_zoom: u8,
) -> FittedView {
    let north = mercator_y(bounds.max_latitude);
    let south = mercator_y(bounds.min_latitude);
    let center_latitude = mercator_latitude((north + south) / 2.0);
    let center_longitude = (bounds.min_longitude + bounds.max_longitude) / 2.0;

    let available_width = (width as f64 - 2.0 * padding as f64).max(1.0);
    let available_height = (height as f64 - 2.0 * padding as f64).max(1.0);

    // spans in pixels at zoom 0
    let span_x = (bounds.max_longitude - bounds.min_longitude) / 360.0 * TILE_SIZE;
    let span_y = (south - north) * TILE_SIZE;

    let scale_x = if span_x > 0.0 { available_width / span_x } else { f64::INFINITY };
    let scale_y = if span_y > 0.0 { available_height / span_y } else { f64::INFINITY };
    let scale = scale_x.min(scale_y);

    let zoom = if scale.is_finite() {
        scale.log2().floor().clamp(0.0, max_zoom as f64) as u8
    } else {
        max_zoom
    };

    FittedView {
        center_latitude,
        center_longitude,
        zoom,
    }
}
