use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo::{self, Bounds};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a coordinate from a GeoJSON position, which is ordered `[lon, lat]`.
    pub fn from_lon_lat(position: [f64; 2]) -> Self {
        Self::new(position[1], position[0])
    }

    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }

    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        geo::haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Accumulates a bounding box over coordinates.
pub fn bounds_of<'a, I>(coordinates: I) -> Option<Bounds>
where
    I: IntoIterator<Item = &'a Coordinate>,
{
    Bounds::from_points(
        coordinates
            .into_iter()
            .map(|coordinate| (coordinate.latitude, coordinate.longitude)),
    )
}

/// An ordered path of coordinates, as returned by a routing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Geometry {
    pub coordinates: Vec<Coordinate>,
}

impl Geometry {
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self { coordinates }
    }

    pub fn from_lon_lat(positions: &[[f64; 2]]) -> Self {
        Self::new(positions.iter().copied().map(Coordinate::from_lon_lat).collect())
    }

    pub fn first(&self) -> Option<&Coordinate> {
        self.coordinates.first()
    }

    pub fn last(&self) -> Option<&Coordinate> {
        self.coordinates.last()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Length along the path in kilometers.
    pub fn length_km(&self) -> f64 {
        self.coordinates
            .windows(2)
            .map(|pair| pair[0].distance_km(&pair[1]))
            .sum()
    }
}
