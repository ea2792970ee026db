use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{coordinate::Coordinate, ExampleData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WaypointRole {
    Pickup,
    Dropoff,
    #[default]
    Intermediate,
}

impl WaypointRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Dropoff => "dropoff",
            Self::Intermediate => "intermediate",
        }
    }
}

impl fmt::Display for WaypointRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaypointRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pickup" | "pick-up" | "start" => Ok(Self::Pickup),
            "dropoff" | "drop-off" | "drop" | "end" => Ok(Self::Dropoff),
            "intermediate" | "stop" | "via" | "" => Ok(Self::Intermediate),
            other => Err(format!("unknown waypoint role '{other}'")),
        }
    }
}

/// A point a route has to pass through. The position of a waypoint within
/// its list defines the order of the route legs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub role: WaypointRole,
}

impl Waypoint {
    pub fn new<S: Into<String>>(
        latitude: f64,
        longitude: f64,
        label: S,
        role: WaypointRole,
    ) -> Self {
        Self {
            latitude,
            longitude,
            label: label.into(),
            role,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Parses `lat,lon[,label[,role]]`.
impl FromStr for Waypoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ',');
        let latitude = parts
            .next()
            .and_then(|part| part.trim().parse::<f64>().ok())
            .ok_or_else(|| format!("expected a latitude in '{s}'"))?;
        let longitude = parts
            .next()
            .and_then(|part| part.trim().parse::<f64>().ok())
            .ok_or_else(|| format!("expected a longitude in '{s}'"))?;
        let label = parts.next().unwrap_or("").trim().to_owned();
        let role = parts.next().unwrap_or("").parse()?;

        let waypoint = Self::new(latitude, longitude, label, role);
        if !waypoint.coordinate().is_valid() {
            return Err(format!("coordinate out of range in '{s}'"));
        }
        Ok(waypoint)
    }
}

impl ExampleData for Waypoint {
    fn example_data() -> Self {
        Self::new(54.3233, 10.1228, "Kiel Hbf", WaypointRole::Pickup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_waypoint() {
        let waypoint: Waypoint = "54.32, 10.12, Office, drop".parse().unwrap();
        assert_eq!(waypoint.label, "Office");
        assert_eq!(waypoint.role, WaypointRole::Dropoff);
        assert_eq!(waypoint.latitude, 54.32);
    }

    #[test]
    fn parse_minimal_waypoint() {
        let waypoint: Waypoint = "1.5,2.5".parse().unwrap();
        assert_eq!(waypoint.role, WaypointRole::Intermediate);
        assert!(waypoint.label.is_empty());
    }

    #[test]
    fn reject_bad_waypoints() {
        assert!("north,2.5".parse::<Waypoint>().is_err());
        assert!("95.0,2.5".parse::<Waypoint>().is_err());
        assert!("1.0,2.0,x,taxi".parse::<Waypoint>().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Waypoint::example_data()).unwrap();
        assert!(json.contains(r#""role":"pickup""#));
        let waypoint: Waypoint =
            serde_json::from_str(r#"{"latitude":1.0,"longitude":2.0}"#).unwrap();
        assert_eq!(waypoint.role, WaypointRole::Intermediate);
    }
}
