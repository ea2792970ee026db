use model::{coordinate::Coordinate, place::Place};
use serde::{Deserialize, Serialize};
use utility::geo::Bounds;

use crate::ApiError;

/// One entry of a `format=jsonv2` search answer. Nominatim sends numbers as
/// strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub place_id: Option<u64>,
    pub lat: String,
    pub lon: String,
    pub display_name: String,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub importance: Option<f64>,
    /// `[min_lat, max_lat, min_lon, max_lon]`
    #[serde(rename = "boundingbox")]
    pub bounding_box: Option<Vec<String>>,
}

fn parse_number(value: &str, field: &str) -> Result<f64, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidPlace(format!("{field} '{value}' is not a number")))
}

impl TryFrom<SearchResult> for Place {
    type Error = ApiError;

    fn try_from(result: SearchResult) -> Result<Self, Self::Error> {
        let coordinate = Coordinate::new(
            parse_number(&result.lat, "lat")?,
            parse_number(&result.lon, "lon")?,
        );
        if !coordinate.is_valid() {
            return Err(ApiError::InvalidPlace(format!(
                "coordinate {coordinate} out of range"
            )));
        }

        let bounding_box = match result.bounding_box.as_deref() {
            Some([min_lat, max_lat, min_lon, max_lon]) => {
                let mut bounds = Bounds::from_point(
                    parse_number(min_lat, "boundingbox")?,
                    parse_number(min_lon, "boundingbox")?,
                );
                bounds.extend(
                    parse_number(max_lat, "boundingbox")?,
                    parse_number(max_lon, "boundingbox")?,
                );
                Some(bounds)
            }
            _ => None,
        };

        Ok(Place {
            display_name: result.display_name,
            coordinate,
            kind: result.kind,
            importance: result.importance,
            bounding_box,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_RESPONSE: &str = r#"[{
        "place_id": 123456,
        "licence": "Data © OpenStreetMap contributors, ODbL 1.0.",
        "osm_type": "node",
        "osm_id": 2371950101,
        "lat": "54.3149",
        "lon": "10.1318",
        "category": "railway",
        "type": "station",
        "place_rank": 30,
        "importance": 0.42,
        "addresstype": "railway",
        "name": "Kiel Hauptbahnhof",
        "display_name": "Kiel Hauptbahnhof, Kiel, Schleswig-Holstein, Deutschland",
        "boundingbox": ["54.3099", "54.3199", "10.1268", "10.1368"]
    }]"#;

    #[test]
    fn converts_search_result() {
        let results: Vec<SearchResult> = serde_json::from_str(SEARCH_RESPONSE).unwrap();
        let place = Place::try_from(results[0].clone()).unwrap();

        assert_eq!(place.coordinate, Coordinate::new(54.3149, 10.1318));
        assert_eq!(place.kind.as_deref(), Some("station"));
        let bounds = place.bounding_box.unwrap();
        assert!(bounds.contains(54.3149, 10.1318));
        assert_eq!(bounds.min_latitude, 54.3099);
    }

    #[test]
    fn rejects_garbage_coordinates() {
        let result = SearchResult {
            place_id: None,
            lat: "north".to_owned(),
            lon: "10.0".to_owned(),
            display_name: "Nowhere".to_owned(),
            category: None,
            kind: None,
            importance: None,
            bounding_box: None,
        };
        assert!(matches!(Place::try_from(result), Err(ApiError::InvalidPlace(_))));
    }
}
