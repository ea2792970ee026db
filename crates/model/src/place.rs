use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo::Bounds;

use crate::{coordinate::Coordinate, ExampleData};

/// A geocoding candidate.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub display_name: String,
    pub coordinate: Coordinate,
    pub kind: Option<String>,
    pub importance: Option<f64>,
    pub bounding_box: Option<Bounds>,
}

impl ExampleData for Place {
    fn example_data() -> Self {
        Self {
            display_name: "Kiel Hauptbahnhof, Kiel, Schleswig-Holstein, Deutschland".to_owned(),
            coordinate: Coordinate::new(54.3149, 10.1318),
            kind: Some("station".to_owned()),
            importance: Some(0.42),
            bounding_box: None,
        }
    }
}
