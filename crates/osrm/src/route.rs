use async_trait::async_trait;
use model::coordinate::{Coordinate, Geometry};
use routing::{LegError, LegRouter};

use crate::{client::OsrmClient, model::RouteResponse, ApiError};

const CODE_OK: &str = "Ok";

/// Codes meaning the request was fine but the network has no connection.
fn is_no_route_code(code: &str) -> bool {
    matches!(code, "NoRoute" | "NoSegment" | "NoMatch" | "NoTrips")
}

pub fn route_endpoint(profile: &str, from: Coordinate, to: Coordinate) -> String {
    format!(
        "route/v1/{profile}/{},{};{},{}?overview=full&geometries=geojson",
        from.longitude, from.latitude, to.longitude, to.latitude
    )
}

/// Takes the geometry of the first route of a response.
pub fn first_geometry(response: RouteResponse) -> Result<Geometry, ApiError> {
    if response.code != CODE_OK {
        return if is_no_route_code(&response.code) {
            Err(ApiError::NoRoute {
                code: response.code,
                message: response.message,
            })
        } else {
            Err(ApiError::Other(format!(
                "OSRM answered '{}': {}",
                response.code,
                response.message.unwrap_or_default()
            )))
        };
    }

    let route = response.routes.into_iter().next().ok_or_else(|| ApiError::NoRoute {
        code: "NoRoute".to_owned(),
        message: Some("empty route list".to_owned()),
    })?;
    if route.geometry.coordinates.is_empty() {
        return Err(ApiError::NoRoute {
            code: "NoRoute".to_owned(),
            message: Some("empty geometry".to_owned()),
        });
    }
    Ok(Geometry::from_lon_lat(&route.geometry.coordinates))
}

pub async fn get_route(
    client: &OsrmClient,
    from: Coordinate,
    to: Coordinate,
) -> Result<Geometry, ApiError> {
    let endpoint = route_endpoint(&client.settings.profile, from, to);
    let response: RouteResponse = client.get(&endpoint).await?;
    first_geometry(response)
}

#[async_trait]
impl LegRouter for OsrmClient {
    async fn route(&self, from: Coordinate, to: Coordinate) -> Result<Geometry, LegError> {
        get_route(self, from, to).await.map_err(LegError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIEL_RESPONSE: &str = r#"{
        "code": "Ok",
        "routes": [{
            "geometry": {
                "type": "LineString",
                "coordinates": [[10.1318, 54.3149], [10.1302, 54.3188], [10.1228, 54.3233]]
            },
            "legs": [],
            "weight_name": "routability",
            "weight": 210.4,
            "distance": 1351.2,
            "duration": 198.7
        }],
        "waypoints": [
            {"hint": "x", "distance": 4.2, "name": "Kaistraße", "location": [10.1318, 54.3149]},
            {"hint": "y", "distance": 1.1, "name": "", "location": [10.1228, 54.3233]}
        ]
    }"#;

    #[test]
    fn endpoint_uses_lon_lat_order() {
        let endpoint = route_endpoint(
            "driving",
            Coordinate::new(54.3149, 10.1318),
            Coordinate::new(54.3233, 10.1228),
        );
        assert_eq!(
            endpoint,
            "route/v1/driving/10.1318,54.3149;10.1228,54.3233?overview=full&geometries=geojson"
        );
    }

    #[test]
    fn parses_first_route() {
        let response: RouteResponse = serde_json::from_str(KIEL_RESPONSE).unwrap();
        let geometry = first_geometry(response).unwrap();

        assert_eq!(geometry.coordinates.len(), 3);
        let from = Coordinate::new(54.3149, 10.1318);
        let to = Coordinate::new(54.3233, 10.1228);
        assert!(geometry.first().unwrap().distance_km(&from) < 0.05);
        assert!(geometry.last().unwrap().distance_km(&to) < 0.05);
    }

    #[test]
    fn no_route_code() {
        let response: RouteResponse = serde_json::from_str(
            r#"{"code": "NoRoute", "message": "Impossible route between points"}"#,
        )
        .unwrap();
        assert!(matches!(
            first_geometry(response),
            Err(ApiError::NoRoute { code, .. }) if code == "NoRoute"
        ));
    }

    #[test]
    fn empty_route_list() {
        let response: RouteResponse =
            serde_json::from_str(r#"{"code": "Ok", "routes": [], "waypoints": []}"#).unwrap();
        let error = LegError::from(first_geometry(response).unwrap_err());
        assert_eq!(error.fallback_reason(), model::leg::FallbackReason::NoRoute);
    }

    #[test]
    fn invalid_query_is_not_a_missing_route() {
        let response: RouteResponse =
            serde_json::from_str(r#"{"code": "InvalidQuery", "message": "Query string malformed"}"#)
                .unwrap();
        let error = LegError::from(first_geometry(response).unwrap_err());
        assert!(matches!(error, LegError::InvalidResponse(_)));
    }
}
