use axum::{
    extract::{OriginalUri, Query, State},
    http::Method,
};
use model::{coordinate::Coordinate, place::Place};
use nominatim::client::SearchQuery;
use serde::Deserialize;

use crate::{
    common::{JsonResult, RouteErrorResponse, VecResponse},
    WebState,
};

const DEFAULT_RADIUS_KM: f64 = 25.0;

#[derive(Deserialize)]
pub(crate) struct GeocodeQuery {
    q: String,

    limit: Option<usize>,

    latitude: Option<f64>,

    longitude: Option<f64>,

    radius: Option<f64>,
}

pub(crate) async fn geocode(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { geocoder, .. }): State<WebState>,
    Query(params): Query<GeocodeQuery>,
) -> JsonResult<VecResponse<Place>> {
    let bad_request = |message: &str| {
        RouteErrorResponse::bad_request(message)
            .with_method(&Method::GET)
            .with_uri(original_uri.path())
    };

    let mut query = SearchQuery::new(params.q);
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    match (params.latitude, params.longitude) {
        (Some(latitude), Some(longitude)) => {
            if !Coordinate::new(latitude, longitude).is_valid() {
                return Err(bad_request("The coordinate is out of range."));
            }
            let radius = params.radius.unwrap_or(DEFAULT_RADIUS_KM);
            if !(radius.is_finite() && radius > 0.0) {
                return Err(bad_request("The radius has to be a positive number."));
            }
            query = query.near(latitude, longitude, radius);
        }
        (None, None) => {}
        _ => return Err(bad_request("Latitude and longitude go together.")),
    }

    geocoder
        .search(&query)
        .await
        .map(|places| VecResponse::new(places).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{http::StatusCode, Json};
    use routing::router::StraightLineRouter;

    use super::*;
    use crate::tests::test_state;

    fn request(q: &str) -> (OriginalUri, State<WebState>, Query<GeocodeQuery>) {
        near(q, None, None, None)
    }

    fn near(
        q: &str,
        latitude: Option<f64>,
        longitude: Option<f64>,
        radius: Option<f64>,
    ) -> (OriginalUri, State<WebState>, Query<GeocodeQuery>) {
        (
            OriginalUri("/api/v1/geocode".parse().unwrap()),
            State(test_state(Arc::new(StraightLineRouter))),
            Query(GeocodeQuery {
                q: q.to_owned(),
                limit: Some(3),
                latitude,
                longitude,
                radius,
            }),
        )
    }

    #[tokio::test]
    async fn blank_query_finds_nothing() {
        let (uri, state, query) = request("   ");
        let Json(response) = geocode(uri, state, query).await.unwrap();
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn unreachable_geocoder_is_a_bad_gateway() {
        let (uri, state, query) = request("Kiel Hauptbahnhof");
        let error = geocode(uri, state, query).await.unwrap_err();
        assert_eq!(error.status_code, StatusCode::BAD_GATEWAY);
        assert_eq!(error.http_method.as_deref(), Some("GET"));
        assert!(error.detailed_information.is_some());
    }

    #[tokio::test]
    async fn rejects_bad_search_areas() {
        let cases = [
            (Some(91.0), Some(10.0), None, "The coordinate is out of range."),
            (Some(54.3), Some(190.0), None, "The coordinate is out of range."),
            (Some(54.3), Some(10.1), Some(-5.0), "The radius has to be a positive number."),
            (Some(54.3), Some(10.1), Some(0.0), "The radius has to be a positive number."),
            (Some(54.3), None, None, "Latitude and longitude go together."),
        ];
        for (latitude, longitude, radius, message) in cases {
            let (uri, state, query) = near("Kiel", latitude, longitude, radius);
            let error = geocode(uri, state, query).await.unwrap_err();
            assert_eq!(error.status_code, StatusCode::BAD_REQUEST);
            assert_eq!(error.message.as_deref(), Some(message));
        }
    }
}
