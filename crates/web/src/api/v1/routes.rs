use axum::{
    extract::{OriginalUri, State},
    http::{Method, StatusCode},
    routing::{get, on},
    Json, Router,
};
use model::{
    waypoint::{Waypoint, WaypointRole},
    ExampleData,
};
use routing::{RenderOutcome, RenderReport, RenderState};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    common::{route_not_found, schema, JsonResult, RouteErrorResponse, METHOD_FILTER_ALL},
    SharedRenderSession, WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<RouteRequest>))
        .route("/", get(get_scene).post(post_route).delete(reset_scene))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

/// Waypoints in visiting order and an optional line color.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub waypoints: Vec<Waypoint>,
    #[serde(default)]
    pub color: Option<String>,
}

impl ExampleData for RouteRequest {
    fn example_data() -> Self {
        Self {
            waypoints: vec![
                Waypoint::example_data(),
                Waypoint::new(54.3389, 10.1228, "Holstenbrücke", WaypointRole::Intermediate),
                Waypoint::new(54.3466, 10.1085, "Office", WaypointRole::Dropoff),
            ],
            color: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    #[serde(flatten)]
    pub report: RenderReport,
    /// Everything drawn, as a GeoJSON `FeatureCollection`.
    pub scene: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDto {
    #[serde(flatten)]
    pub state: RenderState,
    pub scene: Value,
}

fn superseded(sequence: u64, uri: &str) -> RouteErrorResponse {
    RouteErrorResponse::new(StatusCode::CONFLICT)
        .with_method(&Method::POST)
        .with_uri(uri)
        .with_message(format!("Render pass {sequence} was superseded."))
}

async fn post_route(
    OriginalUri(original_uri): OriginalUri,
    State(WebState {
        render_session,
        render_config,
        ..
    }): State<WebState>,
    Json(request): Json<RouteRequest>,
) -> JsonResult<RouteResponse> {
    if let Some(index) = request
        .waypoints
        .iter()
        .position(|waypoint| !waypoint.coordinate().is_valid())
    {
        return Err(
            RouteErrorResponse::bad_request(format!("Waypoint {index} is out of range."))
                .with_method(&Method::POST)
                .with_uri(original_uri.path()),
        );
    }

    let color = request
        .color
        .unwrap_or_else(|| render_config.color.clone());
    let report = match render_session
        .render_with_color(&request.waypoints, &color)
        .await
    {
        RenderOutcome::Rendered(report) => report,
        RenderOutcome::Stale { sequence } => {
            return Err(superseded(sequence, original_uri.path()))
        }
    };

    // a newer pass may already be drawing, its result replaces this one
    let scene = render_session
        .with_surface(|scene| {
            (render_session.latest_sequence() == report.sequence).then(|| scene.to_geojson())
        })
        .await
        .ok_or_else(|| superseded(report.sequence, original_uri.path()))?;

    Ok(Json(RouteResponse { report, scene }))
}

async fn get_scene(State(render_session): State<SharedRenderSession>) -> Json<SceneDto> {
    let dto = render_session
        .with_surface(|scene| SceneDto {
            state: render_session.state(),
            scene: scene.to_geojson(),
        })
        .await;
    Json(dto)
}

async fn reset_scene(State(render_session): State<SharedRenderSession>) -> Json<SceneDto> {
    render_session.reset().await;
    get_scene(State(render_session)).await
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use model::{
        coordinate::{Coordinate, Geometry},
        leg::FallbackReason,
    };
    use routing::{router::StraightLineRouter, LegError, LegRouter};
    use tokio::sync::Notify;

    use super::*;
    use crate::tests::test_state;

    struct NoRouteRouter;

    #[async_trait]
    impl LegRouter for NoRouteRouter {
        async fn route(&self, _: Coordinate, _: Coordinate) -> Result<Geometry, LegError> {
            Err(LegError::NoRoute("NoRoute".to_owned()))
        }
    }

    fn uri() -> OriginalUri {
        OriginalUri("/api/v1/routes".parse().unwrap())
    }

    #[tokio::test]
    async fn renders_all_legs() {
        let state = test_state(Arc::new(StraightLineRouter));
        let Json(response) = post_route(
            uri(),
            State(state),
            Json(RouteRequest::example_data()),
        )
        .await
        .unwrap();

        assert_eq!(response.report.legs.len(), 2);
        assert_eq!(response.report.summary.markers, 3);
        assert_eq!(response.report.summary.lines, 2);
        assert!(response.report.summary.notice.is_none());
        assert_eq!(response.scene["type"], "FeatureCollection");
        assert_eq!(response.scene["features"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn failed_legs_are_reported() {
        let state = test_state(Arc::new(NoRouteRouter));
        let Json(response) = post_route(
            uri(),
            State(state),
            Json(RouteRequest {
                color: Some("#ff00ff".to_owned()),
                ..RouteRequest::example_data()
            }),
        )
        .await
        .unwrap();

        let summary = &response.report.summary;
        assert_eq!(summary.failed_legs.len(), 2);
        assert_eq!(summary.failed_legs[0].reason, FallbackReason::NoRoute);
        assert_eq!(summary.notice.as_deref(), Some("Failed to load some routes"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sequence"], 1);
        assert!(json["legs"][0]["geometry"].is_null());
    }

    #[tokio::test]
    async fn single_waypoint_draws_marker_only() {
        let state = test_state(Arc::new(NoRouteRouter));
        let Json(response) = post_route(
            uri(),
            State(state),
            Json(RouteRequest {
                waypoints: vec![Waypoint::example_data()],
                color: None,
            }),
        )
        .await
        .unwrap();

        assert!(response.report.legs.is_empty());
        assert_eq!(response.report.summary.markers, 1);
        assert_eq!(response.report.summary.lines, 0);
    }

    #[tokio::test]
    async fn rejects_invalid_coordinates() {
        let state = test_state(Arc::new(StraightLineRouter));
        let error = post_route(
            uri(),
            State(state),
            Json(RouteRequest {
                waypoints: vec![
                    Waypoint::example_data(),
                    Waypoint::new(123.0, 10.0, "nowhere", WaypointRole::Dropoff),
                ],
                color: None,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(error.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(error.message.as_deref(), Some("Waypoint 1 is out of range."));
        assert_eq!(error.requested_uri.as_deref(), Some("/api/v1/routes"));
    }

    /// Holds the first request until the gate opens.
    #[derive(Default)]
    struct GatedRouter {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LegRouter for GatedRouter {
        async fn route(&self, from: Coordinate, to: Coordinate) -> Result<Geometry, LegError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.gate.notified().await;
            }
            Ok(Geometry::new(vec![from, to]))
        }
    }

    #[tokio::test]
    async fn superseded_request_is_a_conflict() {
        let router = Arc::new(GatedRouter::default());
        let state = test_state(router.clone());

        let first = tokio::spawn(post_route(
            uri(),
            State(state.clone()),
            Json(RouteRequest::example_data()),
        ));
        while router.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn(post_route(
            uri(),
            State(state.clone()),
            Json(RouteRequest::example_data()),
        ));
        while state.render_session.latest_sequence() < 2 {
            tokio::task::yield_now().await;
        }
        router.gate.notify_one();

        let error = first.await.unwrap().unwrap_err();
        assert_eq!(error.status_code, StatusCode::CONFLICT);
        assert_eq!(error.message.as_deref(), Some("Render pass 1 was superseded."));

        let Json(response) = second.await.unwrap().unwrap();
        assert_eq!(response.report.sequence, 2);
        assert!(response.report.summary.failed_legs.is_empty());
    }

    #[tokio::test]
    async fn scene_can_be_read_and_reset() {
        let state = test_state(Arc::new(StraightLineRouter));
        post_route(uri(), State(state.clone()), Json(RouteRequest::example_data()))
            .await
            .unwrap();

        let Json(dto) = get_scene(State(state.render_session.clone())).await;
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["state"], "rendered");
        assert_eq!(json["sequence"], 1);
        assert_eq!(dto.scene["features"].as_array().unwrap().len(), 5);

        let Json(dto) = reset_scene(State(state.render_session.clone())).await;
        assert_eq!(dto.state, RenderState::Idle);
        assert!(dto.scene["features"].as_array().unwrap().is_empty());
        assert!(dto.scene.get("bbox").is_none());
    }
}
