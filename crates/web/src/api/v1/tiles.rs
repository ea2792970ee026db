use axum::{
    extract::State,
    routing::{get, on},
    Json, Router,
};
use routing::surface::TileLayer;
use schemars::{schema_for, JsonSchema};
use serde::Serialize;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(|| async { Json(schema_for!(TileLayerDto)) }))
        .route("/", get(get_tile_layer))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TileLayerDto {
    #[serde(flatten)]
    pub layer: TileLayer,
    /// The tile covering the whole world, handy to check the template.
    pub example_tile: String,
}

async fn get_tile_layer(
    State(WebState { render_config, .. }): State<WebState>,
) -> Json<TileLayerDto> {
    let layer = render_config.tile_layer.clone();
    Json(TileLayerDto {
        example_tile: layer.tile_url(0, 0, 0),
        layer,
    })
}
