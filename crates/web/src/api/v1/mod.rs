use axum::{
    routing::{get, on},
    Router,
};

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

mod geocode;
mod preferences;
mod routes;
mod tiles;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/geocode", get(geocode::geocode))
        .nest_service("/routes", routes::routes(state.clone()))
        .nest_service("/tiles", tiles::routes(state.clone()))
        .nest_service("/preferences", preferences::routes(state.clone()))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}
