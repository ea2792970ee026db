use axum::{
    extract::{OriginalUri, State},
    http::Method,
    routing::{get, on, post},
    Json, Router,
};
use model::preferences::{Preferences, Theme};
use routing::preferences::PreferenceStore;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    common::{route_not_found, JsonResult, RouteErrorResponse, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/", get(get_preferences).put(put_preferences))
        .route("/toggle", post(toggle_theme))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub theme: Theme,
}

async fn get_preferences(State(preferences): State<PreferenceStore>) -> Json<Preferences> {
    Json(preferences.get())
}

async fn put_preferences(
    OriginalUri(original_uri): OriginalUri,
    State(preferences): State<PreferenceStore>,
    Json(update): Json<PreferencesUpdate>,
) -> JsonResult<Preferences> {
    preferences
        .set_theme(update.theme)
        .await
        .map(Json)
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::PUT)
                .with_uri(original_uri.path())
        })
}

async fn toggle_theme(
    OriginalUri(original_uri): OriginalUri,
    State(preferences): State<PreferenceStore>,
) -> JsonResult<Preferences> {
    preferences.toggle_theme().await.map(Json).map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri() -> OriginalUri {
        OriginalUri("/api/v1/preferences".parse().unwrap())
    }

    #[tokio::test]
    async fn toggle_and_set_theme() {
        let store = PreferenceStore::in_memory();
        let mut changes = store.subscribe();

        let Json(initial) = get_preferences(State(store.clone())).await;
        assert_eq!(initial.theme, Theme::Light);

        let Json(toggled) = toggle_theme(uri(), State(store.clone())).await.unwrap();
        assert_eq!(toggled.theme, Theme::Dark);
        assert!(toggled.updated_at.is_some());
        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().theme, Theme::Dark);

        let Json(updated) = put_preferences(
            uri(),
            State(store.clone()),
            Json(PreferencesUpdate { theme: Theme::Light }),
        )
        .await
        .unwrap();
        assert_eq!(updated.theme, Theme::Light);
        assert_eq!(store.theme(), Theme::Light);
    }
}
