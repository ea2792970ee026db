pub use crate::common::RouteResult;

use std::{net::SocketAddr, sync::Arc};

use axum::{extract::FromRef, Router};
use nominatim::client::{NominatimClient, NominatimSettings};
use osrm::client::{OsrmClient, OsrmSettings};
use routing::{
    clock::TokioClock, preferences::PreferenceStore, scene::SceneSurface, LegRouter,
    RenderConfig, RenderSession,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod common;

/// The map served by this instance. Every route request draws on it, so only
/// the most recent request gets its result.
pub type SharedRenderSession = Arc<RenderSession<Arc<dyn LegRouter>, TokioClock, SceneSurface>>;

#[derive(Clone, FromRef)]
pub struct WebState {
    pub render_session: SharedRenderSession,
    pub geocoder: Arc<NominatimClient>,
    pub preferences: PreferenceStore,
    pub render_config: Arc<RenderConfig>,
}

impl WebState {
    pub fn new(
        router: Arc<dyn LegRouter>,
        geocoder: NominatimClient,
        preferences: PreferenceStore,
        render_config: RenderConfig,
    ) -> Self {
        Self {
            render_session: Arc::new(
                RenderSession::new(
                    Arc::new(render_config.leg_queue(router, TokioClock::new())),
                    render_config.scene_renderer(),
                )
                .with_color(render_config.color.clone()),
            ),
            geocoder: Arc::new(geocoder),
            preferences,
            render_config: Arc::new(render_config),
        }
    }

    /// Builds the state from `FLEETIX_*` environment variables.
    pub async fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let router: Arc<dyn LegRouter> = Arc::new(OsrmClient::new(&OsrmSettings::env())?);
        let geocoder = NominatimClient::new(&NominatimSettings::env())?;
        let preferences = match std::env::var("FLEETIX_PREFERENCES") {
            Ok(path) => PreferenceStore::open(path).await?,
            Err(_) => PreferenceStore::in_memory(),
        };
        Ok(Self::new(router, geocoder, preferences, RenderConfig::from_env()))
    }
}

pub fn app(state: WebState) -> Router {
    Router::new()
        .nest_service("/api", api::routes(state))
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server(state: WebState, address: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state).into_make_service()).await?;

    Ok(())
}
