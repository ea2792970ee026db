use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::serde::{duration_millis, env_or};

use crate::{
    backoff::BackoffKind,
    clock::Clock,
    queue::{LegQueue, DEFAULT_REQUEST_INTERVAL},
    renderer::{MapRenderer, DEFAULT_ROUTE_COLOR},
    router::LegRouter,
    scene::SceneSurface,
    surface::{FitOptions, TileLayer},
};

/// Everything that shapes a render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Pause between two consecutive routing requests.
    #[serde(with = "duration_millis")]
    #[schemars(schema_with = "duration_millis::schema")]
    pub request_interval: Duration,
    pub backoff: BackoffKind,
    #[serde(with = "duration_millis")]
    #[schemars(schema_with = "duration_millis::schema")]
    pub backoff_step: Duration,
    pub max_retries: u32,
    pub fit: FitOptions,
    pub tile_layer: TileLayer,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            request_interval: DEFAULT_REQUEST_INTERVAL,
            backoff: BackoffKind::None,
            backoff_step: Duration::from_secs(1),
            max_retries: 0,
            fit: FitOptions::default(),
            tile_layer: TileLayer::default(),
            viewport_width: 800,
            viewport_height: 600,
            color: DEFAULT_ROUTE_COLOR.to_owned(),
        }
    }
}

impl RenderConfig {
    /// Defaults overridden by `FLEETIX_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            request_interval: Duration::from_millis(env_or(
                "FLEETIX_REQUEST_INTERVAL_MS",
                defaults.request_interval.as_millis() as u64,
            )),
            backoff: env_or("FLEETIX_BACKOFF", defaults.backoff),
            backoff_step: Duration::from_millis(env_or(
                "FLEETIX_BACKOFF_STEP_MS",
                defaults.backoff_step.as_millis() as u64,
            )),
            max_retries: env_or("FLEETIX_MAX_RETRIES", defaults.max_retries),
            fit: FitOptions {
                padding: env_or("FLEETIX_FIT_PADDING", defaults.fit.padding),
                max_zoom: env_or("FLEETIX_MAX_ZOOM", defaults.fit.max_zoom),
            },
            tile_layer: TileLayer {
                url_template: env_or("FLEETIX_TILE_URL", defaults.tile_layer.url_template),
                attribution: env_or(
                    "FLEETIX_TILE_ATTRIBUTION",
                    defaults.tile_layer.attribution,
                ),
                max_zoom: defaults.tile_layer.max_zoom,
            },
            viewport_width: env_or("FLEETIX_VIEWPORT_WIDTH", defaults.viewport_width),
            viewport_height: env_or("FLEETIX_VIEWPORT_HEIGHT", defaults.viewport_height),
            color: env_or("FLEETIX_ROUTE_COLOR", defaults.color),
        }
    }

    pub fn leg_queue<R: LegRouter, C: Clock>(&self, router: R, clock: C) -> LegQueue<R, C> {
        LegQueue::new(router, clock)
            .with_interval(self.request_interval)
            .with_backoff(self.backoff.build(self.backoff_step, self.max_retries))
    }

    pub fn scene_renderer(&self) -> MapRenderer<SceneSurface> {
        MapRenderer::new(
            SceneSurface::new(
                self.tile_layer.clone(),
                self.viewport_width,
                self.viewport_height,
            ),
            self.fit,
        )
    }
}
