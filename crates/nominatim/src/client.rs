use std::time::Duration;

use model::place::Place;
use serde::{Deserialize, Serialize};
use utility::{
    geo::{calculate_bounding_box, MERCATOR_MAX_LATITUDE},
    serde::env_or,
};

use crate::{model::SearchResult, ApiError};

pub const NOMINATIM_API_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_USER_AGENT: &str = concat!("fleetix/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_LIMIT: usize = 5;
/// The public instance refuses larger result sets.
pub const MAX_LIMIT: usize = 40;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NominatimSettings {
    pub base_url: String,
    /// The usage policy of the public instance requires an identifying agent.
    pub user_agent: String,
    pub timeout_ms: u64,
    pub language: Option<String>,
    /// Comma separated ISO 3166-1 alpha-2 codes.
    pub country_codes: Option<String>,
}

impl Default for NominatimSettings {
    fn default() -> Self {
        Self {
            base_url: NOMINATIM_API_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_ms: 10_000,
            language: None,
            country_codes: None,
        }
    }
}

impl NominatimSettings {
    pub fn env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_or("FLEETIX_NOMINATIM_URL", defaults.base_url),
            user_agent: env_or("FLEETIX_USER_AGENT", defaults.user_agent),
            timeout_ms: env_or("FLEETIX_HTTP_TIMEOUT_MS", defaults.timeout_ms),
            language: std::env::var("FLEETIX_GEOCODER_LANGUAGE").ok(),
            country_codes: std::env::var("FLEETIX_GEOCODER_COUNTRIES").ok(),
        }
    }
}

/// Where to look for a place.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    pub limit: usize,
    /// `(min_lon, max_lat, max_lon, min_lat)`, results inside are preferred.
    pub viewbox: Option<(f64, f64, f64, f64)>,
}

impl SearchQuery {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            limit: DEFAULT_LIMIT,
            viewbox: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Prefers results within `radius_km` around the given point. The box is
    /// clamped to valid coordinates, near the poles it spans all longitudes.
    pub fn near(mut self, latitude: f64, longitude: f64, radius_km: f64) -> Self {
        let latitude = latitude.clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE);
        let ((min_lat, min_lon), (max_lat, max_lon)) =
            calculate_bounding_box(latitude, longitude, radius_km.abs());
        self.viewbox = Some((
            min_lon.max(-180.0),
            max_lat.min(90.0),
            max_lon.min(180.0),
            min_lat.max(-90.0),
        ));
        self
    }
}

pub struct NominatimClient {
    pub settings: NominatimSettings,
    http: reqwest::Client,
}

impl NominatimClient {
    pub fn new(settings: &NominatimSettings) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self {
            settings: settings.clone(),
            http,
        })
    }

    pub fn search_url(&self) -> String {
        format!("{}/search", self.settings.base_url.trim_end_matches('/'))
    }

    pub fn query_parameters(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut parameters = vec![
            ("format", "jsonv2".to_owned()),
            ("q", query.text.trim().to_owned()),
            ("limit", query.limit.to_string()),
        ];
        if let Some((x1, y1, x2, y2)) = query.viewbox {
            parameters.push(("viewbox", format!("{x1},{y1},{x2},{y2}")));
        }
        if let Some(language) = &self.settings.language {
            parameters.push(("accept-language", language.clone()));
        }
        if let Some(country_codes) = &self.settings.country_codes {
            parameters.push(("countrycodes", country_codes.clone()));
        }
        parameters
    }

    /// Ranked candidates for a free text query. Candidates that can not be
    /// understood are skipped.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Place>, ApiError> {
        if query.text.trim().is_empty() {
            return Ok(vec![]);
        }

        let url = self.search_url();
        log::debug!("Searching '{}' at '{url}'.", query.text);
        let response = self
            .http
            .get(&url)
            .query(&self.query_parameters(query))
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let results: Vec<SearchResult> = serde_json::from_str(&response.text().await?)?;
                Ok(results
                    .into_iter()
                    .filter_map(|result| match Place::try_from(result) {
                        Ok(place) => Some(place),
                        Err(why) => {
                            log::warn!("skipping geocoding result: {why}");
                            None
                        }
                    })
                    .collect())
            }
            other => Err(ApiError::InvalidResponse {
                status_code: other,
                url,
                response: response.text().await.ok(),
            }),
        }
    }
}
