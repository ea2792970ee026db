use std::time::Duration;

use chrono::Local;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use utility::serde::env_or;

use crate::ApiError;

pub const OSRM_API_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_PROFILE: &str = "driving";
pub const DEFAULT_USER_AGENT: &str = concat!("fleetix/", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OsrmSettings {
    pub base_url: String,
    pub profile: String,
    pub user_agent: String,
    pub timeout_ms: u64,
    /// Client side limit, `None` leaves throttling to the leg queue.
    pub rate_limit_per_minute: Option<u64>,
    pub proxy: Option<String>,
}

impl Default for OsrmSettings {
    fn default() -> Self {
        Self {
            base_url: OSRM_API_URL.to_owned(),
            profile: DEFAULT_PROFILE.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_ms: 10_000,
            rate_limit_per_minute: None,
            proxy: None,
        }
    }
}

impl OsrmSettings {
    pub fn env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_or("FLEETIX_OSRM_URL", defaults.base_url),
            profile: env_or("FLEETIX_OSRM_PROFILE", defaults.profile),
            user_agent: env_or("FLEETIX_USER_AGENT", defaults.user_agent),
            timeout_ms: env_or("FLEETIX_HTTP_TIMEOUT_MS", defaults.timeout_ms),
            rate_limit_per_minute: std::env::var("FLEETIX_OSRM_RATE_LIMIT")
                .ok()
                .and_then(|value| value.parse().ok()),
            proxy: std::env::var("FLEETIX_PROXY").ok(),
        }
    }
}

struct OsrmClientState {
    pub available_requests: u64,
    pub last_refill: chrono::DateTime<Local>,
}

pub struct OsrmClient {
    pub settings: OsrmSettings,
    http: reqwest::Client,
    state: RwLock<OsrmClientState>,
}

impl OsrmClient {
    pub fn new(settings: &OsrmSettings) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_millis(settings.timeout_ms));
        if let Some(proxy_url) = &settings.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            settings: settings.clone(),
            http: builder.build()?,
            state: RwLock::new(OsrmClientState {
                available_requests: settings.rate_limit_per_minute.unwrap_or(0),
                last_refill: Local::now(),
            }),
        })
    }

    pub async fn available_requests(&self) -> Option<u64> {
        match self.settings.rate_limit_per_minute {
            Some(_) => Some(self.state.read().await.available_requests),
            None => None,
        }
    }

    async fn try_decrement_available_requests(&self) -> Result<(), ApiError> {
        if let Some(rate_limit_minutes) = self.settings.rate_limit_per_minute {
            let mut state = self.state.write().await;

            let minutes_since_last_refill = (Local::now() - state.last_refill).num_minutes();
            if minutes_since_last_refill >= 1 {
                state.available_requests = rate_limit_minutes;
                state.last_refill = Local::now();
            }

            if state.available_requests != 0 {
                state.available_requests -= 1;
            } else {
                return Err(ApiError::RateLimitReached);
            }
        }
        Ok(())
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), endpoint)
    }

    /// Fetches an endpoint and parses the JSON body. OSRM answers client
    /// errors such as `NoRoute` with a regular body carrying an error code,
    /// those bodies are returned as well.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.try_decrement_available_requests().await?;

        let url = self.url(endpoint);
        log::debug!("Requesting Endpoint '{url}'.");
        let response = self.http.get(&url).send().await?;

        /* parse response */
        let status_code = response.status();
        let text = response.text().await?;
        let parsed = serde_json::from_str::<T>(&text);
        match parsed {
            Ok(value) if status_code.is_success() => Ok(value),
            Err(why) if status_code.is_success() => Err(why.into()),
            Ok(value)
                if status_code.is_client_error()
                    && status_code != reqwest::StatusCode::TOO_MANY_REQUESTS =>
            {
                Ok(value)
            }
            _ => Err(ApiError::InvalidResponse {
                status_code,
                url,
                response: (!text.is_empty()).then_some(text),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_endpoint() {
        let client = OsrmClient::new(&OsrmSettings {
            base_url: "http://localhost:5000/".to_owned(),
            ..OsrmSettings::default()
        })
        .unwrap();
        assert_eq!(
            client.url("route/v1/driving/1,2;3,4"),
            "http://localhost:5000/route/v1/driving/1,2;3,4"
        );
    }

    #[tokio::test]
    async fn client_side_rate_limit() {
        let client = OsrmClient::new(&OsrmSettings {
            rate_limit_per_minute: Some(2),
            ..OsrmSettings::default()
        })
        .unwrap();
        assert!(client.try_decrement_available_requests().await.is_ok());
        assert!(client.try_decrement_available_requests().await.is_ok());
        assert!(matches!(
            client.try_decrement_available_requests().await,
            Err(ApiError::RateLimitReached)
        ));
        assert_eq!(client.available_requests().await, Some(0));
    }

    #[tokio::test]
    async fn unlimited_without_setting() {
        let client = OsrmClient::new(&OsrmSettings::default()).unwrap();
        for _ in 0..10 {
            assert!(client.try_decrement_available_requests().await.is_ok());
        }
        assert_eq!(client.available_requests().await, None);
    }
}
