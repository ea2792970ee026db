use std::error;
use std::fmt;
use std::sync::Arc;

use routing::LegError;

pub mod client;
pub mod model;
pub mod route;

#[derive(Debug, Clone)]
pub enum ApiError {
    RequestError(Arc<reqwest::Error>),
    JsonError(Arc<serde_json::Error>),
    InvalidResponse {
        status_code: reqwest::StatusCode,
        url: String,
        response: Option<String>,
    },
    RateLimitReached,
    NoRoute {
        code: String,
        message: Option<String>,
    },
    Other(String),
}

impl error::Error for ApiError {}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::RequestError(e) => write!(f, "HTTP request error: {}", e),
            ApiError::JsonError(e) => write!(f, "JSON parse error: {}", e),
            ApiError::InvalidResponse {
                status_code,
                url,
                response,
            } => match response {
                Some(text) => {
                    write!(f, "Invalid Response ({}) {}: {}", status_code, text, url)
                }
                None => write!(f, "Invalid Response ({}) {}", status_code, url),
            },
            ApiError::RateLimitReached => write!(f, "Rate limit reached."),
            ApiError::NoRoute { code, message } => match message {
                Some(message) => write!(f, "No route ({}): {}", code, message),
                None => write!(f, "No route ({})", code),
            },
            ApiError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::RequestError(Arc::new(e))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::JsonError(Arc::new(e))
    }
}

impl From<ApiError> for LegError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::RequestError(why) => LegError::Unreachable(why.to_string()),
            ApiError::RateLimitReached => LegError::RateLimited,
            ApiError::InvalidResponse { status_code, .. }
                if status_code == reqwest::StatusCode::TOO_MANY_REQUESTS =>
            {
                LegError::RateLimited
            }
            ApiError::InvalidResponse { status_code, .. } if status_code.is_server_error() => {
                LegError::Unreachable(format!("server answered {status_code}"))
            }
            ApiError::NoRoute { code, .. } => LegError::NoRoute(code),
            other => LegError::InvalidResponse(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    fn invalid(status_code: StatusCode) -> ApiError {
        ApiError::InvalidResponse {
            status_code,
            url: "http://localhost/route".to_owned(),
            response: None,
        }
    }

    #[test]
    fn server_errors_are_transient() {
        assert!(LegError::from(invalid(StatusCode::BAD_GATEWAY)).is_transient());
        assert_eq!(
            LegError::from(invalid(StatusCode::TOO_MANY_REQUESTS)),
            LegError::RateLimited
        );
    }

    #[test]
    fn missing_routes_are_not_transient() {
        let error = LegError::from(ApiError::NoRoute {
            code: "NoRoute".to_owned(),
            message: Some("Impossible route between points".to_owned()),
        });
        assert_eq!(error, LegError::NoRoute("NoRoute".to_owned()));
        assert!(!LegError::from(invalid(StatusCode::BAD_REQUEST)).is_transient());
    }
}
