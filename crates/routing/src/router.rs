use std::{error, fmt, sync::Arc};

use async_trait::async_trait;
use model::{
    coordinate::{Coordinate, Geometry},
    leg::FallbackReason,
};

/// Why a single leg could not be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum LegError {
    /// Network failure, timeout or a server side error.
    Unreachable(String),
    RateLimited,
    /// The service answered but knows no route between the points.
    NoRoute(String),
    /// Unexpected status code or a payload that could not be parsed.
    InvalidResponse(String),
    /// No routing service is configured.
    Disabled,
}

impl LegError {
    /// Transient errors may succeed when the same request is repeated later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::RateLimited)
    }

    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            Self::Unreachable(_) => FallbackReason::Unreachable,
            Self::RateLimited => FallbackReason::RateLimited,
            Self::NoRoute(_) => FallbackReason::NoRoute,
            Self::InvalidResponse(_) => FallbackReason::InvalidResponse,
            Self::Disabled => FallbackReason::NotRequested,
        }
    }
}

impl error::Error for LegError {}

impl fmt::Display for LegError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Unreachable(why) => write!(f, "Routing service unreachable: {why}"),
            Self::RateLimited => write!(f, "Rate limit reached."),
            Self::NoRoute(why) => write!(f, "No route found: {why}"),
            Self::InvalidResponse(why) => write!(f, "Invalid routing response: {why}"),
            Self::Disabled => write!(f, "Routing is disabled."),
        }
    }
}

/// Resolves a road-following geometry between two points.
#[async_trait]
pub trait LegRouter: Send + Sync {
    async fn route(&self, from: Coordinate, to: Coordinate) -> Result<Geometry, LegError>;
}

#[async_trait]
impl<R: LegRouter + ?Sized> LegRouter for Arc<R> {
    async fn route(&self, from: Coordinate, to: Coordinate) -> Result<Geometry, LegError> {
        (**self).route(from, to).await
    }
}

/// Never asks anybody. Every leg becomes a dashed straight line, useful when
/// no routing service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineRouter;

#[async_trait]
impl LegRouter for StraightLineRouter {
    async fn route(&self, _from: Coordinate, _to: Coordinate) -> Result<Geometry, LegError> {
        Err(LegError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn straight_lines_are_fallbacks() {
        let error = StraightLineRouter
            .route(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0))
            .await
            .unwrap_err();

        assert!(!error.is_transient());
        assert_eq!(error.fallback_reason(), FallbackReason::NotRequested);
    }
}
