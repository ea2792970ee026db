use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::router::LegError;

/// Decides whether and when a failed leg request is retried.
pub trait BackoffPolicy: Send + Sync {
    /// Returns the delay before retry number `retry` (starting at 1), or `None`
    /// to give up and fall back.
    fn next_delay(&self, retry: u32, error: &LegError) -> Option<Duration>;
}

/// Never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl BackoffPolicy for NoRetry {
    fn next_delay(&self, _retry: u32, _error: &LegError) -> Option<Duration> {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConstantBackoff {
    pub delay: Duration,
    pub max_retries: u32,
}

impl BackoffPolicy for ConstantBackoff {
    fn next_delay(&self, retry: u32, error: &LegError) -> Option<Duration> {
        (error.is_transient() && retry <= self.max_retries).then_some(self.delay)
    }
}

/// Adds `step` for every consecutive failure.
#[derive(Debug, Clone, Copy)]
pub struct LinearBackoff {
    pub step: Duration,
    pub max_retries: u32,
}

impl BackoffPolicy for LinearBackoff {
    fn next_delay(&self, retry: u32, error: &LegError) -> Option<Duration> {
        (error.is_transient() && retry <= self.max_retries).then(|| self.step.saturating_mul(retry))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub factor: u32,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl BackoffPolicy for ExponentialBackoff {
    fn next_delay(&self, retry: u32, error: &LegError) -> Option<Duration> {
        if !error.is_transient() || retry > self.max_retries {
            return None;
        }
        let multiplier = self.factor.max(1).saturating_pow(retry.saturating_sub(1));
        Some(self.initial.saturating_mul(multiplier).min(self.max_delay))
    }
}

/// Serializable selection of a backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    None,
    Constant,
    Linear,
    Exponential,
}

impl std::str::FromStr for BackoffKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "constant" => Ok(Self::Constant),
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            other => Err(format!("unknown backoff policy '{other}'")),
        }
    }
}

impl BackoffKind {
    /// Builds the policy. `step` is the base delay, `max_retries` the number
    /// of retries after the first attempt.
    pub fn build(self, step: Duration, max_retries: u32) -> Box<dyn BackoffPolicy> {
        if max_retries == 0 {
            return Box::new(NoRetry);
        }
        match self {
            Self::None => Box::new(NoRetry),
            Self::Constant => Box::new(ConstantBackoff {
                delay: step,
                max_retries,
            }),
            Self::Linear => Box::new(LinearBackoff { step, max_retries }),
            Self::Exponential => Box::new(ExponentialBackoff {
                initial: step,
                factor: 2,
                max_delay: step.saturating_mul(32),
                max_retries,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable() -> LegError {
        LegError::Unreachable("connection refused".to_owned())
    }

    #[test]
    fn no_retry_gives_up() {
        assert_eq!(NoRetry.next_delay(1, &unreachable()), None);
    }

    #[test]
    fn linear_grows_by_step() {
        let policy = LinearBackoff {
            step: Duration::from_millis(100),
            max_retries: 3,
        };
        assert_eq!(policy.next_delay(1, &unreachable()), Some(Duration::from_millis(100)));
        assert_eq!(policy.next_delay(3, &unreachable()), Some(Duration::from_millis(300)));
        assert_eq!(policy.next_delay(4, &unreachable()), None);
    }

    #[test]
    fn exponential_is_capped() {
        let policy = ExponentialBackoff {
            initial: Duration::from_millis(100),
            factor: 2,
            max_delay: Duration::from_millis(500),
            max_retries: 10,
        };
        assert_eq!(policy.next_delay(1, &unreachable()), Some(Duration::from_millis(100)));
        assert_eq!(policy.next_delay(3, &unreachable()), Some(Duration::from_millis(400)));
        assert_eq!(policy.next_delay(5, &unreachable()), Some(Duration::from_millis(500)));
    }

    #[test]
    fn missing_routes_are_never_retried() {
        let policy = ConstantBackoff {
            delay: Duration::from_millis(100),
            max_retries: 5,
        };
        let error = LegError::NoRoute("NoRoute".to_owned());
        assert_eq!(policy.next_delay(1, &error), None);
        assert_eq!(policy.next_delay(1, &LegError::RateLimited), Some(Duration::from_millis(100)));
    }

    #[test]
    fn kind_parses_and_builds() {
        let kind: BackoffKind = "Linear".parse().unwrap();
        let policy = kind.build(Duration::from_millis(10), 2);
        assert_eq!(policy.next_delay(2, &unreachable()), Some(Duration::from_millis(20)));
        assert!(BackoffKind::Linear.build(Duration::from_millis(10), 0)
            .next_delay(1, &unreachable())
            .is_none());
    }

    #[test]
    fn huge_steps_saturate() {
        let step = Duration::from_millis(u64::MAX);
        let linear = BackoffKind::Linear.build(step, 3);
        assert_eq!(linear.next_delay(3, &unreachable()), Some(Duration::MAX));

        let exponential = BackoffKind::Exponential.build(step, 3);
        assert_eq!(exponential.next_delay(3, &unreachable()), Some(Duration::MAX));
    }
}
