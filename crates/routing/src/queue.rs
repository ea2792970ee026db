use std::time::Duration;

use itertools::Itertools;
use model::{leg::RouteLeg, waypoint::Waypoint};
use tokio::sync::Mutex;

use crate::{
    backoff::{BackoffPolicy, NoRetry},
    clock::Clock,
    router::{LegError, LegRouter},
};

pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(500);

/// Resolves the legs between consecutive waypoints one after another.
///
/// Requests never overlap, not even between passes sharing the queue. Between
/// two consecutive requests the queue waits for `interval` to stay below the
/// informal rate limit of public routing services. Failed requests are retried
/// as long as the backoff policy allows, afterwards the leg falls back to a
/// straight line.
pub struct LegQueue<R, C> {
    router: R,
    clock: C,
    interval: Duration,
    backoff: Box<dyn BackoffPolicy>,
    /// Clock time the last request finished, held for the whole request.
    last_request: Mutex<Option<Duration>>,
}

impl<R, C> LegQueue<R, C>
where
    R: LegRouter,
    C: Clock,
{
    pub fn new(router: R, clock: C) -> Self {
        Self {
            router,
            clock,
            interval: DEFAULT_REQUEST_INTERVAL,
            backoff: Box::new(NoRetry),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_backoff(mut self, backoff: Box<dyn BackoffPolicy>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Resolves all `n - 1` legs of `waypoints` in order.
    ///
    /// `is_current` is asked before every request. Once it returns `false`
    /// the remaining legs are skipped and `None` is returned.
    pub async fn resolve<F>(&self, waypoints: &[Waypoint], is_current: F) -> Option<Vec<RouteLeg>>
    where
        F: Fn() -> bool + Send + Sync,
    {
        let mut legs = Vec::with_capacity(waypoints.len().saturating_sub(1));

        for (index, (from, to)) in waypoints.iter().tuple_windows().enumerate() {
            let mut retry = 0;
            let mut pause = self.interval;
            let leg = loop {
                let result = {
                    let mut last_request = self.last_request.lock().await;
                    if let Some(finished) = *last_request {
                        let since = self.clock.elapsed().saturating_sub(finished);
                        let wait = pause.saturating_sub(since);
                        if !wait.is_zero() {
                            self.clock.sleep(wait).await;
                        }
                    }
                    if !is_current() {
                        log::debug!("leg {index} skipped, pass is outdated");
                        return None;
                    }

                    log::debug!(
                        "requesting leg {index} from {} to {}",
                        from.coordinate(),
                        to.coordinate()
                    );
                    let result = self.router.route(from.coordinate(), to.coordinate()).await;
                    *last_request = Some(self.clock.elapsed());
                    result
                };

                match result {
                    Ok(geometry) if !geometry.is_empty() => {
                        break RouteLeg::resolved(from.clone(), to.clone(), geometry);
                    }
                    Ok(_) => {
                        let why = LegError::NoRoute("empty geometry".to_owned());
                        log::warn!("leg {index} falls back to a straight line: {why}");
                        break RouteLeg::fallback(from.clone(), to.clone(), why.fallback_reason());
                    }
                    Err(why) => {
                        retry += 1;
                        match self.backoff.next_delay(retry, &why) {
                            Some(delay) => {
                                log::info!("leg {index} failed ({why}), retry {retry} in {delay:?}");
                                pause = delay.max(self.interval);
                            }
                            None => {
                                log::warn!("leg {index} falls back to a straight line: {why}");
                                break RouteLeg::fallback(
                                    from.clone(),
                                    to.clone(),
                                    why.fallback_reason(),
                                );
                            }
                        }
                    }
                }
            };
            legs.push(leg);
        }

        Some(legs)
    }
}
