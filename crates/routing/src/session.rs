use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use model::{leg::RouteLeg, waypoint::Waypoint};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};

use crate::{
    clock::Clock,
    queue::LegQueue,
    renderer::{MapRenderer, RenderSummary, DEFAULT_ROUTE_COLOR},
    router::LegRouter,
    surface::MapSurface,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RenderState {
    Idle,
    Loading { sequence: u64 },
    #[serde(rename_all = "camelCase")]
    Rendered { sequence: u64, failed_legs: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub sequence: u64,
    pub legs: Vec<RouteLeg>,
    pub summary: RenderSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(RenderReport),
    /// A newer pass was started before this one finished, nothing was drawn.
    Stale { sequence: u64 },
}

/// One map plus everything needed to draw routes on it.
///
/// Each call to `render` is a pass tagged with a sequence number. Passes may
/// overlap, but only the most recently started one is allowed to touch the
/// surface; older passes stop requesting legs and are dropped.
pub struct RenderSession<R, C, S> {
    queue: Arc<LegQueue<R, C>>,
    renderer: Mutex<MapRenderer<S>>,
    latest: AtomicU64,
    state: watch::Sender<RenderState>,
    color: String,
}

impl<R, C, S> RenderSession<R, C, S>
where
    R: LegRouter,
    C: Clock,
    S: MapSurface,
{
    pub fn new(queue: Arc<LegQueue<R, C>>, renderer: MapRenderer<S>) -> Self {
        let (state, _) = watch::channel(RenderState::Idle);
        Self {
            queue,
            renderer: Mutex::new(renderer),
            latest: AtomicU64::new(0),
            state,
            color: DEFAULT_ROUTE_COLOR.to_owned(),
        }
    }

    pub fn with_color<T: Into<String>>(mut self, color: T) -> Self {
        self.color = color.into();
        self
    }

    pub fn state(&self) -> RenderState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.state.subscribe()
    }

    pub fn latest_sequence(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    fn is_current(&self, sequence: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == sequence
    }

    /// Announces a started pass unless a newer one was started meanwhile.
    fn publish_loading(&self, sequence: u64) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_current(sequence) {
                return false;
            }
            *state = RenderState::Loading { sequence };
            true
        })
    }

    pub async fn render(&self, waypoints: &[Waypoint]) -> RenderOutcome {
        let color = self.color.clone();
        self.render_with_color(waypoints, &color).await
    }

    pub async fn render_with_color(&self, waypoints: &[Waypoint], color: &str) -> RenderOutcome {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish_loading(sequence);
        log::info!("render pass {sequence} with {} waypoints", waypoints.len());

        let legs = if waypoints.len() < 2 {
            vec![]
        } else {
            match self
                .queue
                .resolve(waypoints, || self.is_current(sequence))
                .await
            {
                Some(legs) => legs,
                None => return RenderOutcome::Stale { sequence },
            }
        };

        let mut renderer = self.renderer.lock().await;
        if !self.is_current(sequence) {
            log::debug!("render pass {sequence} is outdated, discarding it");
            return RenderOutcome::Stale { sequence };
        }
        let summary = renderer.render(waypoints, &legs, color);
        self.state.send_replace(RenderState::Rendered {
            sequence,
            failed_legs: summary.failed_legs.len(),
        });
        if let Some(notice) = &summary.notice {
            log::warn!("render pass {sequence}: {notice}");
        }

        RenderOutcome::Rendered(RenderReport {
            sequence,
            legs,
            summary,
        })
    }

    /// Invalidates every running pass, clears the surface and returns to idle.
    pub async fn reset(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
        self.renderer.lock().await.clear();
        self.state.send_replace(RenderState::Idle);
    }

    /// Runs `f` with read access to the surface.
    pub async fn with_surface<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        f(self.renderer.lock().await.surface())
    }

    pub fn into_renderer(self) -> MapRenderer<S> {
        self.renderer.into_inner()
    }
}
