//! Multi-leg route rendering.
//!
//! Waypoints are routed pairwise by a [`router::LegRouter`], one request at a
//! time through a [`queue::LegQueue`], and drawn by a [`renderer::MapRenderer`]
//! onto the [`surface::MapSurface`] it owns. A [`session::RenderSession`] ties
//! these together and makes sure only the latest pass reaches the surface.

pub mod backoff;
pub mod clock;
pub mod config;
pub mod preferences;
pub mod queue;
pub mod renderer;
pub mod router;
pub mod scene;
pub mod session;
pub mod surface;

pub use config::RenderConfig;
pub use router::{LegError, LegRouter};
pub use session::{RenderOutcome, RenderReport, RenderSession, RenderState};
