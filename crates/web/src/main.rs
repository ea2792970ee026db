use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;
use web::{start_web_server, WebState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let address: SocketAddr = std::env::var("FLEETIX_BIND")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

    let state = WebState::from_env()
        .await
        .expect("could not build the web state from the environment.");

    if let Err(why) = start_web_server(state, address).await {
        tracing::error!("web server stopped: {why}");
    }
}
