use std::{error::Error, path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::{Args, Parser, Subcommand};
use model::{leg::FallbackReason, preferences::Theme, waypoint::Waypoint};
use nominatim::client::{NominatimClient, NominatimSettings, SearchQuery};
use osrm::client::{OsrmClient, OsrmSettings};
use routing::{
    backoff::BackoffKind, clock::TokioClock, preferences::PreferenceStore,
    router::StraightLineRouter, LegRouter, RenderConfig, RenderOutcome, RenderSession,
};

mod waypoints;

type CliResult = Result<(), Box<dyn Error>>;

/// Routes, geocodes and remembers the map theme for Fleetix.
#[derive(Debug, Parser)]
#[command(name = "fleetix", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Routes waypoints leg by leg and prints the drawn map as GeoJSON.
    Route(RouteArgs),
    /// Looks up places by name.
    Geocode(GeocodeArgs),
    /// Shows or changes the stored map theme.
    Theme(ThemeArgs),
}

#[derive(Debug, Args)]
struct RouteArgs {
    /// CSV file with a `latitude,longitude,label,role` header.
    #[arg(long, short)]
    file: Option<PathBuf>,

    /// Additional waypoint `lat,lon[,label[,role]]`, appended after the file.
    #[arg(long = "stop", short = 's', allow_hyphen_values = true)]
    stops: Vec<Waypoint>,

    /// Base url of the OSRM service.
    #[arg(long, env = "FLEETIX_OSRM_URL")]
    osrm_url: Option<String>,

    /// Draw straight lines instead of asking a routing service.
    #[arg(long)]
    straight: bool,

    /// Pause between two routing requests in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    #[arg(long)]
    backoff: Option<BackoffKind>,

    #[arg(long)]
    max_retries: Option<u32>,

    /// Line color of routed legs.
    #[arg(long)]
    color: Option<String>,

    /// Write the GeoJSON here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct GeocodeArgs {
    query: String,

    #[arg(long, short, default_value_t = 5)]
    limit: usize,

    /// Prefer results around `lat,lon`.
    #[arg(long, allow_hyphen_values = true)]
    near: Option<Waypoint>,

    #[arg(long, default_value_t = 25.0)]
    radius_km: f64,
}

#[derive(Debug, Args)]
struct ThemeArgs {
    /// Preference file, kept in memory when missing.
    #[arg(long, env = "FLEETIX_PREFERENCES")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    action: Option<ThemeAction>,
}

#[derive(Debug, Subcommand)]
enum ThemeAction {
    Show,
    Set { theme: Theme },
    Toggle,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Route(args) => route(args).await,
        Command::Geocode(args) => geocode(args).await,
        Command::Theme(args) => theme(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(why) => {
            log::error!("{why}");
            ExitCode::FAILURE
        }
    }
}

async fn route(args: RouteArgs) -> CliResult {
    let mut waypoints = match &args.file {
        Some(path) => waypoints::read_waypoint_file(path)?,
        None => vec![],
    };
    waypoints.extend(args.stops);
    if waypoints.len() < 2 {
        log::warn!("{} waypoint(s) given, nothing to route", waypoints.len());
    }

    let mut config = RenderConfig::from_env();
    if let Some(interval_ms) = args.interval_ms {
        config.request_interval = Duration::from_millis(interval_ms);
    }
    if let Some(backoff) = args.backoff {
        config.backoff = backoff;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    if let Some(color) = args.color {
        config.color = color;
    }

    let router: Arc<dyn LegRouter> = if args.straight {
        Arc::new(StraightLineRouter)
    } else {
        let mut settings = OsrmSettings::env();
        if let Some(url) = args.osrm_url {
            settings.base_url = url;
        }
        Arc::new(OsrmClient::new(&settings)?)
    };

    let session = RenderSession::new(
        Arc::new(config.leg_queue(router, TokioClock::new())),
        config.scene_renderer(),
    )
    .with_color(config.color.clone());

    let report = match session.render(&waypoints).await {
        RenderOutcome::Rendered(report) => report,
        RenderOutcome::Stale { sequence } => {
            return Err(format!("render pass {sequence} was superseded").into())
        }
    };
    for failed in &report.summary.failed_legs {
        if failed.reason != FallbackReason::NotRequested {
            log::warn!("leg {} drawn as a straight line: {}", failed.index, failed.reason);
        }
    }
    log::info!(
        "{} markers, {} lines, {:.2} km",
        report.summary.markers,
        report.summary.lines,
        report.summary.distance_km
    );

    let scene = session.into_renderer().into_surface().to_geojson();
    let json = serde_json::to_string_pretty(&scene)?;
    match args.output {
        Some(path) => tokio::fs::write(path, json).await?,
        None => println!("{json}"),
    }
    Ok(())
}

async fn geocode(args: GeocodeArgs) -> CliResult {
    let client = NominatimClient::new(&NominatimSettings::env())?;
    let mut query = SearchQuery::new(args.query).limit(args.limit);
    if let Some(near) = args.near {
        query = query.near(near.latitude, near.longitude, args.radius_km);
    }

    let places = client.search(&query).await?;
    if places.is_empty() {
        log::info!("no places found");
    }
    for place in places {
        println!("{}\t{}", place.coordinate, place.display_name);
    }
    Ok(())
}

async fn theme(args: ThemeArgs) -> CliResult {
    let store = match args.file {
        Some(path) => PreferenceStore::open(path).await?,
        None => PreferenceStore::in_memory(),
    };
    let preferences = match args.action.unwrap_or(ThemeAction::Show) {
        ThemeAction::Show => store.get(),
        ThemeAction::Set { theme } => store.set_theme(theme).await?,
        ThemeAction::Toggle => store.toggle_theme().await?,
    };
    println!("{}", serde_json::to_string_pretty(&preferences)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use model::waypoint::WaypointRole;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_route_stops() {
        let cli = Cli::parse_from([
            "fleetix",
            "route",
            "--straight",
            "--stop",
            "54.32,10.12,Depot,pickup",
            "-s",
            "54.34,10.10,Office,dropoff",
            "--backoff",
            "exponential",
        ]);
        let Command::Route(args) = cli.command else {
            panic!("expected the route command");
        };
        assert!(args.straight);
        assert_eq!(args.stops.len(), 2);
        assert_eq!(args.stops[1].role, WaypointRole::Dropoff);
        assert_eq!(args.backoff, Some(BackoffKind::Exponential));
    }

    #[test]
    fn parse_theme_actions() {
        let cli = Cli::parse_from(["fleetix", "theme", "set", "dark"]);
        let Command::Theme(args) = cli.command else {
            panic!("expected the theme command");
        };
        assert!(matches!(args.action, Some(ThemeAction::Set { theme: Theme::Dark })));
    }

    #[tokio::test]
    async fn route_straight_lines_to_file() {
        let output = std::env::temp_dir().join(format!("fleetix-route-{}.json", std::process::id()));
        let args = RouteArgs {
            file: None,
            stops: vec![
                "0,0,A,pickup".parse().unwrap(),
                "0,1,B".parse().unwrap(),
                "1,1,C,dropoff".parse().unwrap(),
            ],
            osrm_url: None,
            straight: true,
            interval_ms: Some(0),
            backoff: None,
            max_retries: None,
            color: None,
            output: Some(output.clone()),
        };
        route(args).await.unwrap();

        let scene: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(scene["features"].as_array().unwrap().len(), 5);
        std::fs::remove_file(output).unwrap();
    }
}
