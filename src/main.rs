//! Drishti - A synthetic operational-state feed for a crowd-management dashboard.
//!
//! # API Endpoints
//!
//! - `GET /snapshot` - The current snapshot
//! - `POST /snapshot/refresh` - Regenerate the snapshot now
//! - `GET /snapshot/kpis` - KPI ribbon figures
//! - `GET /analytics` - Density forecasts and hourly series
//! - `GET /crowd-control/choke-points` - Choke points by risk
//! - `GET /logistics` - Stock levels
//! - `GET /markers` - Moving pilgrim markers
//! - `GET /features/:kind/:id` - Selected map feature
//! - `GET /advisories/pending` - Pending AI advisory
//! - `POST /advisories/:id/approve` / `POST /advisories/:id/reject`
//! - `GET /map/provider` - Map backend selection
//! - `GET /health` - Health check
//!
//! # Configuration
//!
//! - `DRISHTI_PORT` - Listen port (default 3000)
//! - `DRISHTI_SEED` - Fixed RNG seed for reproducible feeds
//! - `DRISHTI_REFRESH_SECS` - Snapshot refresh interval (default 8)
//! - `DRISHTI_MAPBOX_TOKEN` - Selects the Mapbox map backend when set

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use drishti::api::{AppState, router};
use drishti::config::ServerConfig;
use drishti::feed::{SnapshotFeed, local_now};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("drishti=info".parse()?))
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env()?;
    let simulation = config.simulation();
    simulation.validate()?;

    let map_provider = config.map_provider();
    info!(
        port = config.port,
        seed = ?config.seed,
        refresh_secs = simulation.refresh_interval.as_secs(),
        map_provider = ?map_provider,
        "Starting Drishti server"
    );

    let feed = match config.seed {
        Some(seed) => SnapshotFeed::seeded(simulation, seed, local_now()),
        None => SnapshotFeed::new(simulation),
    };
    info!(
        total_crowd = feed.current().await.total_crowd,
        "Initial snapshot generated"
    );

    // Independent timers: snapshot refresh and marker jitter
    let refresh = feed.spawn_refresh_loop();
    let jitter = feed.spawn_jitter_loop();

    let app = router(AppState { feed, map_provider });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Drishti is listening");

    axum::serve(listener, app).await?;

    refresh.abort();
    jitter.abort();

    Ok(())
}
