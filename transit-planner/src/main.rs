use std::net::SocketAddr;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transit_planner::cache::{CacheConfig, CachedFeed};
use transit_planner::mbta::{MbtaClient, MbtaConfig};
use transit_planner::planner::PlannerConfig;
use transit_planner::registry::{StaticNetwork, StationCatalog};
use transit_planner::web::{AppState, create_router};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // The API serves anonymous requests at a lower rate limit
    let api_key = std::env::var("MBTA_API_KEY").ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        warn!("MBTA_API_KEY not set, using the anonymous rate limit");
    }

    let mut mbta_config = MbtaConfig::new(api_key);
    if let Ok(url) = std::env::var("MBTA_BASE_URL") {
        mbta_config = mbta_config.with_base_url(url);
    }
    let client = MbtaClient::new(mbta_config).expect("Failed to create MBTA client");

    let mut cache_config = CacheConfig::default();
    if let Some(secs) = std::env::var("CACHE_TTL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
    {
        cache_config.ttl = Duration::from_secs(secs);
    }
    let feed = CachedFeed::new(client, &cache_config);

    // Static station catalog (fail fast if unreadable)
    let catalog = match std::env::var("STATION_CATALOG") {
        Ok(path) => StationCatalog::load(&path).expect("Failed to load station catalog"),
        Err(_) => StationCatalog::bundled().expect("Bundled station catalog is invalid"),
    };
    info!(stations = catalog.len(), "Loaded station catalog");

    let state = AppState::new(
        feed,
        StaticNetwork::boston(catalog),
        PlannerConfig::default(),
    );
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .expect("BIND_ADDR must be a socket address");

    info!(%addr, "MBTA trip planner listening");
    info!("  GET  /health             - Health check");
    info!("  POST /trip/plan          - Plan a trip");
    info!("  POST /trip/alternatives  - Plan a trip avoiding some modes");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
