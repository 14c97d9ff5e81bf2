mod actions;
mod api;
mod config;
mod error;
mod listing;
mod pipeline;
mod source;
mod state;
mod types;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::actions::{ActionLogger, ActionSink};
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, CHANNEL_CAPACITY};
use crate::error::Result;
use crate::pipeline::{compute_visible, compute_visible_with_stats, FilterConfig};
use crate::source::{AssetSource, MockAssetSource};
use crate::state::CatalogStore;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Catalog bootstrap ---
    let source = MockAssetSource::new(
        Duration::from_millis(cfg.fetch_delay_ms),
        cfg.owner_address.clone(),
    );
    let records = source.fetch_all().await?;
    let holdings = source.fetch_collection(&cfg.owner_address).await?;

    let store = CatalogStore::new();
    store.load(records);
    let owned = store.load_collection(holdings);
    if owned == 0 {
        warn!("Wallet {} holds no catalog assets; collection view will be empty", cfg.owner_address);
    }

    let health = Arc::new(HealthState::new());
    health.set_catalog_loaded(true);

    let snapshot = store.snapshot();
    let (visible, stats) = compute_visible_with_stats(&snapshot, &FilterConfig::default());
    let listed = compute_visible(&snapshot, &FilterConfig::default().toggle_listed()).len();
    info!(
        "Bootstrap complete: {} assets ({} listed, {} owned by {}), {} visible under default filter",
        store.len(),
        listed,
        owned,
        cfg.owner_address,
        visible.len(),
    );
    info!(
        "[FILTER] default view rejected: search={} kind={} price={} unlisted={}",
        stats.rejected_search,
        stats.rejected_kind,
        stats.rejected_price,
        stats.rejected_unlisted,
    );

    // --- Channels ---
    let (action_tx, action_rx) = mpsc::channel(CHANNEL_CAPACITY);

    // --- Spawn tasks ---

    // Market intent consumer: structured log of every buy, bid, offer and accept
    let logger = ActionLogger::new(action_rx, Arc::clone(&health));
    tokio::spawn(async move { logger.run().await });

    // HTTP API server
    let api_state = ApiState {
        store: Arc::clone(&store),
        health,
        latency: Arc::new(LatencyStats::new()),
        actions: ActionSink::new(action_tx),
        config: Arc::new(cfg.clone()),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
