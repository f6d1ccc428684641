//! Police ticker service: binary entrypoint.
//! Boots the Axum HTTP server with feed, analysis and AI chat routes.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use police_ticker::config::AppConfig;
use police_ticker::ingest::{FeedFetcher, FeedRegistry};
use police_ticker::metrics::Metrics;
use police_ticker::{router, AiRuntime, AppState};

/// Compact fmt logs by default; JSON lines with LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("police_ticker=info,tower_http=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; a missing file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let app_cfg = AppConfig::from_env()?;
    let registry = FeedRegistry::load_default().context("loading feed registry")?;
    tracing::info!(feeds = registry.len(), "feed registry ready");

    let ai = AiRuntime::from_env();
    let fetcher = FeedFetcher::with_timeout(app_cfg.fetch_timeout);
    let state = AppState::new(registry, fetcher, &ai);

    let metrics = Metrics::init()?;
    let app = router(state).merge(metrics.router());

    let addr = app_cfg.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "police ticker listening");

    axum::serve(listener, app).await?;
    Ok(())
}
