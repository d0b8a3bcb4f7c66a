//! At-bat tracker binary entrypoint.
//! Loads config, starts the poller task and serves the status surface.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use atbat_tracker::metrics::Metrics;
use atbat_tracker::{api, Poller, StatusBoard, TrackerConfig};

/// `RUST_LOG` wins; otherwise info for this crate, warn for dependencies.
/// `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("atbat_tracker=info,warn"));

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
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = TrackerConfig::load_default().context("loading tracker config")?;
    tracing::info!(
        mode = cfg.mode.as_str(),
        subject = %cfg.subject.name,
        player_id = cfg.subject.player_id,
        sink = ?cfg.publisher.kind,
        interval_secs = cfg.poll_interval_secs,
        "starting at-bat tracker"
    );

    let metrics = Metrics::init(cfg.poll_interval_secs, cfg.stats_freshness_secs)?;
    let status = Arc::new(StatusBoard::new(cfg.mode, cfg.subject.name.clone()));
    let poller = Poller::from_config(&cfg, status.clone())?;

    if cfg.announce_on_start {
        let outcome = poller.announce(Utc::now()).await;
        if !outcome.success {
            tracing::error!("deployment announcement was not published");
        }
    }

    let _poller_task = poller.spawn();

    let app = api::router(status).merge(metrics.router());
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.server.port))
        .await
        .with_context(|| format!("binding status server on port {}", cfg.server.port))?;
    tracing::info!(port = cfg.server.port, "status server listening");
    axum::serve(listener, app).await.context("status server")?;
    Ok(())
}
