use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use game_catalogue::api::{self, AppState};
use game_catalogue::Catalogue;
use tracing_subscriber::EnvFilter;

fn env_secs(name: &str) -> anyhow::Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(value) => {
            let secs: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("{name} must be a number of seconds"))?;
            Ok(Some(Duration::from_secs(secs)))
        }
        Err(_) => Ok(None),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let upstream_base = std::env::var("CATALOGUE_UPSTREAM_BASE")
        .context("CATALOGUE_UPSTREAM_BASE must point at the upstream catalogue API")?;
    let bind = std::env::var("CATALOGUE_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid CATALOGUE_BIND address: {bind}"))?;

    let mut builder = Catalogue::builder().upstream_base(upstream_base);
    if let Ok(dir) = std::env::var("CATALOGUE_DATA_DIR") {
        builder = builder.data_dir(dir);
    }
    if let Some(stale_after) = env_secs("CATALOGUE_STALE_AFTER_SECS")? {
        builder = builder.stale_after(stale_after);
    }
    if let Some(interval) = env_secs("CATALOGUE_CHECK_INTERVAL_SECS")? {
        builder = builder.check_interval(interval);
    }
    let catalogue = builder.build().context("failed to initialize catalogue")?;
    tracing::info!(%catalogue, "catalogue ready");

    let admin_token = std::env::var("CATALOGUE_ADMIN_TOKEN").ok();
    if admin_token.is_none() {
        tracing::warn!("CATALOGUE_ADMIN_TOKEN not set, admin refresh is disabled");
    }

    let scheduler = catalogue.spawn_scheduler();
    let state = Arc::new(AppState::new(catalogue, admin_token));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("server error")?;

    scheduler.shutdown().await;
    Ok(())
}
