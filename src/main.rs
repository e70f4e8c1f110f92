mod config;
mod crawler;
mod models;
mod scrapers;
mod server;
mod utils;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::CrawlConfig;
use crate::crawler::Crawler;
use crate::scrapers::HttpFetcher;
use crate::server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(CrawlConfig::default());
    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .context("Failed to create data directory")?;

    let fetcher = Arc::new(HttpFetcher::new()?);
    let crawler = Arc::new(Crawler::new(fetcher, config.clone()));

    let app = server::router(AppState {
        crawler,
        config,
    });

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("estate-scout listening at http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
