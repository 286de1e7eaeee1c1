//! Relay Server
//!
//! Accepts API description documents, caches their normalized routes, and
//! dispatches a single route to a remote job service, waiting for the run to
//! finish before answering.

use anyhow::{Context, Result};
use clap::Parser;
use relay_client::{JobServiceClient, Orchestrator};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod repository;
pub mod service;

use crate::api::AppState;
use crate::config::Config;
use crate::repository::MemoryCache;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "relay_server=info,relay_client=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Relay Server...");

    let config = Config::parse();
    config.validate()?;

    tracing::info!(
        "Job service: {}, poll interval: {}ms, poll timeout: {}ms",
        config.job_service_url,
        config.poll_interval_ms,
        config.poll_timeout_ms
    );

    // One pooled HTTP client shared by every orchestration call
    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let client = JobServiceClient::with_client(config.job_service_url.clone(), http_client);

    let shutdown = CancellationToken::new();
    let state = AppState {
        cache: Arc::new(MemoryCache::new()),
        orchestrator: Orchestrator::from_client(client),
        poll_defaults: config.poll_defaults(),
        shutdown: shutdown.clone(),
    };

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    tracing::info!("Relay Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, after cancelling every in-flight dispatch
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown requested, cancelling in-flight dispatches");
    shutdown.cancel();
}
