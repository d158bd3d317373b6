mod config;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use clap::Parser;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use daysync_core::clock::SystemClock;
use daysync_core::notify::LogSink;
use daysync_core::scheduler::ReminderScheduler;
use daysync_core::store::MemoryStore;

use crate::config::Args;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let store = Arc::new(match &args.data_file {
        Some(path) => MemoryStore::load(path)?,
        None => MemoryStore::new(),
    });

    let scheduler = ReminderScheduler::new(
        store.clone(),
        store.clone(),
        Arc::new(LogSink),
        Arc::new(SystemClock),
        args.scheduler_config(),
    )?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::events::router())
        .merge(routes::users::router())
        .with_state(AppState::new(store))
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    info!("daysync-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    // Stop the scheduler after the HTTP surface is down so an in-flight
    // tick can finish its store writes.
    let _ = shutdown_tx.send(true);
    let _ = scheduler_task.await;

    Ok(())
}
