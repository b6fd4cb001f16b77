//! testmux API server.

use std::net::SocketAddr;
use std::sync::Arc;

use testmux_api::{AppState, routes};
use testmux_core::Worker;
use testmux_scheduler::{RandomOutcome, Scheduler, SchedulerConfig};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Static pool: one worker per supported test target.
    let workers = vec![
        Worker::new("worker1", "emulator"),
        Worker::new("worker2", "device"),
        Worker::new("worker3", "browserstack"),
    ];

    let scheduler = Arc::new(Scheduler::new(
        workers,
        SchedulerConfig::default(),
        Arc::new(RandomOutcome::default()),
    ));
    let _dispatcher = scheduler.clone().run();

    // Build router
    let state = AppState::new(scheduler);
    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr: SocketAddr = std::env::var("TESTMUX_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    info!("starting server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
