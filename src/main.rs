use std::sync::Arc;

use courier_sim::api;
use courier_sim::config::{Config, LogFormat};
use courier_sim::engine::lifecycle::{run_order_generator, run_order_sweeper};
use courier_sim::error::AppError;
use courier_sim::state::AppState;
use courier_sim::storage::MemoryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;
    init_tracing(&config);

    let store = Arc::new(MemoryStore::new());
    let shared_state = Arc::new(AppState::new(&config, store).await?);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(run_order_generator(
        shared_state.clone(),
        config.order_generation_interval,
        config.max_active_orders,
    ));
    tokio::spawn(run_order_sweeper(
        shared_state.clone(),
        config.order_sweep_interval,
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::new(config.log_level.clone());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
