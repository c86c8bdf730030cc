use std::sync::Arc;
use std::time::Instant;

use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::models::order::Order;
use crate::state::AppState;

/// Periodically deletes orders older than the configured max age.
pub async fn run_order_sweeper(state: Arc<AppState>, period: Duration) {
    info!(period_ms = period.as_millis() as u64, "order sweeper started");

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if let Err(err) = sweep_once(&state).await {
            error!(error = %err, "order sweep failed");
        }
    }
}

/// One sweep: removes expired orders and refreshes the active order gauge.
pub async fn sweep_once(state: &AppState) -> Result<usize, AppError> {
    let start = Instant::now();
    let result = state.orders().remove_expired().await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(swept) => {
            state
                .metrics
                .sweep_latency_seconds
                .with_label_values(&["success"])
                .observe(elapsed);
            state.metrics.orders_swept_total.inc_by(swept as u64);
            if swept > 0 {
                info!(swept, "expired orders swept");
            }
            refresh_active_orders(state).await?;
            Ok(swept)
        }
        Err(err) => {
            state
                .metrics
                .sweep_latency_seconds
                .with_label_values(&["error"])
                .observe(elapsed);
            Err(err)
        }
    }
}

/// Periodically generates orders while fewer than `max_active` exist.
pub async fn run_order_generator(state: Arc<AppState>, period: Duration, max_active: u64) {
    info!(
        period_ms = period.as_millis() as u64,
        max_active, "order generator started"
    );

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if let Err(err) = generate_once(&state, max_active).await {
            error!(error = %err, "order generation failed");
        }
    }
}

/// Generates a single order unless the active count already reached `max_active`.
pub async fn generate_once(state: &AppState, max_active: u64) -> Result<Option<Order>, AppError> {
    let active = state.orders().count().await?;
    if active >= max_active {
        debug!(active, max_active, "order limit reached, skipping generation");
        return Ok(None);
    }

    generate_recorded(state).await.map(Some)
}

/// Generates one order and records the outcome in the order metrics.
pub async fn generate_recorded(state: &AppState) -> Result<Order, AppError> {
    match state.orders().generate_order().await {
        Ok(order) => {
            state
                .metrics
                .orders_generated_total
                .with_label_values(&["success"])
                .inc();
            refresh_active_orders(state).await?;
            Ok(order)
        }
        Err(err) => {
            state
                .metrics
                .orders_generated_total
                .with_label_values(&["error"])
                .inc();
            Err(err)
        }
    }
}

async fn refresh_active_orders(state: &AppState) -> Result<(), AppError> {
    let active = state.orders().count().await?;
    state.metrics.orders_active.set(active as i64);
    Ok(())
}
