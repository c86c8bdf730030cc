use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::courier::{Courier, Direction};
use crate::models::status::CourierStatus;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/courier", get(get_courier))
        .route("/api/courier/move", post(move_courier))
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
    pub zoom: i32,
}

async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<CourierStatus>, AppError> {
    Ok(Json(state.facade.status().await?))
}

async fn get_courier(State(state): State<Arc<AppState>>) -> Result<Json<Courier>, AppError> {
    Ok(Json(state.facade.couriers().get_courier().await?))
}

async fn move_courier(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<CourierStatus>, AppError> {
    let status = state.move_courier(payload.direction, payload.zoom).await?;
    Ok(Json(status))
}
