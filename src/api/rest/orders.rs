use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::engine::lifecycle::generate_recorded;
use crate::error::AppError;
use crate::geo::Point;
use crate::models::order::Order;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/orders", get(orders_near).post(generate_order))
        .route("/api/orders/:id", get(get_order))
}

#[derive(Debug, Deserialize)]
pub struct NearQuery {
    pub lat: f64,
    pub lng: f64,
    /// Meters. Defaults to the courier visibility radius.
    pub radius: Option<f64>,
}

async fn generate_order(State(state): State<Arc<AppState>>) -> Result<Json<Order>, AppError> {
    Ok(Json(generate_recorded(&state).await?))
}

async fn orders_near(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let center = Point::new(query.lat, query.lng);
    if !center.is_finite() {
        return Err(AppError::BadRequest("lat and lng must be finite".to_string()));
    }

    let radius = query
        .radius
        .unwrap_or_else(|| state.facade.visibility_radius_m());
    if !(radius.is_finite() && radius >= 0.0) {
        return Err(AppError::BadRequest("radius must be >= 0".to_string()));
    }

    Ok(Json(state.orders().orders_near(center, radius).await?))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(state.orders().get_order(id).await?))
}
