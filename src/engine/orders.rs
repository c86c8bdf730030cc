use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::debug;

use crate::error::AppError;
use crate::geo::{DistanceUnit, Point, ZoneComposer};
use crate::models::order::Order;
use crate::storage::OrderStorage;

const DELIVERY_PRICE: Range<f64> = 100.0..500.0;
const ORDER_PRICE: Range<f64> = 1_000.0..3_000.0;

#[derive(Clone)]
pub struct OrderService {
    storage: OrderStorage,
    zones: Arc<ZoneComposer>,
    max_age: Duration,
}

impl OrderService {
    pub fn new(storage: OrderStorage, zones: Arc<ZoneComposer>, max_age: Duration) -> Self {
        Self {
            storage,
            zones,
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Creates an order with random prices at a random admissible point.
    pub async fn generate_order(&self) -> Result<Order, AppError> {
        let (price, delivery_price) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(ORDER_PRICE), rng.gen_range(DELIVERY_PRICE))
        };
        let location = self.zones.random_admissible_point()?;

        let order = self
            .storage
            .insert(Order::new(price, delivery_price, location, Utc::now()), self.max_age)
            .await?;

        debug!(order_id = order.id, price, delivery_price, "order generated");
        Ok(order)
    }

    pub async fn get_order(&self, id: i64) -> Result<Order, AppError> {
        self.storage
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
    }

    pub async fn orders_near(&self, center: Point, radius_m: f64) -> Result<Vec<Order>, AppError> {
        Ok(self
            .storage
            .radius_query(center, radius_m, DistanceUnit::M)
            .await?)
    }

    pub async fn delete_near(&self, center: Point, radius_m: f64) -> Result<usize, AppError> {
        Ok(self
            .storage
            .delete_by_radius(center, radius_m, DistanceUnit::M)
            .await?)
    }

    pub async fn count(&self) -> Result<u64, AppError> {
        Ok(self.storage.count().await?)
    }

    pub async fn remove_expired(&self) -> Result<usize, AppError> {
        Ok(self.storage.remove_expired(self.max_age).await?)
    }
}
