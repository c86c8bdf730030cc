use tracing::{info, warn};

use crate::engine::motion::{CourierService, MoveOutcome};
use crate::engine::orders::OrderService;
use crate::error::AppError;
use crate::models::courier::Direction;
use crate::models::status::CourierStatus;

const PICKUP_RADIUS_PER_ZOOM_M: f64 = 5.0;
const PICKUP_MAX_ZOOM: i32 = 19;

/// Radius around the courier in which orders are collected, in meters.
pub fn pickup_radius_m(zoom: i32) -> f64 {
    (PICKUP_RADIUS_PER_ZOOM_M * f64::from(PICKUP_MAX_ZOOM.saturating_sub(zoom))).max(0.0)
}

/// Ties the courier to the orders around it.
#[derive(Clone)]
pub struct CourierFacade {
    couriers: CourierService,
    orders: OrderService,
    visibility_radius_m: f64,
}

impl CourierFacade {
    pub fn new(couriers: CourierService, orders: OrderService, visibility_radius_m: f64) -> Self {
        Self {
            couriers,
            orders,
            visibility_radius_m,
        }
    }

    pub fn couriers(&self) -> &CourierService {
        &self.couriers
    }

    pub fn orders(&self) -> &OrderService {
        &self.orders
    }

    pub fn visibility_radius_m(&self) -> f64 {
        self.visibility_radius_m
    }

    /// Collects the orders under the courier into its score, then takes one step.
    pub async fn move_courier(
        &self,
        direction: Direction,
        zoom: i32,
    ) -> Result<(CourierStatus, MoveOutcome), AppError> {
        let mut courier = self.couriers.get_courier().await?;

        let radius = pickup_radius_m(zoom);
        let collected = if radius > 0.0 {
            match self.orders.delete_near(courier.location, radius).await {
                Ok(count) => count,
                Err(err) => {
                    warn!(error = %err, "failed to collect orders around courier");
                    0
                }
            }
        } else {
            0
        };

        if collected > 0 {
            courier.score += collected as u64;
            info!(collected, score = courier.score, "orders collected");
        }

        let (courier, outcome) = self.couriers.advance(courier, direction, zoom).await?;
        let orders = self
            .orders
            .orders_near(courier.location, self.visibility_radius_m)
            .await?;

        Ok((CourierStatus { courier, orders }, outcome))
    }

    /// Courier plus the orders within the visibility radius.
    pub async fn status(&self) -> Result<CourierStatus, AppError> {
        let courier = self.couriers.get_courier().await?;
        let orders = self
            .orders
            .orders_near(courier.location, self.visibility_radius_m)
            .await?;

        Ok(CourierStatus { courier, orders })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;

    use super::{pickup_radius_m, CourierFacade};
    use crate::engine::motion::CourierService;
    use crate::engine::orders::OrderService;
    use crate::geo::{Point, Polygon, ZoneComposer};
    use crate::models::courier::{Courier, Direction};
    use crate::models::order::Order;
    use crate::storage::{CourierStorage, MemoryStore, OrderStorage};

    struct Fixture {
        facade: CourierFacade,
        couriers: CourierStorage,
        orders: OrderStorage,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let area = Polygon::allowed(vec![
            Point::new(59.8, 30.1),
            Point::new(59.8, 30.5),
            Point::new(60.0, 30.5),
            Point::new(60.0, 30.1),
        ])
        .unwrap();
        let zones = Arc::new(ZoneComposer::from_polygons(area, vec![]).unwrap());

        let couriers = CourierStorage::new(store.clone());
        let orders = OrderStorage::new(store);
        let facade = CourierFacade::new(
            CourierService::new(couriers.clone(), zones.clone()),
            OrderService::new(orders.clone(), zones, Duration::from_secs(120)),
            2_800.0,
        );

        Fixture {
            facade,
            couriers,
            orders,
        }
    }

    #[test]
    fn pickup_radius_shrinks_with_zoom() {
        assert_eq!(pickup_radius_m(13), 30.0);
        assert_eq!(pickup_radius_m(19), 0.0);
        assert_eq!(pickup_radius_m(25), 0.0);
    }

    #[tokio::test]
    async fn move_collects_orders_under_courier() {
        let fx = fixture();
        let start = Point::new(59.9, 30.3);
        fx.couriers.save(&Courier::new(start)).await.unwrap();

        let max_age = Duration::from_secs(120);
        fx.orders
            .insert(Order::new(1000.0, 100.0, Point::new(59.90001, 30.3), Utc::now()), max_age)
            .await
            .unwrap();
        fx.orders
            .insert(Order::new(1000.0, 100.0, Point::new(59.9, 30.30002), Utc::now()), max_age)
            .await
            .unwrap();
        let far = fx
            .orders
            .insert(Order::new(1000.0, 100.0, Point::new(59.91, 30.3), Utc::now()), max_age)
            .await
            .unwrap();

        let (status, _) = fx.facade.move_courier(Direction::Right, 13).await.unwrap();
        assert_eq!(status.courier.score, 2);
        assert_eq!(status.orders, vec![far]);
        assert_eq!(fx.orders.count().await.unwrap(), 1);
        assert_eq!(fx.couriers.get_one().await.unwrap(), Some(status.courier));
    }

    #[tokio::test]
    async fn status_lists_only_visible_orders() {
        let fx = fixture();
        fx.couriers.save(&Courier::new(Point::new(59.9, 30.3))).await.unwrap();

        let max_age = Duration::from_secs(120);
        let visible = fx
            .orders
            .insert(Order::new(1500.0, 120.0, Point::new(59.91, 30.3), Utc::now()), max_age)
            .await
            .unwrap();
        fx.orders
            .insert(Order::new(1500.0, 120.0, Point::new(59.99, 30.3), Utc::now()), max_age)
            .await
            .unwrap();

        let status = fx.facade.status().await.unwrap();
        assert_eq!(status.courier.location, Point::new(59.9, 30.3));
        assert_eq!(status.orders, vec![visible]);
    }
}
