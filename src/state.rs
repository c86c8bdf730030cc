use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::facade::CourierFacade;
use crate::engine::motion::{CourierService, MoveOutcome};
use crate::engine::orders::OrderService;
use crate::error::AppError;
use crate::geo::ZoneComposer;
use crate::geo::zones::default_zones;
use crate::models::courier::Direction;
use crate::models::status::CourierStatus;
use crate::observability::metrics::Metrics;
use crate::storage::{CourierStorage, KeyValueStore, OrderStorage};

pub struct AppState {
    pub facade: CourierFacade,
    pub status_tx: broadcast::Sender<CourierStatus>,
    pub metrics: Metrics,
}

impl AppState {
    /// Builds the state over the built-in zones and places the courier.
    pub async fn new(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<Self, AppError> {
        let zones = default_zones(config.sampling)?;
        Self::with_zones(config, store, zones).await
    }

    /// Builds the state over `zones` and places the courier. Fails when no
    /// admissible point can be found or the courier cannot be stored.
    pub async fn with_zones(
        config: &Config,
        store: Arc<dyn KeyValueStore>,
        zones: ZoneComposer,
    ) -> Result<Self, AppError> {
        let zones = Arc::new(zones);
        let couriers = CourierService::new(CourierStorage::new(store.clone()), zones.clone());
        let orders = OrderService::new(OrderStorage::new(store), zones.clone(), config.order_max_age);

        couriers.initialize().await?;
        info!(
            disallowed_zones = zones.disallowed_count(),
            max_age_secs = config.order_max_age.as_secs(),
            "courier and order services ready"
        );

        let (status_tx, _unused_rx) = broadcast::channel(config.status_buffer_size);

        Ok(Self {
            facade: CourierFacade::new(couriers, orders, config.courier_visibility_radius_m),
            status_tx,
            metrics: Metrics::new(),
        })
    }

    pub fn orders(&self) -> &OrderService {
        self.facade.orders()
    }

    /// Moves the courier, records the outcome and pushes the new status to subscribers.
    pub async fn move_courier(
        &self,
        direction: Direction,
        zoom: i32,
    ) -> Result<CourierStatus, AppError> {
        match self.facade.move_courier(direction, zoom).await {
            Ok((status, outcome)) => {
                self.record_move(outcome);
                self.metrics.courier_score.set(status.courier.score as i64);
                let _ = self.status_tx.send(status.clone());
                Ok(status)
            }
            Err(err) => {
                self.metrics
                    .courier_moves_total
                    .with_label_values(&["error"])
                    .inc();
                warn!(error = %err, %direction, zoom, "courier move failed");
                Err(err)
            }
        }
    }

    fn record_move(&self, outcome: MoveOutcome) {
        self.metrics
            .courier_moves_total
            .with_label_values(&[outcome.as_label()])
            .inc();
    }
}
