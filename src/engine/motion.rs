use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AppError;
use crate::geo::{Point, ZoneComposer};
use crate::models::courier::{Courier, Direction};
use crate::storage::CourierStorage;

/// Zoom level at which one step is exactly [`BASE_STEP`] degrees.
pub const REFERENCE_ZOOM: i32 = 14;
const BASE_STEP: f64 = 0.001;

/// Step size in degrees for a map zoom level. Halves with every zoom level
/// above [`REFERENCE_ZOOM`] and doubles with every level below it.
pub fn step_accuracy(zoom: i32) -> f64 {
    (BASE_STEP / 2f64.powi(zoom.saturating_sub(REFERENCE_ZOOM))).abs()
}

pub fn step(location: Point, direction: Direction, zoom: i32) -> Point {
    let accuracy = step_accuracy(zoom);
    match direction {
        Direction::Up => Point::new(location.lat + accuracy, location.lng),
        Direction::Down => Point::new(location.lat - accuracy, location.lng),
        Direction::Left => Point::new(location.lat, location.lng - accuracy),
        Direction::Right => Point::new(location.lat, location.lng + accuracy),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Stepped,
    /// The step left the zone and the courier was placed at a random admissible point.
    Relocated,
}

impl MoveOutcome {
    pub fn as_label(&self) -> &'static str {
        match self {
            MoveOutcome::Stepped => "stepped",
            MoveOutcome::Relocated => "relocated",
        }
    }
}

/// Owner of the single simulated courier.
///
/// The courier lives in storage and every operation reads, modifies and
/// writes the whole record. Concurrent moves are not serialized: the last
/// write wins and an interleaved update can be lost.
#[derive(Clone)]
pub struct CourierService {
    storage: CourierStorage,
    zones: Arc<ZoneComposer>,
}

impl CourierService {
    pub fn new(storage: CourierStorage, zones: Arc<ZoneComposer>) -> Self {
        Self { storage, zones }
    }

    pub fn zones(&self) -> &ZoneComposer {
        &self.zones
    }

    /// Places a fresh courier with zero score at a random admissible point.
    pub async fn initialize(&self) -> Result<Courier, AppError> {
        let courier = Courier::new(self.zones.random_admissible_point()?);
        self.storage.save(&courier).await?;

        info!(
            lat = courier.location.lat,
            lng = courier.location.lng,
            "courier initialized"
        );
        Ok(courier)
    }

    /// Current courier, moved back into the zone first if its stored location
    /// is no longer admissible.
    pub async fn get_courier(&self) -> Result<Courier, AppError> {
        let mut courier = self
            .storage
            .get_one()
            .await?
            .ok_or_else(|| AppError::NotFound("courier not found".to_string()))?;

        if !self.zones.is_admissible(&courier.location) {
            debug!(
                lat = courier.location.lat,
                lng = courier.location.lng,
                "stored courier outside zone, relocating"
            );
            courier.location = self.zones.random_admissible_point()?;
            self.storage.save(&courier).await?;
        }

        Ok(courier)
    }

    pub async fn move_courier(
        &self,
        direction: Direction,
        zoom: i32,
    ) -> Result<(Courier, MoveOutcome), AppError> {
        let courier = self.get_courier().await?;
        self.advance(courier, direction, zoom).await
    }

    /// Applies one step to `courier` and persists the result.
    pub async fn advance(
        &self,
        mut courier: Courier,
        direction: Direction,
        zoom: i32,
    ) -> Result<(Courier, MoveOutcome), AppError> {
        let target = step(courier.location, direction, zoom);

        let outcome = if self.zones.is_admissible(&target) {
            courier.location = target;
            MoveOutcome::Stepped
        } else {
            courier.location = self.zones.random_admissible_point()?;
            MoveOutcome::Relocated
        };

        self.storage.save(&courier).await?;

        debug!(
            %direction,
            zoom,
            outcome = outcome.as_label(),
            lat = courier.location.lat,
            lng = courier.location.lng,
            "courier moved"
        );
        Ok((courier, outcome))
    }
}
