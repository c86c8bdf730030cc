use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use super::{KeyValueStore, Result};
use crate::geo::{DistanceUnit, Point};
use crate::models::order::Order;

const ID_COUNTER_KEY: &str = "order:id";
const GEO_KEY: &str = "geoorder";
const TIMELINE_KEY: &str = "order";

fn payload_key(member: &str) -> String {
    format!("order:{member}")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Removed {
    payload: bool,
    spatial: bool,
    timeline: bool,
}

#[derive(Clone)]
pub struct OrderStorage {
    store: Arc<dyn KeyValueStore>,
}

impl OrderStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn generate_unique_id(&self) -> Result<i64> {
        self.store.incr(ID_COUNTER_KEY).await
    }

    /// Writes the payload (`order:{id}`, expiring), the `geoorder` member and
    /// the `order` timeline member. Rolls back on failure.
    pub async fn insert(&self, order: Order, max_age: Duration) -> Result<Order> {
        let id = self.generate_unique_id().await?;
        let order = Order { id, ..order };
        let member = id.to_string();

        if let Err(err) = self.write_entries(&order, &member, max_age).await {
            warn!(order_id = id, error = %err, "order insert failed, rolling back");
            self.remove_best_effort(&member, "rollback").await;
            return Err(err);
        }

        debug!(order_id = id, lat = order.location.lat, lng = order.location.lng, "order stored");
        Ok(order)
    }

    async fn write_entries(&self, order: &Order, member: &str, max_age: Duration) -> Result<()> {
        let payload = serde_json::to_string(order)?;
        self.store
            .set(&payload_key(member), payload, Some(max_age))
            .await?;
        self.store.geo_add(GEO_KEY, member, order.location).await?;
        self.store
            .zadd(TIMELINE_KEY, member, order.created_at_score())
            .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Order>> {
        match self.store.get(&payload_key(&id.to_string())).await? {
            None => Ok(None),
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
        }
    }

    /// Live orders within `radius` of `center`, nearest first.
    pub async fn radius_query(
        &self,
        center: Point,
        radius: f64,
        unit: DistanceUnit,
    ) -> Result<Vec<Order>> {
        let hits = self.store.geo_radius(GEO_KEY, center, radius, unit).await?;
        let mut orders = Vec::with_capacity(hits.len());

        for hit in hits {
            match self.store.get(&payload_key(&hit.member)).await? {
                Some(payload) => orders.push(serde_json::from_str(&payload)?),
                None => {
                    debug!(order_id = %hit.member, "payload expired ahead of its index entries");
                    self.remove_best_effort(&hit.member, "stale index entry").await;
                }
            }
        }

        Ok(orders)
    }

    /// Returns the number of spatial entries removed. Members that fail to
    /// delete are logged and skipped.
    pub async fn delete_by_radius(
        &self,
        center: Point,
        radius: f64,
        unit: DistanceUnit,
    ) -> Result<usize> {
        let hits = self.store.geo_radius(GEO_KEY, center, radius, unit).await?;
        let mut deleted = 0;

        for hit in hits {
            match self.remove_entries(&hit.member).await {
                Ok(removed) => {
                    if removed.spatial {
                        deleted += 1;
                    }
                    if !removed.payload {
                        debug!(order_id = %hit.member, "deleted order had no live payload");
                    }
                }
                Err(err) => {
                    warn!(order_id = %hit.member, error = %err, "failed to delete order in radius");
                }
            }
        }

        Ok(deleted)
    }

    pub async fn count(&self) -> Result<u64> {
        self.store.zcard(TIMELINE_KEY).await
    }

    /// Counts only timeline entries removed by this call.
    pub async fn remove_expired(&self, max_age: Duration) -> Result<usize> {
        let max_age_us = i64::try_from(max_age.as_micros()).unwrap_or(i64::MAX);
        let cutoff = Utc::now().timestamp_micros().saturating_sub(max_age_us);

        let expired = self
            .store
            .zrange_by_score(TIMELINE_KEY, f64::NEG_INFINITY, cutoff as f64)
            .await?;

        let mut swept = 0;
        for member in &expired {
            if self.remove_entries(member).await?.timeline {
                swept += 1;
            }
        }

        if swept > 0 {
            debug!(swept, "expired orders removed");
        }
        Ok(swept)
    }

    async fn remove_entries(&self, member: &str) -> Result<Removed> {
        let payload = self.store.del(&payload_key(member)).await;
        let spatial = self.store.geo_remove(GEO_KEY, member).await;
        let timeline = self.store.zrem(TIMELINE_KEY, member).await;

        Ok(Removed {
            payload: payload?,
            spatial: spatial?,
            timeline: timeline?,
        })
    }

    async fn remove_best_effort(&self, member: &str, reason: &'static str) {
        if let Err(err) = self.remove_entries(member).await {
            warn!(order_id = %member, reason, error = %err, "failed to remove order entries");
        }
    }
}
