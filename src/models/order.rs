use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Point;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub price: f64,
    pub delivery_price: f64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub location: Point,
}

impl Order {
    /// Unsaved order; the index assigns the id on insert.
    pub fn new(price: f64, delivery_price: f64, location: Point, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            price,
            delivery_price,
            created_at,
            location,
        }
    }

    /// Sort score of the time-ordered index: microseconds since the Unix epoch.
    pub fn created_at_score(&self) -> f64 {
        self.created_at.timestamp_micros() as f64
    }
}
