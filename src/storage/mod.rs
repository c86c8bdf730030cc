pub mod courier;
pub mod memory;
pub mod order;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::geo::{DistanceUnit, Point};

pub use courier::CourierStorage;
pub use memory::MemoryStore;
pub use order::OrderStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("key {key} holds a value of the wrong type")]
    WrongType { key: String },

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq)]
pub struct GeoMember {
    pub member: String,
    pub point: Point,
    /// Distance from the search center, in the unit of the query.
    pub distance: f64,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    /// Returns `None` for absent or expired keys.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn del(&self, key: &str) -> Result<bool>;

    async fn incr(&self, key: &str) -> Result<i64>;

    async fn geo_add(&self, key: &str, member: &str, point: Point) -> Result<()>;

    /// Members within `radius` of `center`, nearest first.
    async fn geo_radius(
        &self,
        key: &str,
        center: Point,
        radius: f64,
        unit: DistanceUnit,
    ) -> Result<Vec<GeoMember>>;

    async fn geo_remove(&self, key: &str, member: &str) -> Result<bool>;

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()>;

    /// Members with `min <= score <= max`, lowest score first.
    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<String>>;

    async fn zrem(&self, key: &str, member: &str) -> Result<bool>;

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64>;

    async fn zcard(&self, key: &str) -> Result<u64>;
}
