use std::sync::Arc;

use super::{KeyValueStore, Result};
use crate::models::courier::Courier;

const COURIER_KEY: &str = "courier";

/// The single courier record, stored without expiry.
#[derive(Clone)]
pub struct CourierStorage {
    store: Arc<dyn KeyValueStore>,
}

impl CourierStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn save(&self, courier: &Courier) -> Result<()> {
        let payload = serde_json::to_string(courier)?;
        self.store.set(COURIER_KEY, payload, None).await
    }

    pub async fn get_one(&self) -> Result<Option<Courier>> {
        match self.store.get(COURIER_KEY).await? {
            None => Ok(None),
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
        }
    }
}
