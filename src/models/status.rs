use serde::{Deserialize, Serialize};

use crate::models::courier::Courier;
use crate::models::order::Order;

/// Courier position together with the orders it can currently see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierStatus {
    pub courier: Courier,
    pub orders: Vec<Order>,
}
