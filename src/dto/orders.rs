use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::require_positive;
use crate::{
    error::AppError,
    models::{Order, OrderStatus},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub product_id: i64,
    pub quantity: f64,
}

impl PlaceOrderRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_positive("quantity", self.quantity)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
