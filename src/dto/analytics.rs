use serde::Serialize;
use utoipa::ToSchema;

use crate::models::ProductSales;

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReport {
    pub items: Vec<ProductSales>,
}
