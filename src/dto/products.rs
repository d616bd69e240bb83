use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{require_positive, require_text};
use crate::{error::AppError, models::ProductListing};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("name", &self.name)?;
        require_positive("quantity", self.quantity)?;
        require_positive("price", self.price)
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<ProductListing>)]
    pub items: Vec<ProductListing>,
}
