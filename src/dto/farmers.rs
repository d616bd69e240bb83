use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::require_text;
use crate::{error::AppError, models::Farmer};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFarmerRequest {
    pub name: String,
    pub phone: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
}

impl CreateFarmerRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("name", &self.name)?;
        require_text("phone", &self.phone)?;
        require_text("location", &self.location)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FarmerList {
    #[schema(value_type = Vec<Farmer>)]
    pub items: Vec<Farmer>,
}
