use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::require_text;
use crate::{error::AppError, models::Message};

pub const MESSAGE_MAX_LEN: usize = 2000;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostMessageRequest {
    pub body: String,
}

impl PostMessageRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("body", &self.body)?;
        // Checked on the trimmed body, which is what gets stored.
        if self.body.trim().chars().count() > MESSAGE_MAX_LEN {
            return Err(AppError::Validation(format!(
                "body must be at most {MESSAGE_MAX_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageList {
    pub items: Vec<Message>,
}
