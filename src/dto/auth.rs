use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{Role, User},
};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let len = self.username.trim().chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
            return Err(AppError::Validation(format!(
                "username must be {USERNAME_MIN_LEN} to {USERNAME_MAX_LEN} characters"
            )));
        }
        if self.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AppError::Validation(format!(
                "password must be at least {PASSWORD_MIN_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub exp: usize,
}
