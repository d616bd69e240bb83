use crate::error::AppError;

pub mod analytics;
pub mod auth;
pub mod farmers;
pub mod messages;
pub mod orders;
pub mod products;

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_positive(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::Validation(format!(
            "{field} must be a positive number"
        )));
    }
    Ok(())
}
