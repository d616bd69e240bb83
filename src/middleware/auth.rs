use axum::{extract::FromRequestParts, http::header};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    dto::auth::Claims,
    error::AppError,
    models::{Role, User},
    state::{AppState, AuthSettings},
};

/// Session context of the caller, decoded from the bearer token on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden(format!("requires the {role} role")));
    }
    Ok(())
}

pub fn ensure_farmer(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Farmer)
}

pub fn ensure_buyer(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Buyer)
}

/// Signs a token for `user`, returned in `Bearer <jwt>` form.
pub fn issue_token(settings: &AuthSettings, user: &User) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(settings.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        role: user.role.as_str().to_string(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(format!("Bearer {}", token))
}

pub fn decode_token(settings: &AuthSettings, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = decoded
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;
    let role = decoded
        .claims
        .role
        .parse::<Role>()
        .map_err(|_| AppError::Unauthorized("Invalid role in token".into()))?;

    Ok(AuthUser {
        user_id,
        username: decoded.claims.username,
        role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        let Some(token) = auth_str.strip_prefix("Bearer ") else {
            return Err(AppError::BadRequest("Invalid Authorization scheme".into()));
        };

        let user = decode_token(&state.auth, token.trim())?;
        tracing::debug!(user_id = user.user_id, role = %user.role, "session resolved");
        Ok(user)
    }
}
