use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, SqlErr};
use sea_orm::ActiveValue::NotSet;
use sha2::{Digest, Sha256};

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, issue_token},
    models::{Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Outcome of checking a password against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    Valid,
    /// Matched an unsalted SHA-256 digest; the row should be re-hashed.
    ValidLegacy,
    Invalid,
}

/// Unsalted hex SHA-256 of the password, the format older rows were stored in.
pub fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn is_legacy_digest(stored: &str) -> bool {
    stored.len() == 64 && stored.bytes().all(|b| b.is_ascii_hexdigit())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, stored: &str) -> AppResult<PasswordCheck> {
    if stored.starts_with("$argon2") {
        let parsed_hash = PasswordHash::new(stored)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
        let check = match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => PasswordCheck::Valid,
            Err(_) => PasswordCheck::Invalid,
        };
        return Ok(check);
    }

    if is_legacy_digest(stored) {
        let check = if legacy_digest(password).eq_ignore_ascii_case(stored) {
            PasswordCheck::ValidLegacy
        } else {
            PasswordCheck::Invalid
        };
        return Ok(check);
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "Unrecognised password hash format"
    )))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let RegisterRequest {
        username,
        password,
        role,
    } = payload;
    let username = username.trim().to_string();

    let exist = Users::find()
        .filter(Column::Username.eq(username.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Username is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let user = ActiveModel {
        id: NotSet,
        username: Set(username),
        password_hash: Set(password_hash),
        role: Set(role.as_str().to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match err.sql_err() {
        // Lost a race with a concurrent registration of the same name.
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Username is already taken".to_string())
        }
        _ => AppError::from(err),
    })?;

    tracing::info!(user_id = user.id, role = %user.role, "user registered");
    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user)?,
        None,
    ))
}

/// Returns the user whose credentials match, or `None`.
///
/// A match against a legacy digest upgrades the stored hash to Argon2.
pub async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> AppResult<Option<User>> {
    let user = Users::find()
        .filter(Column::Username.eq(username.trim()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Ok(None),
    };

    match verify_password(password, &user.password_hash)? {
        PasswordCheck::Invalid => Ok(None),
        PasswordCheck::Valid => Ok(Some(user_from_entity(user)?)),
        PasswordCheck::ValidLegacy => {
            let mut active: ActiveModel = user.into();
            active.password_hash = Set(hash_password(password)?);
            let user = active.update(&state.orm).await?;
            tracing::info!(user_id = user.id, "upgraded legacy password hash");
            Ok(Some(user_from_entity(user)?))
        }
    }
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { username, password } = payload;

    let user = match authenticate(state, &username, &password).await? {
        Some(u) => u,
        None => {
            tracing::debug!(username = %username.trim(), "login rejected");
            return Err(AppError::Unauthorized("Invalid username or password".into()));
        }
    };

    let token = issue_token(&state.auth, &user)?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse { token, user },
        Some(Meta::empty()),
    ))
}

pub async fn current_user(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(auth.user_id).one(&state.orm).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Current user", user_from_entity(user)?, None))
}

fn user_from_entity(model: UserModel) -> AppResult<User> {
    let role = model
        .role
        .parse::<Role>()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(User {
        id: model.id,
        username: model.username,
        role,
        created_at: model.created_at,
    })
}
