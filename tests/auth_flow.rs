mod common;

use chrono::Utc;
use farmdirect::{
    dto::auth::{LoginRequest, RegisterRequest},
    entity::users::{Column as UserCol, Entity as Users},
    error::AppError,
    middleware::auth::{decode_token, issue_token},
    models::{Role, User},
    services::auth_service::{
        PasswordCheck, authenticate, hash_password, legacy_digest, login_user, register_user,
        verify_password,
    },
    state::AuthSettings,
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn register_then_login_returns_the_same_user() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let registered = common::register(&state, "alice", Role::Buyer).await?;

    let user = authenticate(&state, "alice", common::PASSWORD)
        .await?
        .expect("credentials should match");
    assert_eq!(user.id, registered.user_id);
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, Role::Buyer);

    let login = login_user(
        &state,
        LoginRequest {
            username: "alice".into(),
            password: common::PASSWORD.into(),
        },
    )
    .await?
    .data
    .expect("login data");
    let token = login.token.strip_prefix("Bearer ").expect("bearer prefix");
    let session = decode_token(&state.auth, token)?;
    assert_eq!(session.user_id, registered.user_id);
    assert_eq!(session.role, Role::Buyer);
    Ok(())
}

#[tokio::test]
async fn wrong_password_or_unknown_user_returns_none() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    common::register(&state, "alice", Role::Farmer).await?;

    assert!(authenticate(&state, "alice", "not the password").await?.is_none());
    assert!(authenticate(&state, "bob", common::PASSWORD).await?.is_none());

    let err = login_user(
        &state,
        LoginRequest {
            username: "alice".into(),
            password: "not the password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_rejected_and_keeps_one_row() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    common::register(&state, "alice", Role::Buyer).await?;

    let err = register_user(
        &state,
        RegisterRequest {
            username: "alice".into(),
            password: "another password".into(),
            role: Role::Farmer,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let rows = Users::find()
        .filter(UserCol::Username.eq("alice"))
        .count(&state.orm)
        .await?;
    assert_eq!(rows, 1);
    Ok(())
}

#[tokio::test]
async fn registration_input_is_validated() -> anyhow::Result<()> {
    let state = common::setup_state().await?;

    let short_name = register_user(
        &state,
        RegisterRequest {
            username: "  a ".into(),
            password: common::PASSWORD.into(),
            role: Role::Buyer,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(short_name, AppError::Validation(_)));

    let short_password = register_user(
        &state,
        RegisterRequest {
            username: "alice".into(),
            password: "abc".into(),
            role: Role::Buyer,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(short_password, AppError::Validation(_)));

    assert_eq!(Users::find().count(&state.orm).await?, 0);
    Ok(())
}

#[test]
fn legacy_digest_is_deterministic_and_input_sensitive() {
    assert_eq!(legacy_digest("abc"), legacy_digest("abc"));
    assert_ne!(legacy_digest("abc"), legacy_digest("abd"));
    assert_eq!(
        legacy_digest("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn password_hashes_are_salted_and_verify() -> anyhow::Result<()> {
    let first = hash_password("abc12345")?;
    let second = hash_password("abc12345")?;
    assert_ne!(first, second);
    assert!(first.starts_with("$argon2"));

    assert_eq!(verify_password("abc12345", &first)?, PasswordCheck::Valid);
    assert_eq!(verify_password("abc12345", &second)?, PasswordCheck::Valid);
    assert_eq!(verify_password("abd12345", &first)?, PasswordCheck::Invalid);
    assert_eq!(
        verify_password("abc", &legacy_digest("abc"))?,
        PasswordCheck::ValidLegacy
    );
    assert!(verify_password("abc", "plaintext").is_err());
    Ok(())
}

#[tokio::test]
async fn legacy_digest_row_is_upgraded_on_login() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    sqlx::query(
        "INSERT INTO users (username, password_hash, role, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind("oldtimer")
    .bind(legacy_digest("hunter22"))
    .bind("farmer")
    .bind(Utc::now())
    .execute(&state.pool)
    .await?;

    assert!(authenticate(&state, "oldtimer", "hunter23").await?.is_none());
    let user = authenticate(&state, "oldtimer", "hunter22")
        .await?
        .expect("legacy credentials should match");
    assert_eq!(user.role, Role::Farmer);

    let stored = Users::find_by_id(user.id)
        .one(&state.orm)
        .await?
        .expect("user row");
    assert!(stored.password_hash.starts_with("$argon2"));
    assert_eq!(
        verify_password("hunter22", &stored.password_hash)?,
        PasswordCheck::Valid
    );
    Ok(())
}

#[test]
fn expired_token_is_rejected() -> anyhow::Result<()> {
    let user = User {
        id: 7,
        username: "alice".into(),
        role: Role::Buyer,
        created_at: Utc::now(),
    };
    let fresh = AuthSettings {
        jwt_secret: "test-secret".into(),
        token_ttl_hours: 1,
    };
    let expired = AuthSettings {
        token_ttl_hours: -1,
        ..fresh.clone()
    };

    let token = issue_token(&fresh, &user)?;
    let session = decode_token(&fresh, token.trim_start_matches("Bearer "))?;
    assert_eq!(session.user_id, 7);

    let token = issue_token(&expired, &user)?;
    let err = decode_token(&fresh, token.trim_start_matches("Bearer ")).unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let other_secret = AuthSettings {
        jwt_secret: "another-secret".into(),
        ..fresh
    };
    let token = issue_token(&other_secret, &user)?;
    let err = decode_token(&expired, token.trim_start_matches("Bearer ")).unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    Ok(())
}
