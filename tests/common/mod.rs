#![allow(dead_code)]

use farmdirect::{
    db::{create_orm_conn, create_schema},
    dto::{auth::RegisterRequest, farmers::CreateFarmerRequest, products::CreateProductRequest},
    middleware::auth::AuthUser,
    models::{Farmer, Product, Role},
    services::{auth_service, farmer_service, product_service},
    state::{AppState, AuthSettings},
};

pub const PASSWORD: &str = "correct horse";

pub async fn setup_state() -> anyhow::Result<AppState> {
    let orm = create_orm_conn("sqlite::memory:", 1).await?;
    create_schema(&orm).await?;
    Ok(AppState::new(
        orm,
        AuthSettings {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 1,
        },
    ))
}

pub async fn register(state: &AppState, username: &str, role: Role) -> anyhow::Result<AuthUser> {
    let user = auth_service::register_user(
        state,
        RegisterRequest {
            username: username.into(),
            password: PASSWORD.into(),
            role,
        },
    )
    .await?
    .data
    .expect("registered user");

    Ok(AuthUser {
        user_id: user.id,
        username: user.username,
        role: user.role,
    })
}

pub async fn farmer_with_profile(
    state: &AppState,
    username: &str,
    name: &str,
) -> anyhow::Result<(AuthUser, Farmer)> {
    let user = register(state, username, Role::Farmer).await?;
    let farmer = farmer_service::add_farmer(
        state,
        &user,
        CreateFarmerRequest {
            name: name.into(),
            phone: "555".into(),
            location: "X".into(),
            description: "Y".into(),
        },
    )
    .await?
    .data
    .expect("farmer profile");
    Ok((user, farmer))
}

pub async fn list_product(
    state: &AppState,
    farmer: &AuthUser,
    name: &str,
    quantity: f64,
    price: f64,
) -> anyhow::Result<Product> {
    let product = product_service::add_product(
        state,
        farmer,
        CreateProductRequest {
            name: name.into(),
            quantity,
            price,
        },
    )
    .await?
    .data
    .expect("product");
    Ok(product)
}
