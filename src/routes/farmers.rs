use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::farmers::{CreateFarmerRequest, FarmerList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Farmer,
    response::ApiResponse,
    routes::params::Pagination,
    services::farmer_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_farmers).post(create_farmer))
        .route("/me", get(my_farmer))
        .route("/{id}", get(get_farmer))
}

#[utoipa::path(
    post,
    path = "/api/farmers",
    request_body = CreateFarmerRequest,
    responses(
        (status = 201, description = "Create farmer profile", body = ApiResponse<Farmer>),
        (status = 403, description = "Caller is not a farmer"),
        (status = 409, description = "Profile already exists")
    ),
    tag = "Farmers"
)]
pub async fn create_farmer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateFarmerRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Farmer>>)> {
    let resp = farmer_service::add_farmer(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/farmers",
    params(Pagination),
    responses(
        (status = 200, description = "List farmers", body = ApiResponse<FarmerList>)
    ),
    tag = "Farmers"
)]
pub async fn list_farmers(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<FarmerList>>> {
    let resp = farmer_service::list_farmers(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/farmers/me",
    responses(
        (status = 200, description = "Farmer profile of the caller", body = ApiResponse<Farmer>),
        (status = 404, description = "No profile yet")
    ),
    tag = "Farmers"
)]
pub async fn my_farmer(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Farmer>>> {
    let resp = farmer_service::get_farmer_by_user(&state, user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/farmers/{id}",
    params(
        ("id" = i64, Path, description = "Farmer ID")
    ),
    responses(
        (status = 200, description = "Get farmer", body = ApiResponse<Farmer>),
        (status = 404, description = "Farmer not found")
    ),
    tag = "Farmers"
)]
pub async fn get_farmer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Farmer>>> {
    let resp = farmer_service::get_farmer(&state, id).await?;
    Ok(Json(resp))
}
