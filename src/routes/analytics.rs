use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::analytics::SalesReport,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::analytics_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/sales", get(sales_by_product))
}

#[utoipa::path(
    get,
    path = "/api/analytics/sales",
    responses(
        (status = 200, description = "Ordered quantity per product", body = ApiResponse<SalesReport>)
    ),
    tag = "Analytics"
)]
pub async fn sales_by_product(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<SalesReport>>> {
    let resp = analytics_service::sales_by_product(&state).await?;
    Ok(Json(resp))
}
