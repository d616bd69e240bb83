use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};

use crate::{
    dto::{
        messages::{MessageList, PostMessageRequest},
        orders::{OrderList, PlaceOrderRequest, UpdateOrderStatusRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Message, Order},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{message_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/{id}", get(get_order))
        .route("/{id}/status", patch(update_order_status))
        .route("/{id}/messages", get(list_messages).post(post_message))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Place order", body = ApiResponse<Order>),
        (status = 403, description = "Caller is not a buyer"),
        (status = 404, description = "Product not found")
    ),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let resp = order_service::place_order(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "List orders", body = ApiResponse<OrderList>)
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Get order", body = ApiResponse<Order>),
        (status = 404, description = "Order not found")
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::get_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}/status",
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Order>),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Caller may not make this change")
    ),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/messages",
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = ApiResponse<Message>),
        (status = 403, description = "Caller is not a party to the order")
    ),
    tag = "Messages"
)]
pub async fn post_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<PostMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Message>>)> {
    let resp = message_service::post_message(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/messages",
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order conversation", body = ApiResponse<MessageList>),
        (status = 403, description = "Caller is not a party to the order")
    ),
    tag = "Messages"
)]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<MessageList>>> {
    let resp = message_service::list_messages(&state, &user, id).await?;
    Ok(Json(resp))
}
