use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{OrderList, PlaceOrderRequest, UpdateOrderStatusRequest},
    entity::{
        farmers::Entity as Farmers,
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_buyer},
    models::{Order, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

/// The two users allowed to act on an order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderParties {
    pub buyer_id: i64,
    pub seller_user_id: i64,
}

impl OrderParties {
    pub fn includes(&self, user_id: i64) -> bool {
        self.buyer_id == user_id || self.seller_user_id == user_id
    }
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_buyer(user)?;
    payload.validate()?;

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    // Listed quantity is informational; placing an order does not reserve stock.
    let now = Utc::now();
    let order = OrderActive {
        id: NotSet,
        product_id: Set(product.id),
        buyer_id: Set(user.user_id),
        quantity: Set(payload.quantity),
        status: Set(OrderStatus::Placed.as_str().to_string()),
        reference: Set(build_order_reference(Uuid::new_v4())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(order_id = order.id, product_id = product.id, "order placed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_place",
        "orders",
        serde_json::json!({ "order_id": order.id, "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }
    if let Some(product_id) = query.product_id {
        condition = condition.add(OrderCol::ProductId.eq(product_id));
    }
    if let Some(buyer_id) = query.buyer_id {
        condition = condition.add(OrderCol::BuyerId.eq(buyer_id));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder
            .order_by_asc(OrderCol::CreatedAt)
            .order_by_asc(OrderCol::Id),
        SortOrder::Desc => finder
            .order_by_desc(OrderCol::CreatedAt)
            .order_by_desc(OrderCol::Id),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(state: &AppState, id: i64) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "OK",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let next = payload.status;

    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    let current = parse_status(&order.status)?;
    let parties = order_parties(&state.orm, &order).await?;

    match next {
        OrderStatus::Cancelled if !parties.includes(user.user_id) => {
            return Err(AppError::Forbidden("not a party to this order".into()));
        }
        OrderStatus::Placed | OrderStatus::Confirmed | OrderStatus::Fulfilled
            if user.user_id != parties.seller_user_id =>
        {
            return Err(AppError::Forbidden(
                "only the selling farmer may advance an order".into(),
            ));
        }
        _ => {}
    }

    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "cannot move order from {current} to {next}"
        )));
    }

    // Only applies if nobody moved the order since it was read.
    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(next.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::Status.eq(current.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::Conflict("order status changed concurrently".into()));
    }

    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    tracing::info!(order_id = order.id, from = %current, to = %next, "order status changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "from": current.as_str(), "to": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

/// Resolves the buyer and the user behind the farmer selling the ordered product.
pub(crate) async fn order_parties<C: ConnectionTrait>(
    conn: &C,
    order: &OrderModel,
) -> AppResult<OrderParties> {
    let found = Products::find_by_id(order.product_id)
        .find_also_related(Farmers)
        .one(conn)
        .await?;
    let farmer = match found {
        Some((_, Some(farmer))) => farmer,
        _ => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "order {} references a product without a farmer",
                order.id
            )));
        }
    };

    Ok(OrderParties {
        buyer_id: order.buyer_id,
        seller_user_id: farmer.user_id,
    })
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        product_id: model.product_id,
        buyer_id: model.buyer_id,
        quantity: model.quantity,
        status: parse_status(&model.status)?,
        reference: model.reference,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn build_order_reference(id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = id.simple().to_string();
    format!("ORD-{}-{}", date, &suffix[..8])
}
