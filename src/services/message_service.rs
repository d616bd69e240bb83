use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sea_orm::ActiveValue::NotSet;

use crate::{
    dto::messages::{MessageList, PostMessageRequest},
    entity::{
        messages::{ActiveModel, Column, Entity as Messages, Model as MessageModel},
        orders::Entity as Orders,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Message,
    response::{ApiResponse, Meta},
    services::order_service::{OrderParties, order_parties},
    state::AppState,
};

pub async fn post_message(
    state: &AppState,
    user: &AuthUser,
    order_id: i64,
    payload: PostMessageRequest,
) -> AppResult<ApiResponse<Message>> {
    payload.validate()?;
    ensure_party(state, user, order_id).await?;

    let message = ActiveModel {
        id: NotSet,
        order_id: Set(order_id),
        sender_id: Set(user.user_id),
        body: Set(payload.body.trim().to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(&state.orm)
    .await?;

    tracing::debug!(order_id, message_id = message.id, "message posted");

    Ok(ApiResponse::success(
        "Message sent",
        message_from_entity(message),
        Some(Meta::empty()),
    ))
}

pub async fn list_messages(
    state: &AppState,
    user: &AuthUser,
    order_id: i64,
) -> AppResult<ApiResponse<MessageList>> {
    ensure_party(state, user, order_id).await?;

    let items: Vec<Message> = Messages::find()
        .filter(Column::OrderId.eq(order_id))
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(message_from_entity)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Messages", MessageList { items }, Some(meta)))
}

async fn ensure_party(state: &AppState, user: &AuthUser, order_id: i64) -> AppResult<OrderParties> {
    let order = Orders::find_by_id(order_id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let parties = order_parties(&state.orm, &order).await?;
    if !parties.includes(user.user_id) {
        return Err(AppError::Forbidden("not a party to this order".into()));
    }
    Ok(parties)
}

fn message_from_entity(model: MessageModel) -> Message {
    Message {
        id: model.id,
        order_id: model.order_id,
        sender_id: model.sender_id,
        body: model.body,
        created_at: model.created_at,
    }
}
