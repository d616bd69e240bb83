use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use sea_orm::ActiveValue::NotSet;

use crate::{
    audit,
    dto::farmers::{CreateFarmerRequest, FarmerList},
    entity::farmers::{ActiveModel, Column, Entity as Farmers, Model as FarmerModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_farmer},
    models::Farmer,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn add_farmer(
    state: &AppState,
    user: &AuthUser,
    payload: CreateFarmerRequest,
) -> AppResult<ApiResponse<Farmer>> {
    ensure_farmer(user)?;
    payload.validate()?;

    if find_by_user(&state.orm, user.user_id).await?.is_some() {
        return Err(AppError::Conflict("Farmer profile already exists".into()));
    }

    let farmer = ActiveModel {
        id: NotSet,
        user_id: Set(user.user_id),
        name: Set(payload.name.trim().to_string()),
        phone: Set(payload.phone.trim().to_string()),
        location: Set(payload.location.trim().to_string()),
        description: Set(payload.description),
        created_at: Set(Utc::now()),
    }
    .insert(&state.orm)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Farmer profile already exists".into())
        }
        _ => AppError::from(err),
    })?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "farmer_create",
        "farmers",
        serde_json::json!({ "farmer_id": farmer.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Farmer registered",
        farmer_from_entity(farmer),
        Some(Meta::empty()),
    ))
}

pub async fn get_farmer_by_user(state: &AppState, user_id: i64) -> AppResult<ApiResponse<Farmer>> {
    let farmer = match find_by_user(&state.orm, user_id).await? {
        Some(f) => f,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Farmer", farmer_from_entity(farmer), None))
}

pub async fn get_farmer(state: &AppState, id: i64) -> AppResult<ApiResponse<Farmer>> {
    let farmer = Farmers::find_by_id(id).one(&state.orm).await?;
    let farmer = match farmer {
        Some(f) => f,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Farmer", farmer_from_entity(farmer), None))
}

pub async fn list_farmers(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<FarmerList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Farmers::find().order_by_asc(Column::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(farmer_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Farmers",
        FarmerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Farmer profile owned by `user_id`, if any.
pub(crate) async fn find_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> AppResult<Option<FarmerModel>> {
    let farmer = Farmers::find()
        .filter(Column::UserId.eq(user_id))
        .one(conn)
        .await?;
    Ok(farmer)
}

fn farmer_from_entity(model: FarmerModel) -> Farmer {
    Farmer {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        phone: model.phone,
        location: model.location,
        description: model.description,
        created_at: model.created_at,
    }
}
