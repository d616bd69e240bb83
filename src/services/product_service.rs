use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LikeExpr;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList},
    entity::{
        farmers::Column as FarmerCol,
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel, Relation},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_farmer},
    models::{Product, ProductListing},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::farmer_service,
    state::AppState,
};

pub async fn add_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_farmer(user)?;
    payload.validate()?;

    let farmer = match farmer_service::find_by_user(&state.orm, user.user_id).await? {
        Some(f) => f,
        None => {
            return Err(AppError::BadRequest(
                "Create a farmer profile before listing produce".into(),
            ));
        }
    };

    let product = ActiveModel {
        id: NotSet,
        farmer_id: Set(farmer.id),
        name: Set(payload.name.trim().to_string()),
        quantity: Set(payload.quantity),
        price: Set(payload.price),
        created_at: Set(Utc::now()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = product.id, farmer_id = farmer.id, "product listed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "farmer_id": farmer.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product listed",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(Column::Name.like(name_pattern(search)));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if let Some(farmer_id) = query.farmer_id {
        condition = condition.add(Column::FarmerId.eq(farmer_id));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Quantity => Column::Quantity,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = listing_query().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col).order_by_asc(Column::Id),
        SortOrder::Desc => finder.order_by_desc(sort_col).order_by_desc(Column::Id),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .into_model::<ProductListing>()
        .all(&state.orm)
        .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: i64) -> AppResult<ApiResponse<ProductListing>> {
    let result = listing_query()
        .filter(Column::Id.eq(id))
        .into_model::<ProductListing>()
        .one(&state.orm)
        .await?;
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", result, None))
}

/// Products joined with the owning farmer's name.
fn listing_query() -> Select<Products> {
    Products::find()
        .join(JoinType::InnerJoin, Relation::Farmers.def())
        .column_as(FarmerCol::Name, "farmer_name")
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        farmer_id: model.farmer_id,
        name: model.name,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at,
    }
}

/// Substring `LIKE` pattern that takes the caller's `%` and `_` literally.
fn name_pattern(search: &str) -> LikeExpr {
    const ESCAPE: char = '!';
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '%' | '_' | ESCAPE) {
            escaped.push(ESCAPE);
        }
        escaped.push(c);
    }
    LikeExpr::new(format!("%{escaped}%")).escape(ESCAPE)
}
