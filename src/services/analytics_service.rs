use crate::{
    dto::analytics::SalesReport,
    error::AppResult,
    models::ProductSales,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Total ordered quantity per product name.
pub async fn sales_by_product(state: &AppState) -> AppResult<ApiResponse<SalesReport>> {
    let items = sqlx::query_as::<_, ProductSales>(
        r#"
        SELECT p.name AS product_name, CAST(SUM(o.quantity) AS REAL) AS total_quantity
        FROM orders o
        JOIN products p ON p.id = o.product_id
        GROUP BY p.name
        ORDER BY p.name
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Sales by product", SalesReport { items }, Some(meta)))
}
