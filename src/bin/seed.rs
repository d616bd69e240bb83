use chrono::Utc;
use farmdirect::{
    config::AppConfig,
    db::{DbPool, init_state},
    models::Role,
    services::auth_service::hash_password,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let state = init_state(&config).await?;
    let pool = &state.pool;

    let farmer_user = ensure_user(pool, "greenacres", "harvest123", Role::Farmer).await?;
    let buyer_id = ensure_user(pool, "citymarket", "market123", Role::Buyer).await?;
    let farmer_id = ensure_farmer(pool, farmer_user).await?;
    seed_products(pool, farmer_id).await?;

    println!("Seed completed. Farmer ID: {farmer_id}, Buyer user ID: {buyer_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    username: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<i64> {
    let password_hash = hash_password(password)?;

    sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, role, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let (user_id,): (i64,) = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await?;

    println!("Ensured user {username} (role={role})");
    Ok(user_id)
}

async fn ensure_farmer(pool: &DbPool, user_id: i64) -> anyhow::Result<i64> {
    sqlx::query(
        r#"
        INSERT INTO farmers (user_id, name, phone, location, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind("Green Acres")
    .bind("555-0100")
    .bind("Willow Creek")
    .bind("Family farm growing seasonal vegetables and grain")
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let (farmer_id,): (i64,) = sqlx::query_as("SELECT id FROM farmers WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(farmer_id)
}

async fn seed_products(pool: &DbPool, farmer_id: i64) -> anyhow::Result<()> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE farmer_id = ?")
        .bind(farmer_id)
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        println!("Products already seeded");
        return Ok(());
    }

    let products = vec![
        ("Sweet Corn", 120.0, 2.5),
        ("Heirloom Tomatoes", 45.0, 4.75),
        ("Russet Potatoes", 300.0, 1.2),
        ("Winter Wheat", 1000.0, 0.45),
    ];

    for (name, quantity, price) in products {
        sqlx::query(
            r#"
            INSERT INTO products (farmer_id, name, quantity, price, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(farmer_id)
        .bind(name)
        .bind(quantity)
        .bind(price)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
