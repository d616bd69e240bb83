use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use crate::{
    config::AppConfig,
    state::{AppState, AuthSettings},
};

pub type DbPool = sqlx::SqlitePool;
pub type OrmConn = DatabaseConnection;

const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Create a SeaORM connection.
///
/// In-memory databases are private to a single SQLite connection, so the pool
/// is pinned to one connection for them.
pub async fn create_orm_conn(database_url: &str, max_connections: u32) -> Result<DatabaseConnection> {
    let in_memory = database_url.contains(":memory:");
    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.max_connections(if in_memory { 1 } else { max_connections.max(1) })
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let conn = Database::connect(opt).await?;
    Ok(conn)
}

/// Creates every table and index that does not exist yet. Safe to run at each start.
pub async fn create_schema(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    // Prepared statements cannot contain multiple commands,
    // so split the schema and run each statement individually.
    for stmt in SCHEMA.split(';') {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            continue;
        }
        let statement = format!("{stmt};");
        conn.execute(Statement::from_string(backend, statement))
            .await?;
    }
    tracing::debug!("schema ensured");

    Ok(())
}

/// Connects, ensures the schema and assembles the shared application state.
pub async fn init_state(config: &AppConfig) -> Result<AppState> {
    let orm = create_orm_conn(&config.database_url, config.max_connections).await?;
    create_schema(&orm).await?;
    tracing::info!(url = %config.database_url, "database ready");

    Ok(AppState::new(
        orm,
        AuthSettings {
            jwt_secret: config.jwt_secret.clone(),
            token_ttl_hours: config.token_ttl_hours,
        },
    ))
}
