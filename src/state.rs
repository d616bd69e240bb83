use crate::db::{DbPool, OrmConn};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub auth: AuthSettings,
}

/// Token signing parameters shared by the login service and the session extractor.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl AppState {
    /// Builds the state around an ORM connection; the raw sqlx pool is the one SeaORM already holds.
    pub fn new(orm: OrmConn, auth: AuthSettings) -> Self {
        let pool = orm.get_sqlite_connection_pool().clone();
        Self { pool, orm, auth }
    }
}
